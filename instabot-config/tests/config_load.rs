use instabot_config::{InstabotConfigLoader, LlmSettings};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "0.1"
extraction:
  navigation_timeout_secs: 45
  idle_window_ms: 750
browser:
  webdriver_url: "http://chromedriver:9515"
  headless: true
  args: ["--lang=en-US"]
wordpress:
  base_url: "https://blog.example.com"
  auth_token: "${WP_TOKEN}"
llm:
  provider: openai
  model: "gpt-4o-mini"
  auth_token: "${OPENAI_API_KEY}"
  temperature: 0.7
  brand_tone: "playful"
logging:
  format: json
"#;

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "instabot.yaml", FILE_YAML);

    temp_env::with_vars(
        [("WP_TOKEN", Some("wp-secret")), ("OPENAI_API_KEY", Some("sk-test"))],
        || {
            let config = InstabotConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load system config");

            assert_eq!(config.extraction.navigation_timeout_secs, 45);
            assert_eq!(config.extraction.idle_window_ms, 750);
            // untouched keys keep their defaults
            assert_eq!(config.extraction.idle_poll_ms, 100);
            assert_eq!(config.extraction.char_threshold, 250);
            assert_eq!(config.browser.webdriver_url, "http://chromedriver:9515");
            assert_eq!(config.browser.args, vec!["--lang=en-US".to_string()]);

            let wp = config.wordpress.expect("wordpress section");
            assert_eq!(wp.auth_token, "wp-secret");

            match config.llm.expect("llm section") {
                LlmSettings::Openai {
                    model,
                    auth_token,
                    endpoint,
                    brand_tone,
                    ..
                } => {
                    assert_eq!(model, "gpt-4o-mini");
                    assert_eq!(auth_token, "sk-test");
                    assert_eq!(endpoint, "https://api.openai.com/v1");
                    assert_eq!(brand_tone.as_deref(), Some("playful"));
                }
            }
            assert_eq!(config.logging.format, "json");
        },
    );
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "instabot.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("INSTABOT__EXTRACTION__CHAR_THRESHOLD", Some("400")),
            ("INSTABOT__BROWSER__HEADLESS", Some("false")),
        ],
        || {
            let config = InstabotConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overrides");

            assert_eq!(config.extraction.char_threshold, 400);
            assert!(!config.browser.headless);
            assert_eq!(config.extraction.navigation_timeout_secs, 45);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = InstabotConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert!(config.version.is_none());
    assert!(config.browser.headless);
    assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    assert!(config.llm.is_none());
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = InstabotConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
