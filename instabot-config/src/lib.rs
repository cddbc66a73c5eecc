//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, with `INSTABOT__`-prefixed
//! environment variables applied last (`INSTABOT__EXTRACTION__CHAR_THRESHOLD=400`
//! overrides `extraction.char_threshold`). String values may reference other
//! environment variables as `${VAR}`; those are expanded after merging.
//!
//! Every section has defaults, so an empty document is a valid configuration:
//! the extractor runs against a local chromedriver and the WordPress/LLM
//! integrations stay disabled until their sections are present.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct InstabotConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub wordpress: Option<WordPressSettings>,
    #[serde(default)]
    pub llm: Option<LlmSettings>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Knobs for the article extraction pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub navigation_timeout_secs: u64,
    /// Quiescence window for the network-idle wait.
    pub idle_window_ms: u64,
    pub idle_poll_ms: u64,
    /// Minimum characters of main content before a page counts as an article.
    pub char_threshold: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            idle_window_ms: 500,
            idle_poll_ms: 100,
            char_threshold: 250,
        }
    }
}

impl ExtractionSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    /// Extra Chrome command-line switches.
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            user_agent: None,
            window_width: 1366,
            window_height: 900,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPressSettings {
    pub base_url: String,
    pub auth_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmSettings {
    Openai {
        #[serde(default = "default_openai_model")]
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
        #[serde(default = "default_candidates")]
        candidates: u32,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        brand_tone: Option<String>,
    },
}

impl LlmSettings {
    pub fn max_tokens(&self) -> u32 {
        match self {
            LlmSettings::Openai { max_tokens, .. } => *max_tokens,
        }
    }

    pub fn candidates(&self) -> u32 {
        match self {
            LlmSettings::Openai { candidates, .. } => *candidates,
        }
    }

    pub fn temperature(&self) -> Option<f32> {
        match self {
            LlmSettings::Openai { temperature, .. } => *temperature,
        }
    }

    pub fn brand_tone(&self) -> Option<&str> {
        match self {
            LlmSettings::Openai { brand_tone, .. } => brand_tone.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `text` or `json`.
    pub format: String,
    pub filter: String,
    pub stderr: bool,
    pub dir: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: "text".into(),
            filter: "info".into(),
            stderr: true,
            dir: None,
        }
    }
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_openai_model() -> String {
    "gpt-4".into()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_candidates() -> u32 {
    3
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (files + env overrides).
pub struct InstabotConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for InstabotConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl InstabotConfigLoader {
    /// Start from defaults with no file sources.
    ///
    /// ```
    /// use instabot_config::InstabotConfigLoader;
    ///
    /// let config = InstabotConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.extraction.navigation_timeout_secs, 30);
    /// assert!(config.wordpress.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can run purely on
    /// environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use instabot_config::{InstabotConfigLoader, LlmSettings};
    ///
    /// let cfg = InstabotConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// llm:
    ///   provider: "openai"
    ///   auth_token: "sk-example"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// match cfg.llm {
    ///     Some(LlmSettings::Openai { model, max_tokens, candidates, .. }) => {
    ///         assert_eq!(model, "gpt-4");
    ///         assert_eq!(max_tokens, 150);
    ///         assert_eq!(candidates, 3);
    ///     }
    ///     None => panic!("expected llm section"),
    /// }
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge the sources, apply `INSTABOT__` env overrides, expand `${VAR}`
    /// placeholders and materialise the typed config.
    pub fn load(self) -> Result<InstabotConfig, SettingsError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("INSTABOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: InstabotConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}

impl InstabotConfig {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.extraction.navigation_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "extraction.navigation_timeout_secs must be positive".into(),
            ));
        }
        if self.extraction.idle_poll_ms == 0 {
            return Err(SettingsError::Invalid(
                "extraction.idle_poll_ms must be positive".into(),
            ));
        }
        if let Some(LlmSettings::Openai { candidates: 0, .. }) = &self.llm {
            return Err(SettingsError::Invalid(
                "llm.candidates must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_nested_objects() {
        temp_env::with_vars(
            [("WP_HOST", Some("blog.example.com")), ("WP_TOKEN", Some("t0k"))],
            || {
                let mut v = json!({
                    "wordpress": { "base_url": "https://${WP_HOST}", "auth_token": "$WP_TOKEN" },
                    "browser": { "args": ["--lang=${WP_HOST}"], "headless": true }
                });
                expand_env_in_value(&mut v);
                assert_eq!(v["wordpress"]["base_url"], json!("https://blog.example.com"));
                assert_eq!(v["wordpress"]["auth_token"], json!("t0k"));
                assert_eq!(v["browser"]["args"][0], json!("--lang=blog.example.com"));
                assert_eq!(v["browser"]["headless"], json!(true));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${INSTABOT_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${INSTABOT_DOES_NOT_EXIST}"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = InstabotConfigLoader::new()
            .with_yaml_str("extraction:\n  navigation_timeout_secs: 0")
            .load()
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }
}
