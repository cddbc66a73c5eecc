use std::sync::OnceLock;

use instabot_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "instabot-tests",
            emit_stderr: true,
            format: LogFormat::from_name(&std::env::var("INSTABOT_LOG_FORMAT").unwrap_or_default()),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        instabot_common::observability::init_logging(config).unwrap_or_default()
    });
}
