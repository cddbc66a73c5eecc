//! Builds the runtime services from configuration.
use anyhow::{Context, Result};
use instabot_config::{InstabotConfig, LoggingSettings};
use instabot_common::observability::{LogConfig, LogFormat};
use instabot_drivers::instabot_browser::{
    driver::{DriverOptions, WebDriverLauncher},
    session::IdlePolicy,
};
use instabot_llm::comments::{CommentGenerator, CommentOptions};
use instabot_llm::ensure_llm_ready;
use instabot_social::wordpress::WordPressClient;
use instabot_web::{ArticleExtractor, ExtractionOptions, Readability, ReadabilityOptions};
use std::path::PathBuf;
use std::sync::Arc;

pub fn log_config(settings: &LoggingSettings) -> LogConfig {
    LogConfig {
        app_name: "instabot",
        log_dir: settings.dir.as_ref().map(PathBuf::from),
        emit_stderr: settings.stderr,
        format: LogFormat::from_name(&settings.format),
        default_filter: settings.filter.clone(),
    }
}

pub fn extraction_options(cfg: &InstabotConfig) -> ExtractionOptions {
    ExtractionOptions {
        navigation_timeout: cfg.extraction.navigation_timeout(),
        idle: IdlePolicy {
            window: cfg.extraction.idle_window(),
            poll_interval: cfg.extraction.idle_poll(),
        },
    }
}

pub fn build_extractor(cfg: &InstabotConfig) -> ArticleExtractor {
    let browser = &cfg.browser;
    let launcher = WebDriverLauncher::new(DriverOptions {
        webdriver_url: browser.webdriver_url.clone(),
        headless: browser.headless,
        user_agent: browser.user_agent.clone(),
        window_size: (browser.window_width, browser.window_height),
        extra_args: browser.args.clone(),
    });
    let reader = Readability::new(ReadabilityOptions {
        char_threshold: cfg.extraction.char_threshold,
        ..ReadabilityOptions::default()
    });
    ArticleExtractor::new(Arc::new(launcher), Arc::new(reader), extraction_options(cfg))
}

pub fn build_wordpress(cfg: &InstabotConfig) -> Result<WordPressClient> {
    let wp = cfg
        .wordpress
        .as_ref()
        .context("no `wordpress` section in the configuration")?;
    WordPressClient::new(&wp.base_url, wp.auth_token.clone())
}

pub async fn build_comment_generator(cfg: &InstabotConfig) -> Result<CommentGenerator> {
    let llm = cfg
        .llm
        .as_ref()
        .context("no `llm` section in the configuration")?;
    let client = ensure_llm_ready(llm).await?;
    Ok(CommentGenerator::new(client, CommentOptions::from_settings(llm)))
}
