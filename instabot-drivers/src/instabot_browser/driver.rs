use crate::instabot_browser::{
    page::WebDriverPage,
    session::{BrowserError, BrowserLauncher, BrowserSession},
};
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// How sessions are opened against a WebDriver service.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// WebDriver endpoint, e.g. chromedriver on `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: Option<String>,
    pub window_size: (u32, u32),
    pub extra_args: Vec<String>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            user_agent: None,
            window_size: (1366, 900),
            extra_args: Vec::new(),
        }
    }
}

impl DriverOptions {
    /// Chrome command-line switches for a throwaway, isolated session.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-infobars".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            "--disable-extensions".to_string(),
            "--no-first-run".to_string(),
            "--incognito".to_string(),
            format!("--window-size={},{}", self.window_size.0, self.window_size.1),
        ];
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": self.chrome_args() }),
        );
        // Navigation readiness is decided by the idle probe, not by WebDriver.
        caps.insert("pageLoadStrategy".to_string(), json!("normal"));
        caps
    }
}

/// Opens a fresh WebDriver session, and so a fresh browser process, per launch.
#[derive(Debug, Clone, Default)]
pub struct WebDriverLauncher {
    options: DriverOptions,
}

impl WebDriverLauncher {
    pub fn new(options: DriverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let client = ClientBuilder::native()
            .capabilities(self.options.capabilities())
            .connect(&self.options.webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(format!("{}: {e}", self.options.webdriver_url)))?;

        tracing::debug!(
            target: "browser.session",
            webdriver = %self.options.webdriver_url,
            headless = self.options.headless,
            "session opened"
        );
        Ok(Box::new(WebDriverPage::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_adds_switches() {
        let args = DriverOptions::default().chrome_args();
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1366,900".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--user-agent")));
    }

    #[test]
    fn headed_sessions_keep_user_agent_and_extras() {
        let opts = DriverOptions {
            headless: false,
            user_agent: Some("instabot/0.1".into()),
            extra_args: vec!["--lang=en-US".into()],
            ..DriverOptions::default()
        };
        let args = opts.chrome_args();
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--user-agent=instabot/0.1".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));
    }

    #[test]
    fn capabilities_carry_chrome_options() {
        let caps = DriverOptions::default().capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }
}
