//! Driver layer for browser automation.
//!
//! This crate exposes the browser capability the extraction pipeline is
//! written against, plus the WebDriver-backed implementation used in
//! production.
//!
//! - [`instabot_browser::session`]: the `BrowserLauncher`/`BrowserSession`
//!   capability traits and the [`Navigation`](instabot_browser::session::Navigation) report
//! - [`instabot_browser::driver::WebDriverLauncher`]: opens one WebDriver
//!   session (one browser process) per launch
//! - [`instabot_browser::page::WebDriverPage`]: navigation with a network-idle
//!   wait, rendered HTML retrieval and teardown
//! - [`instabot_browser::idle`]: the quiescence tracker behind the idle wait
pub mod instabot_browser;
