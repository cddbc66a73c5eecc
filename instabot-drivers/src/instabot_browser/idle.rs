//! Network-idle detection.
//!
//! WebDriver has no "network idle" event, so the page is probed on an
//! interval and the number of finished resource entries is compared between
//! probes. Once the document is `complete` and that number has not moved for
//! the quiescence window, the page counts as settled.
//!
//! Requests that start after the window closed (lazy loaders, timers) are not
//! seen; content they render is missed.
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Script evaluated on every probe. The body runs as a function, so it returns.
pub const PROBE_SCRIPT: &str = r#"
    const nav = performance.getEntriesByType('navigation')[0];
    const status = nav && typeof nav.responseStatus === 'number' && nav.responseStatus > 0
        ? nav.responseStatus
        : null;
    return {
        readyState: document.readyState,
        resources: performance.getEntriesByType('resource').length,
        status: status,
        contentType: document.contentType || null,
        href: window.location.href,
        redirectCount: nav ? nav.redirectCount : 0,
    };
"#;

/// One observation of the page, as returned by [`PROBE_SCRIPT`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageProbe {
    pub ready_state: String,
    pub resources: usize,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub content_type: Option<String>,
    pub href: String,
    #[serde(default)]
    pub redirect_count: u32,
}

impl PageProbe {
    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }
}

#[derive(Debug, Clone)]
pub struct IdleTracker {
    window: Duration,
    last_count: Option<usize>,
    stable_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_count: None,
            stable_since: None,
        }
    }

    /// Feed one probe; returns `true` once the page has been quiet for the window.
    pub fn observe(&mut self, complete: bool, resources: usize, now: Instant) -> bool {
        if !complete {
            self.last_count = Some(resources);
            self.stable_since = None;
            return false;
        }
        if self.last_count != Some(resources) {
            self.last_count = Some(resources);
            self.stable_since = Some(now);
        }
        let since = *self.stable_since.get_or_insert(now);
        now.saturating_duration_since(since) >= self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn waits_for_the_full_window() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(WINDOW);
        assert!(!tracker.observe(true, 4, t0));
        assert!(!tracker.observe(true, 4, t0 + Duration::from_millis(300)));
        assert!(tracker.observe(true, 4, t0 + Duration::from_millis(500)));
    }

    #[test]
    fn new_resources_restart_the_window() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(WINDOW);
        assert!(!tracker.observe(true, 4, t0));
        assert!(!tracker.observe(true, 6, t0 + Duration::from_millis(400)));
        assert!(!tracker.observe(true, 6, t0 + Duration::from_millis(800)));
        assert!(tracker.observe(true, 6, t0 + Duration::from_millis(900)));
    }

    #[test]
    fn loading_document_never_counts_as_idle() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(WINDOW);
        assert!(!tracker.observe(false, 0, t0));
        assert!(!tracker.observe(false, 0, t0 + Duration::from_secs(5)));
        // the window starts with the first complete probe
        assert!(!tracker.observe(true, 0, t0 + Duration::from_secs(6)));
        assert!(tracker.observe(true, 0, t0 + Duration::from_millis(6500)));
    }

    #[test]
    fn zero_window_settles_on_first_complete_probe() {
        let mut tracker = IdleTracker::new(Duration::ZERO);
        assert!(tracker.observe(true, 3, Instant::now()));
    }

    #[test]
    fn probe_payload_deserializes() {
        let probe: PageProbe = serde_json::from_value(serde_json::json!({
            "readyState": "complete",
            "resources": 12,
            "status": 404,
            "contentType": "text/html",
            "href": "https://example.com/missing",
            "redirectCount": 0
        }))
        .unwrap();
        assert!(probe.is_complete());
        assert_eq!(probe.status, Some(404));
        assert_eq!(probe.resources, 12);
    }
}
