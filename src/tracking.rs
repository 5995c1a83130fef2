use crate::select::Selection;
use log::{debug, warn};
use std::collections::HashMap;
use std::time::Duration;

/// VAST error code recorded when a committed media file fails to play
pub const MEDIAFILE_PLAYBACK_ERROR: &str = "405";

/// Macro substituted into error tracking URLs
const ERRORCODE_MACRO: &str = "[ERRORCODE]";

/// Timeout for tracking pixel requests
const PIXEL_TIMEOUT: Duration = Duration::from_secs(3);

/// Progress milestones, in firing order
const QUARTILE_EVENTS: [(&str, f64); 4] = [
    ("start", 0.0),
    ("firstQuartile", 0.25),
    ("midpoint", 0.5),
    ("thirdQuartile", 0.75),
];

/// The tracking contract a session drives.
///
/// Bound to the selected ad and creatives for the session's lifetime; every
/// call maps to the corresponding VAST tracking semantics.
pub trait Tracker {
    /// The ad was shown; idempotent per session
    fn impression(&mut self);

    /// Asset duration as far as the tracker knows it
    fn asset_duration(&self) -> Option<f64>;

    /// Establish the asset duration from the player
    fn set_asset_duration(&mut self, seconds: f64);

    /// Report the current playback position
    fn set_progress(&mut self, seconds: f64);

    fn set_paused(&mut self, paused: bool);

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn set_muted(&mut self, muted: bool);

    /// The viewer clicked through; returns the click-through target to open
    fn click(&mut self) -> Option<String>;

    /// The viewer skipped the ad
    fn skip(&mut self);

    /// The ad played to its end
    fn complete(&mut self);

    /// Playback failed with the given VAST error code
    fn error_with_code(&mut self, code: &str);
}

/// Tracker firing the URLs carried by the selected ad and creatives.
///
/// Pixels are fire-and-forget GETs spawned on the ambient tokio runtime;
/// without a running runtime they are dropped with a warning.
pub struct VastTracker {
    http: reqwest::Client,
    impression_urls: Vec<String>,
    error_url: Option<String>,
    event_urls: HashMap<String, Vec<String>>,
    click_tracking: Vec<String>,
    click_through: Option<String>,
    asset_duration: Option<f64>,
    impression_fired: bool,
    quartiles_fired: [bool; 4],
    paused: bool,
    muted: bool,
    fullscreen: bool,
}

impl VastTracker {
    /// Bind a tracker to the creatives selected for this session
    pub fn new(selection: &Selection) -> Self {
        let mut impression_urls = Vec::new();
        let mut error_url = None;
        if let Some(inline) = &selection.ad.inline {
            impression_urls.extend(inline.impressions.iter().map(|i| i.url.clone()));
            error_url = inline.error.clone();
        }

        let mut event_urls: HashMap<String, Vec<String>> = HashMap::new();
        for event in &selection.linear.tracking_events {
            event_urls
                .entry(event.event.clone())
                .or_default()
                .push(event.url.clone());
        }
        if let Some(variation) = &selection.variation {
            for event in &variation.tracking_events {
                event_urls
                    .entry(event.event.clone())
                    .or_default()
                    .push(event.url.clone());
            }
        }

        let (click_through, click_tracking) = match &selection.linear.video_clicks {
            Some(clicks) => (clicks.click_through.clone(), clicks.click_tracking.clone()),
            None => (None, Vec::new()),
        };

        Self {
            http: reqwest::Client::builder()
                .timeout(PIXEL_TIMEOUT)
                .build()
                .unwrap_or_default(),
            impression_urls,
            error_url,
            event_urls,
            click_tracking,
            click_through,
            asset_duration: None,
            impression_fired: false,
            quartiles_fired: [false; 4],
            paused: false,
            muted: false,
            fullscreen: false,
        }
    }

    /// Fire tracking URLs without waiting for their responses
    fn fire(&self, label: &str, urls: &[String]) {
        if urls.is_empty() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; dropping {} tracking request(s) for {label}", urls.len());
            return;
        };

        for url in urls {
            let http = self.http.clone();
            let url = url.clone();
            let label = label.to_string();
            handle.spawn(async move {
                if let Err(e) = http.get(&url).send().await {
                    debug!("tracking request for {label} failed: {e}");
                }
            });
        }
    }

    fn fire_event(&self, name: &str) {
        debug!("tracking event: {name}");
        if let Some(urls) = self.event_urls.get(name) {
            self.fire(name, urls);
        }
    }
}

/// Substitute the VAST error-code macro into an error tracking URL
fn substitute_error_code(url: &str, code: &str) -> String {
    url.replace(ERRORCODE_MACRO, code)
}

impl Tracker for VastTracker {
    fn impression(&mut self) {
        if self.impression_fired {
            return;
        }
        self.impression_fired = true;
        debug!("tracking impression");
        self.fire("impression", &self.impression_urls);
    }

    fn asset_duration(&self) -> Option<f64> {
        self.asset_duration
    }

    fn set_asset_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.asset_duration = Some(seconds);
        }
    }

    fn set_progress(&mut self, seconds: f64) {
        let Some(duration) = self.asset_duration else {
            return;
        };

        for (index, (name, threshold)) in QUARTILE_EVENTS.iter().enumerate() {
            if self.quartiles_fired[index] {
                continue;
            }
            let due = if index == 0 {
                seconds > 0.0
            } else {
                seconds / duration >= *threshold
            };
            if due {
                self.quartiles_fired[index] = true;
                self.fire_event(name);
            }
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        self.fire_event(if paused { "pause" } else { "resume" });
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen == fullscreen {
            return;
        }
        self.fullscreen = fullscreen;
        self.fire_event(if fullscreen { "fullscreen" } else { "exitFullscreen" });
    }

    fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        self.fire_event(if muted { "mute" } else { "unmute" });
    }

    fn click(&mut self) -> Option<String> {
        debug!("tracking click");
        self.fire("click", &self.click_tracking);
        self.click_through.clone()
    }

    fn skip(&mut self) {
        self.fire_event("skip");
    }

    fn complete(&mut self) {
        self.fire_event("complete");
    }

    fn error_with_code(&mut self, code: &str) {
        warn!("tracking playback error, code {code}");
        if let Some(url) = &self.error_url {
            let url = substitute_error_code(url, code);
            self.fire("error", &[url]);
        }
    }
}
