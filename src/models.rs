use serde::{Deserialize, Serialize};

/// A parsed VAST ad response
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AdResponse {
    /// The VAST version (e.g., "2.0", "3.0", "4.0", etc.)
    pub version: String,

    /// The Ad entries within the response, in document order
    pub ads: Vec<Ad>,

    /// Error note attached by the client (e.g., wrapper depth exhausted)
    pub error: Option<String>,
}

impl AdResponse {
    /// An empty response, the valid "no fill" terminal state
    pub fn empty(version: impl Into<String>, error: Option<String>) -> Self {
        Self {
            version: version.into(),
            ads: Vec::new(),
            error,
        }
    }
}

/// An Ad entry within an ad response
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Ad {
    /// The ad ID
    pub id: Option<String>,

    /// The ad sequence number (for ad pods)
    pub sequence: Option<u32>,

    /// The in-line ad payload
    pub inline: Option<InlineAd>,

    /// The wrapper redirection payload
    pub wrapper: Option<Wrapper>,
}

impl Ad {
    /// Creatives of the inline payload, if any
    pub fn creatives(&self) -> &[Creative] {
        self.inline
            .as_ref()
            .map(|inline| inline.creatives.as_slice())
            .unwrap_or(&[])
    }
}

/// An InLine ad, carrying the media files and tracking information
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct InlineAd {
    /// The ad system name and version
    pub ad_system: AdSystem,

    /// The ad title
    pub ad_title: String,

    /// Impression tracking URLs
    pub impressions: Vec<Impression>,

    /// Error tracking URL
    pub error: Option<String>,

    /// Creative elements
    pub creatives: Vec<Creative>,
}

/// A Wrapper ad, which redirects to another ad response
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wrapper {
    /// The ad system name and version
    pub ad_system: AdSystem,

    /// The URL of the next ad response in the chain
    pub vast_ad_tag_uri: String,

    /// Impression tracking URLs
    pub impressions: Vec<Impression>,

    /// Error tracking URL
    pub error: Option<String>,
}

/// The ad system information
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AdSystem {
    /// The ad system name
    pub name: String,

    /// The ad system version
    pub version: Option<String>,
}

/// An impression tracking URL
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Impression {
    /// The impression ID
    pub id: Option<String>,

    /// The impression tracking URL
    pub url: String,
}

/// A creative element; the payload decides the variant kind
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Creative {
    /// The creative ID
    pub id: Option<String>,

    /// The creative sequence number
    pub sequence: Option<u32>,

    /// The creative API framework
    pub api_framework: Option<String>,

    /// Linear ad details
    pub linear: Option<Linear>,

    /// CompanionAds details
    pub companion_ads: Option<CompanionAds>,
}

impl Creative {
    pub fn is_linear(&self) -> bool {
        self.linear.is_some()
    }

    pub fn is_companion(&self) -> bool {
        self.companion_ads.is_some()
    }
}

/// A linear ad, played in the main video timeline
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Linear {
    /// The duration as given in the document ("HH:MM:SS" or "HH:MM:SS.mmm")
    pub duration: Option<String>,

    /// Media files
    pub media_files: Vec<MediaFile>,

    /// Video clicks
    pub video_clicks: Option<VideoClicks>,

    /// Tracking events
    pub tracking_events: Vec<TrackingEvent>,
}

impl Linear {
    /// The declared duration in seconds, if present and well-formed
    pub fn duration_seconds(&self) -> Option<f64> {
        parse_duration(self.duration.as_deref()?)
    }

    /// The click-through target, if any
    pub fn click_through(&self) -> Option<&str> {
        self.video_clicks
            .as_ref()
            .and_then(|clicks| clicks.click_through.as_deref())
    }
}

/// Parse a VAST duration ("HH:MM:SS" with optional ".mmm") into seconds
fn parse_duration(raw: &str) -> Option<f64> {
    let mut parts = raw.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// A media file of a linear creative
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct MediaFile {
    /// The media file URL
    pub url: String,

    /// The media file MIME type
    pub mime_type: String,

    /// The API framework required to run the file ("VPAID" flags delegation)
    pub api_framework: Option<String>,

    /// The media file bitrate
    pub bitrate: Option<u32>,

    /// The media file width
    pub width: Option<u32>,

    /// The media file height
    pub height: Option<u32>,

    /// The media file delivery type (progressive or streaming)
    pub delivery: Option<String>,
}

/// Video click-through and click-tracking URLs
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct VideoClicks {
    /// The click-through URL
    pub click_through: Option<String>,

    /// Click tracking URLs
    pub click_tracking: Vec<String>,
}

/// A tracking event
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TrackingEvent {
    /// The event type (e.g., "start", "firstQuartile", "midpoint", "thirdQuartile", "complete", etc.)
    pub event: String,

    /// The tracking URL
    pub url: String,
}

/// Companion ads of a creative
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CompanionAds {
    /// The companion variations
    pub companions: Vec<Companion>,
}

/// A companion ad variation
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Companion {
    /// The companion ID
    pub id: Option<String>,

    /// The companion width
    pub width: u32,

    /// The companion height
    pub height: u32,

    /// The static resource URL
    pub static_resource: Option<String>,

    /// The content type of the static resource (e.g., "image/png")
    pub creative_type: Option<String>,

    /// The companion click-through URL
    pub click_through: Option<String>,

    /// Companion tracking events
    pub tracking_events: Vec<TrackingEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parses_hms() {
        let linear = Linear {
            duration: Some("00:00:30".to_string()),
            media_files: Vec::new(),
            video_clicks: None,
            tracking_events: Vec::new(),
        };
        assert_eq!(linear.duration_seconds(), Some(30.0));
    }

    #[test]
    fn duration_parses_millis() {
        assert_eq!(parse_duration("01:02:03.500"), Some(3723.5));
    }

    #[test]
    fn duration_rejects_garbage() {
        assert_eq!(parse_duration("thirty seconds"), None);
        assert_eq!(parse_duration("00:00:10:00"), None);
    }

    #[test]
    fn creatives_empty_without_inline() {
        let ad = Ad {
            id: None,
            sequence: None,
            inline: None,
            wrapper: None,
        };
        assert!(ad.creatives().is_empty());
    }
}
