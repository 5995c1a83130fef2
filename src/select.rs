use crate::config::CompanionConfig;
use crate::error::{AdError, Result};
use crate::models::{Ad, AdResponse, Companion, Creative, Linear};
use log::debug;

/// The creatives committed to for one ad break
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The ad the creatives were taken from
    pub ad: Ad,

    /// The linear creative to play
    pub linear: Linear,

    /// The first companion creative of the ad, if any
    pub companion: Option<Creative>,

    /// The companion variation exactly matching the configured dimensions
    pub variation: Option<Companion>,
}

/// Pick the creatives for an ad break.
///
/// First ad with a linear creative wins; within it the first linear and the
/// first companion creative are taken, in document order, with no scoring.
/// Zero ads, no linear creative, or a linear creative without media files
/// all yield `AdError::NoFill`. A missing companion variation is not an
/// error; the ad simply runs without one.
pub fn select(response: &AdResponse, target: Option<&CompanionConfig>) -> Result<Selection> {
    let ad = response
        .ads
        .iter()
        .find(|ad| ad.creatives().iter().any(Creative::is_linear))
        .ok_or(AdError::NoFill)?;

    let linear = ad
        .creatives()
        .iter()
        .find_map(|creative| creative.linear.clone())
        .ok_or(AdError::NoFill)?;

    if linear.media_files.is_empty() {
        debug!("linear creative has no media files, skipping ad break");
        return Err(AdError::NoFill);
    }

    let companion = ad
        .creatives()
        .iter()
        .find(|creative| creative.is_companion())
        .cloned();

    let variation = match (target, companion.as_ref()) {
        (Some(target), Some(companion)) => pick_variation(companion, target),
        _ => None,
    };

    Ok(Selection {
        ad: ad.clone(),
        linear,
        companion,
        variation,
    })
}

/// The variation whose dimensions exactly equal the configured target
fn pick_variation(companion: &Creative, target: &CompanionConfig) -> Option<Companion> {
    let variation = companion
        .companion_ads
        .as_ref()?
        .companions
        .iter()
        .find(|variation| {
            variation.width == target.max_width && variation.height == target.max_height
        })
        .cloned();

    if variation.is_none() {
        debug!(
            "no companion variation matches {}x{}",
            target.max_width, target.max_height
        );
    }

    variation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdSystem, CompanionAds, InlineAd, MediaFile};

    fn media_file() -> MediaFile {
        MediaFile {
            url: "https://cdn.example.com/ad.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            api_framework: None,
            bitrate: None,
            width: None,
            height: None,
            delivery: None,
        }
    }

    fn linear_creative(media_files: Vec<MediaFile>) -> Creative {
        Creative {
            id: None,
            sequence: None,
            api_framework: None,
            linear: Some(Linear {
                duration: Some("00:00:30".to_string()),
                media_files,
                video_clicks: None,
                tracking_events: Vec::new(),
            }),
            companion_ads: None,
        }
    }

    fn companion_creative(dimensions: &[(u32, u32)]) -> Creative {
        Creative {
            id: None,
            sequence: None,
            api_framework: None,
            linear: None,
            companion_ads: Some(CompanionAds {
                companions: dimensions
                    .iter()
                    .map(|&(width, height)| Companion {
                        id: None,
                        width,
                        height,
                        static_resource: Some("https://cdn.example.com/banner".to_string()),
                        creative_type: Some("image/png".to_string()),
                        click_through: None,
                        tracking_events: Vec::new(),
                    })
                    .collect(),
            }),
        }
    }

    fn response_with(creatives: Vec<Creative>) -> AdResponse {
        AdResponse {
            version: "3.0".to_string(),
            ads: vec![Ad {
                id: Some("ad-1".to_string()),
                sequence: None,
                inline: Some(InlineAd {
                    ad_system: AdSystem {
                        name: "test".to_string(),
                        version: None,
                    },
                    ad_title: "test".to_string(),
                    impressions: Vec::new(),
                    error: None,
                    creatives,
                }),
                wrapper: None,
            }],
            error: None,
        }
    }

    fn companion_target(width: u32, height: u32) -> CompanionConfig {
        CompanionConfig {
            element_id: "companion-slot".to_string(),
            max_width: width,
            max_height: height,
        }
    }

    #[test]
    fn empty_response_is_no_fill() {
        let response = AdResponse::empty("3.0", None);
        assert!(matches!(select(&response, None), Err(AdError::NoFill)));
    }

    #[test]
    fn response_without_linear_is_no_fill() {
        let response = response_with(vec![companion_creative(&[(300, 250)])]);
        assert!(matches!(select(&response, None), Err(AdError::NoFill)));
    }

    #[test]
    fn linear_without_media_files_is_no_fill() {
        let response = response_with(vec![linear_creative(Vec::new())]);
        assert!(matches!(select(&response, None), Err(AdError::NoFill)));
    }

    #[test]
    fn first_ad_with_linear_wins() {
        let mut response = response_with(vec![linear_creative(vec![media_file()])]);
        let mut no_linear = response.ads[0].clone();
        no_linear.id = Some("ad-0".to_string());
        no_linear.inline.as_mut().unwrap().creatives = vec![companion_creative(&[(300, 250)])];
        response.ads.insert(0, no_linear);

        let selection = select(&response, None).unwrap();
        assert_eq!(selection.ad.id.as_deref(), Some("ad-1"));
    }

    #[test]
    fn exact_companion_dimensions_match() {
        let response = response_with(vec![
            linear_creative(vec![media_file()]),
            companion_creative(&[(300, 250), (728, 90)]),
        ]);

        let selection = select(&response, Some(&companion_target(728, 90))).unwrap();
        let variation = selection.variation.unwrap();
        assert_eq!((variation.width, variation.height), (728, 90));
    }

    #[test]
    fn companion_dimension_mismatch_is_not_an_error() {
        let response = response_with(vec![
            linear_creative(vec![media_file()]),
            companion_creative(&[(300, 250), (728, 90)]),
        ]);

        let selection = select(&response, Some(&companion_target(160, 600))).unwrap();
        assert!(selection.companion.is_some());
        assert!(selection.variation.is_none());
    }

    #[test]
    fn companion_ignored_without_target() {
        let response = response_with(vec![
            linear_creative(vec![media_file()]),
            companion_creative(&[(300, 250)]),
        ]);

        let selection = select(&response, None).unwrap();
        assert!(selection.companion.is_some());
        assert!(selection.variation.is_none());
    }
}
