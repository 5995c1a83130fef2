use serde::{Deserialize, Serialize};

/// Plugin configuration for a single ad break
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginConfig {
    /// Remote ad tag URL
    pub url: Option<String>,

    /// Inline VAST document, as an XML string
    pub xml: Option<String>,

    /// Whether seeking stays enabled while the ad plays
    pub seek_enabled: bool,

    /// Whether player controls stay visible while the ad plays
    pub controls_enabled: bool,

    /// Maximum wrapper redirection depth
    pub wrapper_limit: u32,

    /// Whether the ad request carries credentials
    pub with_credentials: bool,

    /// Skip offset in seconds; 0 disables the skip button
    pub skip: u32,

    /// Companion ad rendering target, if any
    pub companion: Option<CompanionConfig>,

    /// Passthrough configuration for the VPAID delegate
    pub vpaid: VpaidConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            url: None,
            xml: None,
            seek_enabled: false,
            controls_enabled: false,
            wrapper_limit: 10,
            with_credentials: true,
            skip: 0,
            companion: None,
            vpaid: VpaidConfig::default(),
        }
    }
}

/// Where and at which exact dimensions a companion ad is rendered
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompanionConfig {
    /// The host element the companion is rendered into
    pub element_id: String,

    /// Required variation width
    pub max_width: u32,

    /// Required variation height
    pub max_height: u32,
}

/// Opaque configuration handed to the VPAID delegate
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct VpaidConfig {
    /// The element the delegate mounts its container into
    pub container_id: Option<String>,

    /// Class applied to the delegate container
    pub container_class: String,

    /// Which video element the delegate reuses
    pub video_instance: String,
}

impl Default for VpaidConfig {
    fn default() -> Self {
        Self {
            container_id: None,
            container_class: "vjs-vpaid-container".to_string(),
            video_instance: "none".to_string(),
        }
    }
}
