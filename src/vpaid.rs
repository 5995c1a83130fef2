use crate::config::VpaidConfig;
use crate::models::Linear;
use crate::player::PlayerHandle;
use log::warn;

/// Marker value of `MediaFile::api_framework` that flags VPAID delegation
const VPAID_FRAMEWORK: &str = "VPAID";

/// Delegate that executes VPAID creatives.
///
/// Opaque to the session: it is handed the player, the creative, and the
/// passthrough configuration, and the session machine is bypassed entirely.
pub trait VpaidHandler {
    fn handle(&mut self, player: &mut dyn PlayerHandle, creative: &Linear, config: &VpaidConfig);
}

/// Whether the creative carries a VPAID media file and must be delegated
pub fn requires_vpaid(creative: &Linear) -> bool {
    creative
        .media_files
        .iter()
        .any(|media_file| media_file.api_framework.as_deref() == Some(VPAID_FRAMEWORK))
}

/// Default handler for hosts without a VPAID runtime: drops the creative
pub struct NoopVpaidHandler;

impl VpaidHandler for NoopVpaidHandler {
    fn handle(&mut self, _player: &mut dyn PlayerHandle, _creative: &Linear, _config: &VpaidConfig) {
        warn!("creative requires VPAID but no VPAID handler is installed; ad dropped");
    }
}
