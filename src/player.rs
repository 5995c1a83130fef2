use crate::models::MediaFile;

/// Player lifecycle events forwarded into the session by the host glue.
///
/// The host owns event registration; the session's listener registry decides
/// which of these are live at any point of the ad break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// First playable frame is available
    CanPlay,
    /// Playback started or resumed
    Play,
    /// Playback paused
    Pause,
    /// Playback position advanced
    TimeUpdate,
    /// Volume level or muted flag changed
    VolumeChange,
    /// Fullscreen entered or exited
    FullscreenChange,
    /// Media failed to play
    PlaybackError,
    /// Natural end of media
    Ended,
    /// The host swapped its content source
    ContentChanged,
}

/// Signals the session emits back to the host player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdSignal {
    /// A playable selection is ready; the host may schedule the preroll
    AdsReady,
    /// The ad break will not run; content proceeds untouched
    AdsCanceled,
    /// Synthesized end of the ad (playback error path)
    AdEnded,
    /// The session finished tearing down
    SessionDone,
}

/// A playable source handed to the player
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub src: String,
    pub mime_type: String,
}

/// Map a creative's media files to player source objects
pub fn source_objects(media_files: &[MediaFile]) -> Vec<MediaSource> {
    media_files
        .iter()
        .map(|media_file| MediaSource {
            src: media_file.url.clone(),
            mime_type: media_file.mime_type.clone(),
        })
        .collect()
}

/// Player state captured before the ad commits, restored on teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub controls_enabled: bool,
    pub seek_enabled: bool,
}

/// Capability-restricted handle to the host player.
///
/// The session mutates the player exclusively through this trait; it never
/// sees the host's concrete player type or its DOM.
pub trait PlayerHandle {
    /// Resume playback
    fn play(&mut self);

    fn paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn muted(&self) -> bool;

    fn is_fullscreen(&self) -> bool;

    fn controls_enabled(&self) -> bool;

    fn set_controls_enabled(&mut self, enabled: bool);

    fn seek_enabled(&self) -> bool;

    fn set_seek_enabled(&mut self, enabled: bool);

    /// Swap the playback source to the given ad media
    fn load_sources(&mut self, sources: Vec<MediaSource>);

    fn start_linear_ad_mode(&mut self);

    fn end_linear_ad_mode(&mut self);

    /// Clear a pending native error so it never reaches the viewer
    fn clear_error(&mut self);

    /// Emit an ad signal to the host
    fn trigger(&mut self, signal: AdSignal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_objects_keep_order_and_mime() {
        let files = vec![
            MediaFile {
                url: "https://cdn.example.com/a.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                api_framework: None,
                bitrate: None,
                width: None,
                height: None,
                delivery: None,
            },
            MediaFile {
                url: "https://cdn.example.com/a.webm".to_string(),
                mime_type: "video/webm".to_string(),
                api_framework: None,
                bitrate: None,
                width: None,
                height: None,
                delivery: None,
            },
        ];

        let sources = source_objects(&files);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].src, "https://cdn.example.com/a.mp4");
        assert_eq!(sources[0].mime_type, "video/mp4");
        assert_eq!(sources[1].mime_type, "video/webm");
    }
}
