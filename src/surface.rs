/// Skip button state owned by the session.
///
/// The presentation layer derives styling from these fields; the session
/// never toggles CSS classes itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipButton {
    /// Whether the button is shown at all
    pub visible: bool,

    /// Whether activating the button skips the ad; one-way, never reset
    pub enabled: bool,

    /// Current label ("Skip in N..." while counting down, then "Skip")
    pub label: String,
}

impl SkipButton {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            enabled: false,
            label: String::new(),
        }
    }
}

/// A companion variation resolved for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionSpec {
    /// Host element the companion is rendered into
    pub element_id: String,

    pub width: u32,

    pub height: u32,

    /// Static resource URL
    pub resource_url: String,

    /// Content type of the resource
    pub content_type: Option<String>,

    /// Click-through URL wrapped around the resource, if any
    pub click_through: Option<String>,
}

/// User gestures the overlay glue forwards back into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The click blocker over the video was clicked
    BlockerClicked,
    /// The skip button was clicked
    SkipClicked,
}

/// Presentation seam: everything the session needs from the DOM layer.
///
/// Implementations own element creation and removal; the session only states
/// what should exist and in which state.
pub trait AdSurface {
    /// Install the click blocker over the playback area
    fn install_click_blocker(&mut self);

    /// Install the skip button in its initial (hidden) state
    fn install_skip_button(&mut self, button: &SkipButton);

    /// Reflect a skip button state change
    fn update_skip_button(&mut self, button: &SkipButton);

    /// Hide the host's loading spinner while the ad plays
    fn hide_loading_spinner(&mut self);

    /// Render a companion variation into its configured element
    fn render_companion(&mut self, companion: &CompanionSpec);

    /// Open a click-through target
    fn open_click_through(&mut self, url: &str);

    /// Remove every overlay this session created
    fn remove_overlays(&mut self);
}
