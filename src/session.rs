use crate::client::VastClient;
use crate::config::PluginConfig;
use crate::error::Result;
use crate::fetch;
use crate::player::{AdSignal, PlayerEvent, PlayerHandle, PlayerSnapshot, source_objects};
use crate::select::{self, Selection};
use crate::surface::{AdSurface, CompanionSpec, SkipButton, SurfaceEvent};
use crate::tracking::{MEDIAFILE_PLAYBACK_ERROR, Tracker, VastTracker};
use crate::vpaid::{self, VpaidHandler};
use log::{debug, info, warn};
use std::fmt;

/// Lifecycle of one ad break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, fetch not yet started
    Idle,
    /// Ad response fetch in flight
    AwaitingResponse,
    /// No usable ad; content proceeds, player state untouched
    Cancelled,
    /// Selection committed, waiting for the host's preroll signal
    ReadyForPreroll,
    /// Linear creative playing
    LinearPlaying,
    /// Linear creative playing with the skip countdown showing
    SkipCountdown,
    /// Media reached its natural end
    Completed,
    /// Playback failed after commit
    Error,
    /// The viewer skipped the ad
    Skipped,
    /// Player state restored, overlays and listeners gone
    TornDown,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingResponse => "awaiting-response",
            Self::Cancelled => "cancelled",
            Self::ReadyForPreroll => "ready-for-preroll",
            Self::LinearPlaying => "linear-playing",
            Self::SkipCountdown => "skip-countdown",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
            Self::TornDown => "torn-down",
        };
        f.write_str(name)
    }
}

/// Outcome of the host's preroll signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrerollStart {
    /// The linear session started
    Linear,
    /// The creative is VPAID-flagged; the delegate took over
    DelegatedToVpaid,
    /// No committed selection to start
    NotReady,
}

/// Player events the session listens to while a linear ad plays
const AD_LISTENERS: [PlayerEvent; 8] = [
    PlayerEvent::CanPlay,
    PlayerEvent::Play,
    PlayerEvent::Pause,
    PlayerEvent::TimeUpdate,
    PlayerEvent::VolumeChange,
    PlayerEvent::FullscreenChange,
    PlayerEvent::PlaybackError,
    PlayerEvent::Ended,
];

/// The set of player events the session is currently attached to.
///
/// Detached exactly once, on teardown; events arriving afterwards fall
/// through without effect.
#[derive(Debug, Default)]
struct ListenerRegistry {
    events: Vec<PlayerEvent>,
}

impl ListenerRegistry {
    fn attach(&mut self, events: &[PlayerEvent]) {
        self.events.extend_from_slice(events);
    }

    fn is_attached(&self, event: PlayerEvent) -> bool {
        self.events.contains(&event)
    }

    fn detach_all(&mut self) -> usize {
        let count = self.events.len();
        self.events.clear();
        count
    }
}

/// One ad break: fetch, selection, linear playback, tracking, teardown.
///
/// Single-threaded and event-driven: `request_ads` is the only suspension
/// point; everything after is driven by host-forwarded events, each handled
/// to completion. At most one session may be active per player at a time.
pub struct AdSession {
    config: PluginConfig,
    state: SessionState,
    selection: Option<Selection>,
    tracker: Option<Box<dyn Tracker>>,
    surface: Box<dyn AdSurface>,
    vpaid: Box<dyn VpaidHandler>,
    original_state: Option<PlayerSnapshot>,
    listeners: ListenerRegistry,
    skip_button: SkipButton,
    skip_armed: bool,
    error_occurred: bool,
    pending_unpause: bool,
    previous_muted: bool,
    previous_volume: f64,
}

impl AdSession {
    pub fn new(
        config: PluginConfig,
        surface: Box<dyn AdSurface>,
        vpaid: Box<dyn VpaidHandler>,
    ) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            selection: None,
            tracker: None,
            surface,
            vpaid,
            original_state: None,
            listeners: ListenerRegistry::default(),
            skip_button: SkipButton::hidden(),
            skip_armed: false,
            error_occurred: false,
            pending_unpause: false,
            previous_muted: false,
            previous_volume: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn skip_button(&self) -> &SkipButton {
        &self.skip_button
    }

    /// Replace the tracker bound at selection time.
    ///
    /// Hosts with their own tracking pipeline install it here, after the
    /// ads-ready signal and before the preroll starts.
    pub fn set_tracker(&mut self, tracker: Box<dyn Tracker>) {
        self.tracker = Some(tracker);
    }

    fn set_state(&mut self, next: SessionState) {
        debug!("ad session: {} -> {next}", self.state);
        self.state = next;
    }

    /// Fetch the ad response and commit a selection.
    ///
    /// Ends at `ReadyForPreroll` (ads-ready signal) or `Cancelled`
    /// (ads-cancelled signal). On the cancel path no player state has been
    /// touched, so no teardown ever follows it.
    pub async fn request_ads<C: VastClient>(
        &mut self,
        client: &C,
        player: &mut dyn PlayerHandle,
    ) {
        if self.state != SessionState::Idle {
            warn!("request_ads called in state {}, ignoring", self.state);
            return;
        }
        self.set_state(SessionState::AwaitingResponse);

        match Self::resolve_selection(client, &self.config).await {
            Ok(selection) => {
                self.render_companion(&selection);
                self.tracker = Some(Box::new(VastTracker::new(&selection)));
                self.selection = Some(selection);
                self.set_state(SessionState::ReadyForPreroll);
                info!("ads ready");
                player.trigger(AdSignal::AdsReady);
            }
            Err(e) => {
                self.set_state(SessionState::Cancelled);
                info!("ads cancelled: {e}");
                player.trigger(AdSignal::AdsCanceled);
            }
        }
    }

    async fn resolve_selection<C: VastClient>(
        client: &C,
        config: &PluginConfig,
    ) -> Result<Selection> {
        let response = fetch::fetch_response(client, config).await?;
        select::select(&response, config.companion.as_ref())
    }

    /// Hand the matched companion variation to the presentation layer.
    /// Only image resources are rendered.
    fn render_companion(&mut self, selection: &Selection) {
        let Some(target) = &self.config.companion else {
            return;
        };
        let Some(variation) = &selection.variation else {
            return;
        };
        let Some(resource) = &variation.static_resource else {
            return;
        };
        if !variation
            .creative_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image"))
        {
            debug!(
                "companion variation has unsupported type {:?}, not rendering",
                variation.creative_type
            );
            return;
        }

        self.surface.render_companion(&CompanionSpec {
            element_id: target.element_id.clone(),
            width: variation.width,
            height: variation.height,
            resource_url: resource.clone(),
            content_type: variation.creative_type.clone(),
            click_through: variation.click_through.clone(),
        });
    }

    /// The host is ready to show a preroll.
    ///
    /// VPAID-flagged creatives are handed to the delegate and bypass the
    /// rest of the machine; anything else starts the linear session.
    pub fn ready_for_preroll(&mut self, player: &mut dyn PlayerHandle) -> PrerollStart {
        if self.state != SessionState::ReadyForPreroll {
            warn!("preroll signal in state {}, ignoring", self.state);
            return PrerollStart::NotReady;
        }
        let Some(selection) = &self.selection else {
            return PrerollStart::NotReady;
        };

        if vpaid::requires_vpaid(&selection.linear) {
            info!("creative requires VPAID, delegating");
            let creative = selection.linear.clone();
            self.vpaid.handle(player, &creative, &self.config.vpaid);
            return PrerollStart::DelegatedToVpaid;
        }

        self.start_linear(player);
        PrerollStart::Linear
    }

    /// Commit to linear ad playback: snapshot and override player state,
    /// swap the source, install overlays, attach listeners.
    fn start_linear(&mut self, player: &mut dyn PlayerHandle) {
        let sources = match &self.selection {
            Some(selection) => source_objects(&selection.linear.media_files),
            None => return,
        };

        player.start_linear_ad_mode();

        self.original_state = Some(PlayerSnapshot {
            controls_enabled: player.controls_enabled(),
            seek_enabled: player.seek_enabled(),
        });
        player.set_controls_enabled(self.config.controls_enabled);
        player.set_seek_enabled(self.config.seek_enabled);

        player.load_sources(sources);

        self.surface.install_click_blocker();
        self.skip_button = SkipButton::hidden();
        self.surface.install_skip_button(&self.skip_button);

        self.listeners.attach(&AD_LISTENERS);
        self.previous_muted = player.muted();
        self.previous_volume = player.volume();
        self.skip_armed = false;
        self.pending_unpause = false;

        self.set_state(SessionState::LinearPlaying);
    }

    /// Dispatch a host-forwarded player event into the session
    pub fn handle_player_event(&mut self, player: &mut dyn PlayerHandle, event: PlayerEvent) {
        if event == PlayerEvent::ContentChanged {
            debug!("content changed");
            return;
        }
        if !matches!(
            self.state,
            SessionState::LinearPlaying | SessionState::SkipCountdown
        ) {
            return;
        }
        if !self.listeners.is_attached(event) {
            return;
        }

        match event {
            PlayerEvent::CanPlay => {
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.impression();
                }
            }
            PlayerEvent::Play => self.on_play(player),
            PlayerEvent::Pause => {
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.set_paused(true);
                }
                self.pending_unpause = true;
            }
            PlayerEvent::TimeUpdate => self.on_time_update(player),
            PlayerEvent::VolumeChange => self.on_volume_change(player),
            PlayerEvent::FullscreenChange => {
                let fullscreen = player.is_fullscreen();
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.set_fullscreen(fullscreen);
                }
            }
            PlayerEvent::PlaybackError => self.on_playback_error(player),
            PlayerEvent::Ended => self.on_ended(player),
            PlayerEvent::ContentChanged => {}
        }
    }

    /// Dispatch an overlay gesture into the session
    pub fn handle_surface_event(&mut self, player: &mut dyn PlayerHandle, event: SurfaceEvent) {
        if !matches!(
            self.state,
            SessionState::LinearPlaying | SessionState::SkipCountdown
        ) {
            return;
        }

        match event {
            SurfaceEvent::BlockerClicked => {
                // A click while paused resumes; only a click during playback
                // counts as an ad click
                if player.paused() {
                    player.play();
                    return;
                }
                if let Some(tracker) = self.tracker.as_mut() {
                    if let Some(url) = tracker.click() {
                        self.surface.open_click_through(&url);
                    }
                }
            }
            SurfaceEvent::SkipClicked => {
                if !self.skip_button.enabled {
                    return;
                }
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.skip();
                }
                self.set_state(SessionState::Skipped);
                self.teardown(player);
            }
        }
    }

    fn on_play(&mut self, player: &mut dyn PlayerHandle) {
        self.surface.hide_loading_spinner();

        if self.pending_unpause {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.set_paused(false);
            }
            self.pending_unpause = false;
        }

        if !self.skip_armed {
            self.skip_armed = true;
            if self.config.skip > 0 && player.duration() >= f64::from(self.config.skip) {
                self.skip_button.visible = true;
                self.surface.update_skip_button(&self.skip_button);
                self.set_state(SessionState::SkipCountdown);
            }
        }
    }

    fn on_time_update(&mut self, player: &mut dyn PlayerHandle) {
        self.surface.hide_loading_spinner();

        let current = player.current_time();
        if let Some(tracker) = self.tracker.as_mut() {
            if tracker.asset_duration().is_none() {
                tracker.set_asset_duration(player.duration());
            }
            tracker.set_progress(current);
        }

        if self.state == SessionState::SkipCountdown {
            self.update_skip_countdown(current);
        }
    }

    fn update_skip_countdown(&mut self, elapsed: f64) {
        // Enabling is one-way; once skippable the button never locks again
        if self.skip_button.enabled {
            return;
        }

        let remaining = (f64::from(self.config.skip) - elapsed).ceil();
        if remaining > 0.0 {
            let label = format!("Skip in {}...", remaining as u32);
            if label != self.skip_button.label {
                self.skip_button.label = label;
                self.surface.update_skip_button(&self.skip_button);
            }
        } else {
            self.skip_button.enabled = true;
            self.skip_button.label = "Skip".to_string();
            self.surface.update_skip_button(&self.skip_button);
        }
    }

    fn on_volume_change(&mut self, player: &mut dyn PlayerHandle) {
        let muted_now = player.muted();
        let volume_now = player.volume();
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        // An explicit muted-flag change wins; otherwise infer from the
        // volume crossing zero. Exactly one trigger per event.
        if self.previous_muted != muted_now {
            tracker.set_muted(muted_now);
            self.previous_muted = muted_now;
        } else if self.previous_volume != volume_now {
            if self.previous_volume > 0.0 && volume_now == 0.0 {
                tracker.set_muted(true);
            } else if self.previous_volume == 0.0 && volume_now > 0.0 {
                tracker.set_muted(false);
            }
            self.previous_volume = volume_now;
        }
    }

    fn on_playback_error(&mut self, player: &mut dyn PlayerHandle) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.error_with_code(MEDIAFILE_PLAYBACK_ERROR);
        }
        self.error_occurred = true;

        // Ad failures must not surface in the viewer's error UI
        player.clear_error();
        player.trigger(AdSignal::AdEnded);

        self.set_state(SessionState::Error);
        self.teardown(player);
    }

    fn on_ended(&mut self, player: &mut dyn PlayerHandle) {
        self.set_state(SessionState::Completed);
        self.teardown(player);
    }

    /// Remove overlays, detach listeners, restore the player. Runs exactly
    /// once, whichever terminal event gets here first.
    fn teardown(&mut self, player: &mut dyn PlayerHandle) {
        if self.state == SessionState::TornDown {
            return;
        }

        let detached = self.listeners.detach_all();
        debug!("detached {detached} ad listeners");

        self.surface.remove_overlays();
        player.end_linear_ad_mode();

        if let Some(snapshot) = self.original_state.take() {
            player.set_controls_enabled(snapshot.controls_enabled);
            player.set_seek_enabled(snapshot.seek_enabled);
        }

        player.trigger(AdSignal::SessionDone);

        if !self.error_occurred {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.complete();
            }
        }

        self.set_state(SessionState::TornDown);
        info!("ad session torn down");
    }
}
