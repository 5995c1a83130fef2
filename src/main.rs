use clap::{Parser, Subcommand};
use std::path::Path;

use vast_preroll::client::HttpVastClient;
use vast_preroll::config::{CompanionConfig, PluginConfig};
use vast_preroll::player::{AdSignal, MediaSource, PlayerEvent, PlayerHandle};
use vast_preroll::select;
use vast_preroll::session::{AdSession, PrerollStart, SessionState};
use vast_preroll::surface::{AdSurface, CompanionSpec, SkipButton};
use vast_preroll::tracking::Tracker;
use vast_preroll::vpaid::NoopVpaidHandler;
use vast_preroll::{fetch, AdError};

/// VAST preroll inspector and session simulator
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an ad tag or document and report the creative selection
    Inspect {
        /// Path to a VAST file or an ad tag URL
        #[arg(short, long)]
        input: String,

        /// Pretty print the parsed response
        #[arg(short, long)]
        pretty: bool,

        /// Companion target as WIDTHxHEIGHT (e.g. 300x250)
        #[arg(long)]
        companion: Option<String>,
    },

    /// Run a scripted ad session against an in-process player
    Simulate {
        /// Path to a VAST file or an ad tag URL
        #[arg(short, long)]
        input: String,

        /// Skip offset in seconds (0 disables the skip button)
        #[arg(short, long, default_value_t = 0)]
        skip: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Inspect {
            input,
            pretty,
            companion,
        } => {
            let mut config = config_for_input(input)?;
            config.companion = companion
                .as_deref()
                .map(parse_companion_target)
                .transpose()?;

            let client = HttpVastClient::new()?;
            let response = fetch::fetch_response(&client, &config).await?;

            if *pretty {
                println!("{response:#?}");
            } else {
                println!("{response:?}");
            }

            match select::select(&response, config.companion.as_ref()) {
                Ok(selection) => {
                    println!();
                    println!(
                        "Selected ad {} with {} media file(s)",
                        selection.ad.id.as_deref().unwrap_or("<unnamed>"),
                        selection.linear.media_files.len()
                    );
                    if let Some(variation) = &selection.variation {
                        println!(
                            "Companion variation: {}x{}",
                            variation.width, variation.height
                        );
                    }
                }
                Err(AdError::NoFill) => println!("\nNo playable linear creative (no fill)"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Simulate { input, skip } => {
            let config = PluginConfig {
                skip: *skip,
                ..config_for_input(input)?
            };
            simulate(config).await?;
        }
    }

    Ok(())
}

/// Treat an existing local path as an inline document, anything else as a URL
fn config_for_input(input: &str) -> Result<PluginConfig, AdError> {
    if Path::new(input).exists() {
        Ok(PluginConfig {
            xml: Some(std::fs::read_to_string(input)?),
            ..PluginConfig::default()
        })
    } else {
        Ok(PluginConfig {
            url: Some(input.to_string()),
            ..PluginConfig::default()
        })
    }
}

fn parse_companion_target(spec: &str) -> Result<CompanionConfig, AdError> {
    let (width, height) = spec
        .split_once('x')
        .ok_or_else(|| AdError::Configuration(format!("invalid companion target: {spec}")))?;
    Ok(CompanionConfig {
        element_id: "companion".to_string(),
        max_width: width
            .parse()
            .map_err(|_| AdError::Configuration(format!("invalid companion width: {width}")))?,
        max_height: height
            .parse()
            .map_err(|_| AdError::Configuration(format!("invalid companion height: {height}")))?,
    })
}

/// Run one full scripted session: ready, play, ticks, natural end
async fn simulate(config: PluginConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpVastClient::new()?;
    let mut player = SimPlayer::new();
    let mut session = AdSession::new(
        config,
        Box::new(ConsoleSurface),
        Box::new(NoopVpaidHandler),
    );

    session.request_ads(&client, &mut player).await;

    if session.state() == SessionState::Cancelled {
        println!("Ad break cancelled; content would play untouched");
        return Ok(());
    }

    let duration = session
        .selection()
        .and_then(|selection| selection.linear.duration_seconds())
        .unwrap_or(30.0);
    player.duration = duration;

    // Print tracking calls instead of firing pixels
    session.set_tracker(Box::new(ConsoleTracker { duration: None }));

    match session.ready_for_preroll(&mut player) {
        PrerollStart::DelegatedToVpaid => {
            println!("Creative requires VPAID; delegate invoked");
            return Ok(());
        }
        PrerollStart::NotReady => {
            println!("Session not ready for preroll");
            return Ok(());
        }
        PrerollStart::Linear => {}
    }

    session.handle_player_event(&mut player, PlayerEvent::CanPlay);
    player.playing = true;
    session.handle_player_event(&mut player, PlayerEvent::Play);

    let mut elapsed = 0.0;
    while elapsed < duration {
        elapsed = (elapsed + 1.0).min(duration);
        player.current_time = elapsed;
        session.handle_player_event(&mut player, PlayerEvent::TimeUpdate);
        if session.skip_button().visible {
            println!(
                "[player] t={elapsed:>5.1}s skip button: {}",
                if session.skip_button().enabled {
                    "enabled"
                } else {
                    session.skip_button().label.as_str()
                }
            );
        }
    }

    session.handle_player_event(&mut player, PlayerEvent::Ended);
    println!("Session finished in state: {}", session.state());

    Ok(())
}

/// In-process stand-in for the host player
struct SimPlayer {
    playing: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    controls_enabled: bool,
    seek_enabled: bool,
}

impl SimPlayer {
    fn new() -> Self {
        Self {
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            controls_enabled: true,
            seek_enabled: true,
        }
    }
}

impl PlayerHandle for SimPlayer {
    fn play(&mut self) {
        self.playing = true;
    }

    fn paused(&self) -> bool {
        !self.playing
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
        println!("[player] controls {}", if enabled { "shown" } else { "hidden" });
    }

    fn seek_enabled(&self) -> bool {
        self.seek_enabled
    }

    fn set_seek_enabled(&mut self, enabled: bool) {
        self.seek_enabled = enabled;
        println!("[player] seeking {}", if enabled { "enabled" } else { "disabled" });
    }

    fn load_sources(&mut self, sources: Vec<MediaSource>) {
        for source in &sources {
            println!("[player] source: {} ({})", source.src, source.mime_type);
        }
    }

    fn start_linear_ad_mode(&mut self) {
        println!("[player] entering linear ad mode");
    }

    fn end_linear_ad_mode(&mut self) {
        println!("[player] leaving linear ad mode");
    }

    fn clear_error(&mut self) {
        println!("[player] native error cleared");
    }

    fn trigger(&mut self, signal: AdSignal) {
        println!("[player] signal: {signal:?}");
    }
}

/// Overlay surface that narrates what the DOM glue would do
struct ConsoleSurface;

impl AdSurface for ConsoleSurface {
    fn install_click_blocker(&mut self) {
        println!("[surface] click blocker installed");
    }

    fn install_skip_button(&mut self, _button: &SkipButton) {
        println!("[surface] skip button installed (hidden)");
    }

    fn update_skip_button(&mut self, _button: &SkipButton) {}

    fn hide_loading_spinner(&mut self) {}

    fn render_companion(&mut self, companion: &CompanionSpec) {
        println!(
            "[surface] companion {}x{} -> #{}",
            companion.width, companion.height, companion.element_id
        );
    }

    fn open_click_through(&mut self, url: &str) {
        println!("[surface] opening click-through: {url}");
    }

    fn remove_overlays(&mut self) {
        println!("[surface] overlays removed");
    }
}

/// Tracker that prints calls instead of firing pixels
struct ConsoleTracker {
    duration: Option<f64>,
}

impl Tracker for ConsoleTracker {
    fn impression(&mut self) {
        println!("[tracking] impression");
    }

    fn asset_duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_asset_duration(&mut self, seconds: f64) {
        self.duration = Some(seconds);
        println!("[tracking] asset duration = {seconds}");
    }

    fn set_progress(&mut self, seconds: f64) {
        println!("[tracking] progress = {seconds}");
    }

    fn set_paused(&mut self, paused: bool) {
        println!("[tracking] paused = {paused}");
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        println!("[tracking] fullscreen = {fullscreen}");
    }

    fn set_muted(&mut self, muted: bool) {
        println!("[tracking] muted = {muted}");
    }

    fn click(&mut self) -> Option<String> {
        println!("[tracking] click");
        None
    }

    fn skip(&mut self) {
        println!("[tracking] skip");
    }

    fn complete(&mut self) {
        println!("[tracking] complete");
    }

    fn error_with_code(&mut self, code: &str) {
        println!("[tracking] error, code {code}");
    }
}
