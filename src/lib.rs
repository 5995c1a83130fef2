//! In-stream VAST advertising for web media players.
//!
//! Given a VAST ad response, this crate selects a playable creative, splices
//! it into the host player's timeline through a capability-restricted
//! [`player::PlayerHandle`], drives the VAST tracking contract while it
//! plays, and restores the player afterwards. The core is the
//! [`session::AdSession`] state machine; the ad server client, tracker,
//! overlay surface, and VPAID delegate are collaborators behind traits.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod player;
pub mod select;
pub mod session;
pub mod surface;
pub mod tracking;
pub mod vpaid;

pub use client::{FetchOptions, HttpVastClient, VastClient};
pub use config::{CompanionConfig, PluginConfig, VpaidConfig};
pub use error::{AdError, Result};
pub use session::{AdSession, PrerollStart, SessionState};
