//! Sector-grid spatial and collision core for PS1-era 3D action-adventure
//! engines:
//! - Rooms of 1024-unit sectors linked by wall/pit/sky portals
//! - Integer heights (y-down) with packed per-surface tilts
//! - Multi-sample collision probe with directional classification
//! - Static mesh push-out, movable-block terrain edits, flip-maps
//!
//! The crate is the simulation substrate only: rendering, audio, input,
//! asset parsing and the character state machine live elsewhere and talk
//! to this core through `world` and `game`.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod game;
pub mod math;
pub mod world;
