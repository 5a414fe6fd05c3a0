//! Debrid service integration.
//!
//! This module provides a `DebridClient` trait for cache-availability checks
//! and playback link materialization, with a Real-Debrid implementation.

mod playback;
mod realdebrid;
mod types;

pub use playback::{PlaybackResolver, PlaybackState};
pub use realdebrid::{RealDebridClient, BLOCKED_IP_MARKER};
pub use types::*;
