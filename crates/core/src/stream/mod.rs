//! Stream request resolution.
//!
//! This module provides the request and result types, client-facing
//! formatting, and the `StreamPipeline` that ties the searcher, debrid,
//! ranking, cache and selector modules together.

pub mod format;
mod pipeline;
mod types;

pub use pipeline::{PipelineDeps, StreamPipeline};
pub use types::*;
