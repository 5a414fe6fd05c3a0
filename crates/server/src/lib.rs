//! HTTP add-on server for the nimbus stream resolver.

pub mod api;
pub mod metrics;
pub mod request_config;
pub mod state;
