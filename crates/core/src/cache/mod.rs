//! TTL-bounded cache of ranked result sets.
//!
//! This module provides a `ResultCache` trait keyed by request fingerprint,
//! a SQLite implementation, and a `SingleFlight` map that lets concurrent
//! misses for the same fingerprint share one upstream run.

mod single_flight;
mod sqlite;
mod types;

pub use single_flight::{Flight, FlightGuard, FlightWaiter, SingleFlight};
pub use sqlite::SqliteResultCache;
pub use types::*;
