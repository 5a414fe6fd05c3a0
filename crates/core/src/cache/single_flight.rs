//! Per-key request coalescing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

type InFlight<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

/// Tracks which keys currently have a leader doing the work.
pub struct SingleFlight<T> {
    inflight: InFlight<T>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            inflight: self.inflight.clone(),
        }
    }
}

/// Role assigned by [`SingleFlight::join`].
pub enum Flight<T> {
    /// Do the work and publish it with [`FlightGuard::complete`].
    Leader(FlightGuard<T>),
    /// Someone else is doing the work.
    Follower(FlightWaiter<T>),
}

/// Held by the leader for the duration of its run.
///
/// Dropping it (normally, on panic or on cancellation) removes the key and
/// wakes every follower. Followers of a guard dropped without
/// [`complete`](FlightGuard::complete) get nothing.
pub struct FlightGuard<T> {
    key: String,
    inflight: InFlight<T>,
    done: watch::Sender<Option<T>>,
}

impl<T> FlightGuard<T> {
    /// Hand `value` to every follower and release the key.
    pub fn complete(self, value: T) {
        self.done.send_replace(Some(value));
    }
}

impl<T> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.remove(&self.key);
        }
    }
}

pub struct FlightWaiter<T> {
    done: watch::Receiver<Option<T>>,
}

impl<T: Clone> FlightWaiter<T> {
    /// Wait for the leader. `None` means it went away without a result.
    pub async fn wait(mut self) -> Option<T> {
        loop {
            if let Some(value) = self.done.borrow_and_update().clone() {
                return Some(value);
            }
            if self.done.changed().await.is_err() {
                return self.done.borrow().clone();
            }
        }
    }
}

impl<T> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the leader for `key`, or a follower of the current leader.
    pub fn join(&self, key: &str) -> Flight<T> {
        let mut inflight = self.inflight.lock().unwrap();

        if let Some(done) = inflight.get(key) {
            return Flight::Follower(FlightWaiter { done: done.clone() });
        }

        let (tx, rx) = watch::channel(None);
        inflight.insert(key.to_string(), rx);
        Flight::Leader(FlightGuard {
            key: key.to_string(),
            inflight: self.inflight.clone(),
            done: tx,
        })
    }

    /// Number of keys with an active leader.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().map(|m| m.len()).unwrap_or(0)
    }
}
