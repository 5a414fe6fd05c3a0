//! Playback link materialization.
//!
//! Turning a cached hash into a direct URL is a short sequence of debrid
//! calls. Each step is an explicit `PlaybackState` transition so the whole
//! walk can be driven and inspected one step at a time.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::searcher::InfoHash;

use super::{AddedTorrent, DebridAccount, DebridClient, DebridError, DebridSession, Egress};

/// Where a playback resolution currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    NotAdded,
    Added(AddedTorrent),
    FilesSelected(AddedTorrent),
    /// First hoster link of the torrent.
    LinksReady(String),
    /// Direct URL, ready to redirect to.
    Unrestricted(String),
    Failed(String),
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Unrestricted(_) | PlaybackState::Failed(_))
    }

    /// Perform the debrid call that moves this state forward.
    ///
    /// Terminal states are returned unchanged.
    pub async fn advance(
        self,
        client: &dyn DebridClient,
        session: &DebridSession,
        hash: &InfoHash,
        file_index: u32,
    ) -> PlaybackState {
        match self {
            PlaybackState::NotAdded => match client.add_magnet(session, hash).await {
                Ok(torrent) => PlaybackState::Added(torrent),
                Err(e) => failed("add magnet", e),
            },
            PlaybackState::Added(torrent) => {
                if let Err(e) = client.torrent_info(session, &torrent).await {
                    return failed("read torrent status", e);
                }
                match client.select_files(session, &torrent, file_index).await {
                    Ok(()) => PlaybackState::FilesSelected(torrent),
                    Err(e) => failed("select files", e),
                }
            }
            PlaybackState::FilesSelected(torrent) => {
                match client.torrent_info(session, &torrent).await {
                    Ok(info) => match info.links.into_iter().next() {
                        Some(link) => PlaybackState::LinksReady(link),
                        None => failed("read links", DebridError::NoLinks),
                    },
                    Err(e) => failed("read links", e),
                }
            }
            PlaybackState::LinksReady(link) => match client.unrestrict_link(session, &link).await {
                Ok(url) => PlaybackState::Unrestricted(url),
                Err(e) => failed("unrestrict link", e),
            },
            terminal => terminal,
        }
    }
}

fn failed(step: &str, error: DebridError) -> PlaybackState {
    PlaybackState::Failed(format!("{}: {}", step, error))
}

/// Resolves a (hash, file) pair into a direct URL, falling back to a fixed
/// URL when anything goes wrong.
pub struct PlaybackResolver {
    client: Arc<dyn DebridClient>,
    fallback_url: String,
}

impl PlaybackResolver {
    pub fn new(client: Arc<dyn DebridClient>, fallback_url: impl Into<String>) -> Self {
        Self {
            client,
            fallback_url: fallback_url.into(),
        }
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    /// Resolve a playback URL. Never fails.
    pub async fn resolve(&self, account: &DebridAccount, hash: &InfoHash, file_index: u32) -> String {
        let session = DebridSession {
            account: account.clone(),
            egress: self.choose_egress().await,
        };

        let mut state = PlaybackState::NotAdded;
        while !state.is_terminal() {
            state = state
                .advance(self.client.as_ref(), &session, hash, file_index)
                .await;
            debug!(info_hash = %hash, state = ?state, "Playback state advanced");
        }

        match state {
            PlaybackState::Unrestricted(url) => {
                metrics::PLAYBACK_RESOLUTIONS
                    .with_label_values(&["resolved"])
                    .inc();
                info!(info_hash = %hash, file_index, egress = ?session.egress, "Playback link resolved");
                url
            }
            other => {
                metrics::PLAYBACK_RESOLUTIONS
                    .with_label_values(&["fallback"])
                    .inc();
                let reason = match other {
                    PlaybackState::Failed(reason) => reason,
                    state => format!("stopped in {:?}", state),
                };
                warn!(info_hash = %hash, file_index, reason = %reason, "Playback resolution failed, using fallback");
                self.fallback_url.clone()
            }
        }
    }

    /// Route through the proxy only when the service blocks our IP and a
    /// proxy exists.
    async fn choose_egress(&self) -> Egress {
        if !self.client.proxy_configured() {
            return Egress::Direct;
        }

        match self.client.egress_blocked().await {
            Ok(true) => {
                info!("Debrid service blocks this IP, routing playback through proxy");
                Egress::Proxy
            }
            Ok(false) => Egress::Direct,
            Err(e) => {
                warn!(error = %e, "Blacklist probe failed, using direct route");
                Egress::Direct
            }
        }
    }
}
