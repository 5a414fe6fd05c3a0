//! Mock debrid client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{
    AddedTorrent, AvailabilityMap, AvailabilityRecord, DebridAccount, DebridClient, DebridError,
    DebridService, DebridSession, Egress, TorrentInfo,
};
use crate::searcher::InfoHash;

/// A recorded debrid call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebridCall {
    CheckPremium,
    InstantAvailability(Vec<InfoHash>),
    EgressProbe,
    AddMagnet {
        info_hash: InfoHash,
        egress: Egress,
    },
    TorrentInfo {
        torrent_id: String,
        egress: Egress,
    },
    SelectFiles {
        torrent_id: String,
        file_index: u32,
        egress: Egress,
    },
    Unrestrict {
        link: String,
        egress: Egress,
    },
}

impl DebridCall {
    /// Route used by a playback call, `None` for account-level calls.
    pub fn egress(&self) -> Option<Egress> {
        match self {
            DebridCall::AddMagnet { egress, .. }
            | DebridCall::TorrentInfo { egress, .. }
            | DebridCall::SelectFiles { egress, .. }
            | DebridCall::Unrestrict { egress, .. } => Some(*egress),
            _ => None,
        }
    }
}

/// A debrid call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebridStep {
    CheckPremium,
    AddMagnet,
    TorrentInfo,
    SelectFiles,
    Unrestrict,
}

/// Mock implementation of the DebridClient trait.
///
/// Accounts are premium, nothing is cached and every playback step succeeds
/// until configured otherwise.
#[derive(Debug)]
pub struct MockDebrid {
    calls: Arc<RwLock<Vec<DebridCall>>>,
    premium: Arc<RwLock<bool>>,
    availability: Arc<RwLock<AvailabilityMap>>,
    blocked: Arc<RwLock<bool>>,
    links: Arc<RwLock<Vec<String>>>,
    download_url: Arc<RwLock<String>>,
    failing: Arc<RwLock<Option<DebridStep>>>,
    torrent_counter: Arc<RwLock<u32>>,
    proxy: bool,
}

impl Default for MockDebrid {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebrid {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            premium: Arc::new(RwLock::new(true)),
            availability: Arc::new(RwLock::new(HashMap::new())),
            blocked: Arc::new(RwLock::new(false)),
            links: Arc::new(RwLock::new(vec!["https://mock-debrid/d/LINK".to_string()])),
            download_url: Arc::new(RwLock::new(
                "https://mock-debrid/download/file.mkv".to_string(),
            )),
            failing: Arc::new(RwLock::new(None)),
            torrent_counter: Arc::new(RwLock::new(0)),
            proxy: false,
        }
    }

    /// Create a mock that reports a configured proxy.
    pub fn with_proxy() -> Self {
        Self {
            proxy: true,
            ..Self::new()
        }
    }

    /// Get all recorded calls, in order.
    pub async fn calls(&self) -> Vec<DebridCall> {
        self.calls.read().await.clone()
    }

    /// Number of availability requests made.
    pub async fn availability_calls(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, DebridCall::InstantAvailability(_)))
            .count()
    }

    pub async fn set_premium(&self, premium: bool) {
        *self.premium.write().await = premium;
    }

    /// Mark a hash as instantly available with the given files.
    pub async fn set_available(&self, hash: InfoHash, record: AvailabilityRecord) {
        self.availability.write().await.insert(hash, record);
    }

    pub async fn set_blocked(&self, blocked: bool) {
        *self.blocked.write().await = blocked;
    }

    pub async fn set_links(&self, links: Vec<String>) {
        *self.links.write().await = links;
    }

    pub async fn set_download_url(&self, url: impl Into<String>) {
        *self.download_url.write().await = url.into();
    }

    /// Make every call of the given kind fail.
    pub async fn fail_at(&self, step: DebridStep) {
        *self.failing.write().await = Some(step);
    }

    async fn record(&self, call: DebridCall) {
        self.calls.write().await.push(call);
    }

    async fn check(&self, step: DebridStep) -> Result<(), DebridError> {
        if *self.failing.read().await == Some(step) {
            return Err(DebridError::ApiError {
                status: 503,
                message: format!("mock failure at {:?}", step),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DebridClient for MockDebrid {
    fn service(&self) -> DebridService {
        DebridService::RealDebrid
    }

    fn proxy_configured(&self) -> bool {
        self.proxy
    }

    async fn check_premium(&self, _account: &DebridAccount) -> Result<bool, DebridError> {
        self.record(DebridCall::CheckPremium).await;
        self.check(DebridStep::CheckPremium).await?;
        Ok(*self.premium.read().await)
    }

    async fn instant_availability(
        &self,
        _account: &DebridAccount,
        hashes: &[InfoHash],
    ) -> AvailabilityMap {
        self.record(DebridCall::InstantAvailability(hashes.to_vec()))
            .await;
        let availability = self.availability.read().await;
        hashes
            .iter()
            .filter_map(|h| availability.get(h).map(|r| (h.clone(), r.clone())))
            .collect()
    }

    async fn egress_blocked(&self) -> Result<bool, DebridError> {
        self.record(DebridCall::EgressProbe).await;
        Ok(*self.blocked.read().await)
    }

    async fn add_magnet(
        &self,
        session: &DebridSession,
        hash: &InfoHash,
    ) -> Result<AddedTorrent, DebridError> {
        self.record(DebridCall::AddMagnet {
            info_hash: hash.clone(),
            egress: session.egress,
        })
        .await;
        self.check(DebridStep::AddMagnet).await?;

        let mut counter = self.torrent_counter.write().await;
        *counter += 1;
        let id = format!("mock-{}", *counter);
        Ok(AddedTorrent {
            uri: format!("https://mock-debrid/torrents/info/{}", id),
            id,
        })
    }

    async fn torrent_info(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
    ) -> Result<TorrentInfo, DebridError> {
        self.record(DebridCall::TorrentInfo {
            torrent_id: torrent.id.clone(),
            egress: session.egress,
        })
        .await;
        self.check(DebridStep::TorrentInfo).await?;
        Ok(TorrentInfo {
            status: Some("downloaded".to_string()),
            links: self.links.read().await.clone(),
        })
    }

    async fn select_files(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
        file_index: u32,
    ) -> Result<(), DebridError> {
        self.record(DebridCall::SelectFiles {
            torrent_id: torrent.id.clone(),
            file_index,
            egress: session.egress,
        })
        .await;
        self.check(DebridStep::SelectFiles).await
    }

    async fn unrestrict_link(
        &self,
        session: &DebridSession,
        link: &str,
    ) -> Result<String, DebridError> {
        self.record(DebridCall::Unrestrict {
            link: link.to_string(),
            egress: session.egress,
        })
        .await;
        self.check(DebridStep::Unrestrict).await?;
        Ok(self.download_url.read().await.clone())
    }
}
