//! Real-Debrid REST client (API 1.0).

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, Proxy, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DebridConfig;
use crate::metrics;
use crate::searcher::InfoHash;

use super::{
    AddedTorrent, AvailabilityMap, AvailabilityRecord, AvailableFile, DebridAccount,
    DebridClient, DebridError, DebridService, DebridSession, Egress, TorrentInfo,
};

/// Text on the blacklist page when the service refuses this server's IP.
pub const BLOCKED_IP_MARKER: &str =
    "Your ISP or VPN provider IP address is currently blocked on our website";

/// Real-Debrid client.
///
/// Holds a direct HTTP client and, when configured, a second one routed
/// through the proxy.
pub struct RealDebridClient {
    direct: Client,
    proxied: Option<Client>,
    api_url: String,
    blacklist_url: String,
    batch_size: usize,
}

impl RealDebridClient {
    /// Create a new client from configuration.
    pub fn new(config: &DebridConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs as u64);
        let direct = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let proxied = config.proxy_url.as_deref().and_then(|url| {
            match Proxy::all(url).and_then(|proxy| Client::builder().timeout(timeout).proxy(proxy).build()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Invalid debrid proxy, proxy routing disabled");
                    None
                }
            }
        });

        Self {
            direct,
            proxied,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            blacklist_url: config.blacklist_url.clone(),
            batch_size: config.availability_batch_size.max(1),
        }
    }

    fn client_for(&self, egress: Egress) -> &Client {
        match (egress, &self.proxied) {
            (Egress::Proxy, Some(proxied)) => proxied,
            _ => &self.direct,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DebridError> {
        let response = request.send().await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(DebridError::Unauthorized);
        }
        if status == 429 {
            return Err(DebridError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DebridError::ApiError {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DebridError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| DebridError::ParseError(e.to_string()))
    }

    async fn availability_batch(
        &self,
        account: &DebridAccount,
        batch: &[InfoHash],
    ) -> Result<AvailabilityMap, DebridError> {
        let path = batch
            .iter()
            .map(InfoHash::as_str)
            .collect::<Vec<_>>()
            .join("/");
        let url = format!("{}/torrents/instantAvailability/{}", self.api_url, path);

        let body: Value = self
            .send_json(self.direct.get(&url).bearer_auth(&account.api_key))
            .await?;

        Ok(parse_availability(&body))
    }
}

/// Parse an instant-availability response.
///
/// Shape: `{hash: {"rd": [{index: {filename, filesize}}, ...]}}`. Anything
/// other than an object with a non-empty `rd` list means "not cached".
fn parse_availability(body: &Value) -> AvailabilityMap {
    let mut availability = HashMap::new();

    let Some(entries) = body.as_object() else {
        return availability;
    };

    for (raw_hash, details) in entries {
        let Some(hash) = InfoHash::parse(raw_hash) else {
            continue;
        };
        let Some(variants) = details.get("rd").and_then(Value::as_array) else {
            continue;
        };

        let mut record = AvailabilityRecord::new();
        for files in variants.iter().filter_map(Value::as_object) {
            for (index, file) in files {
                let Ok(index) = index.parse::<u32>() else {
                    continue;
                };
                let Some(filename) = file.get("filename").and_then(Value::as_str) else {
                    continue;
                };
                let size_bytes = file.get("filesize").and_then(Value::as_u64).unwrap_or(0);
                record.entry(index).or_insert_with(|| AvailableFile {
                    filename: filename.to_string(),
                    size_bytes,
                });
            }
        }

        if !record.is_empty() {
            availability.insert(hash, record);
        }
    }

    availability
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(rename = "type")]
    account_type: String,
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}

#[async_trait]
impl DebridClient for RealDebridClient {
    fn service(&self) -> DebridService {
        DebridService::RealDebrid
    }

    fn proxy_configured(&self) -> bool {
        self.proxied.is_some()
    }

    async fn check_premium(&self, account: &DebridAccount) -> Result<bool, DebridError> {
        let url = format!("{}/user", self.api_url);
        match self
            .send_json::<UserResponse>(self.direct.get(&url).bearer_auth(&account.api_key))
            .await
        {
            Ok(user) => Ok(user.account_type == "premium"),
            Err(DebridError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn instant_availability(
        &self,
        account: &DebridAccount,
        hashes: &[InfoHash],
    ) -> AvailabilityMap {
        let batches: Vec<&[InfoHash]> = hashes.chunks(self.batch_size).collect();
        debug!(
            hashes = hashes.len(),
            batches = batches.len(),
            "Checking Real-Debrid instant availability"
        );

        let results = join_all(
            batches
                .iter()
                .map(|batch| self.availability_batch(account, batch)),
        )
        .await;

        let mut availability = HashMap::new();
        for (batch, result) in batches.iter().zip(results) {
            match result {
                Ok(found) => {
                    metrics::AVAILABILITY_BATCHES
                        .with_label_values(&["success"])
                        .inc();
                    availability.extend(found);
                }
                Err(e) => {
                    metrics::AVAILABILITY_BATCHES
                        .with_label_values(&["error"])
                        .inc();
                    warn!(
                        hashes = batch.len(),
                        error = %e,
                        "Availability batch failed"
                    );
                }
            }
        }

        availability
    }

    async fn egress_blocked(&self) -> Result<bool, DebridError> {
        let page = self
            .direct
            .get(&self.blacklist_url)
            .send()
            .await?
            .text()
            .await?;
        Ok(page.contains(BLOCKED_IP_MARKER))
    }

    async fn add_magnet(
        &self,
        session: &DebridSession,
        hash: &InfoHash,
    ) -> Result<AddedTorrent, DebridError> {
        let url = format!("{}/torrents/addMagnet", self.api_url);
        let magnet = hash.magnet_uri();
        self.send_json(
            self.client_for(session.egress)
                .post(&url)
                .bearer_auth(&session.account.api_key)
                .form(&[("magnet", magnet.as_str())]),
        )
        .await
    }

    async fn torrent_info(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
    ) -> Result<TorrentInfo, DebridError> {
        self.send_json(
            self.client_for(session.egress)
                .get(&torrent.uri)
                .bearer_auth(&session.account.api_key),
        )
        .await
    }

    async fn select_files(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
        file_index: u32,
    ) -> Result<(), DebridError> {
        let url = format!("{}/torrents/selectFiles/{}", self.api_url, torrent.id);
        let files = file_index.to_string();
        self.send(
            self.client_for(session.egress)
                .post(&url)
                .bearer_auth(&session.account.api_key)
                .form(&[("files", files.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn unrestrict_link(
        &self,
        session: &DebridSession,
        link: &str,
    ) -> Result<String, DebridError> {
        let url = format!("{}/unrestrict/link", self.api_url);
        let response: UnrestrictResponse = self
            .send_json(
                self.client_for(session.egress)
                    .post(&url)
                    .bearer_auth(&session.account.api_key)
                    .form(&[("link", link)]),
            )
            .await?;
        Ok(response.download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::http::spawn_server;
    use axum::{
        extract::{Path, State},
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Form, Json, Router,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hash(c: char) -> InfoHash {
        InfoHash::parse(&c.to_string().repeat(40)).unwrap()
    }

    fn account(key: &str) -> DebridAccount {
        DebridAccount {
            service: DebridService::RealDebrid,
            api_key: key.to_string(),
        }
    }

    fn client(base: &str, batch_size: usize) -> RealDebridClient {
        RealDebridClient::new(&DebridConfig {
            api_url: base.to_string(),
            blacklist_url: format!("{}/vpn", base),
            availability_batch_size: batch_size,
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_availability() {
        let body = json!({
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa": {
                "rd": [
                    {"1": {"filename": "Movie.1080p.mkv", "filesize": 1400000000u64}},
                    {"1": {"filename": "dupe.mkv", "filesize": 1}, "2": {"filename": "sample.mkv", "filesize": 10}}
                ]
            },
            "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB": [],
            "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC": {"rd": []},
            "not-a-hash": {"rd": [{"1": {"filename": "x.mkv", "filesize": 1}}]}
        });

        let availability = parse_availability(&body);
        assert_eq!(availability.len(), 1);

        let record = &availability[&hash('A')];
        assert_eq!(record.len(), 2);
        assert_eq!(record[&1].filename, "Movie.1080p.mkv");
        assert_eq!(record[&1].size_bytes, 1_400_000_000);
        assert_eq!(record[&2].filename, "sample.mkv");
    }

    #[test]
    fn test_parse_availability_non_object() {
        assert!(parse_availability(&json!([])).is_empty());
        assert!(parse_availability(&json!("error")).is_empty());
    }

    #[tokio::test]
    async fn test_check_premium() {
        let app = Router::new().route(
            "/user",
            get(|headers: HeaderMap| async move {
                match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
                    Some("Bearer premium-key") => Json(json!({"type": "premium"})).into_response(),
                    Some("Bearer free-key") => Json(json!({"type": "free"})).into_response(),
                    _ => StatusCode::UNAUTHORIZED.into_response(),
                }
            }),
        );
        let base = spawn_server(app).await;
        let rd = client(&base, 50);

        assert!(rd.check_premium(&account("premium-key")).await.unwrap());
        assert!(!rd.check_premium(&account("free-key")).await.unwrap());
        assert!(!rd.check_premium(&account("bad-key")).await.unwrap());
    }

    #[tokio::test]
    async fn test_instant_availability_batches_and_tolerates_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/torrents/instantAvailability/{*hashes}",
                get(
                    |State(calls): State<Arc<AtomicUsize>>, Path(hashes): Path<String>| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        if hashes.contains(&"C".repeat(40)) {
                            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                        }
                        let body: serde_json::Map<String, Value> = hashes
                            .split('/')
                            .map(|h| {
                                (
                                    h.to_lowercase(),
                                    json!({"rd": [{"0": {"filename": format!("{}.mkv", &h[..4]), "filesize": 5}}]}),
                                )
                            })
                            .collect();
                        Json(Value::Object(body)).into_response()
                    },
                ),
            )
            .with_state(calls.clone());
        let base = spawn_server(app).await;
        let rd = client(&base, 2);

        let hashes = vec![hash('A'), hash('B'), hash('C')];
        let availability = rd.instant_availability(&account("k"), &hashes).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(availability.len(), 2);
        assert!(availability.contains_key(&hash('A')));
        assert!(availability.contains_key(&hash('B')));
        assert!(!availability.contains_key(&hash('C')));
    }

    #[tokio::test]
    async fn test_egress_blocked() {
        let app = Router::new().route(
            "/vpn",
            get(|| async { format!("<html><p>{}</p></html>", BLOCKED_IP_MARKER) }),
        );
        let base = spawn_server(app).await;
        assert!(client(&base, 50).egress_blocked().await.unwrap());

        let app = Router::new().route("/vpn", get(|| async { "<html>all good</html>" }));
        let base = spawn_server(app).await;
        assert!(!client(&base, 50).egress_blocked().await.unwrap());
    }

    #[derive(Deserialize)]
    struct MagnetForm {
        magnet: String,
    }

    #[derive(Deserialize)]
    struct FilesForm {
        files: String,
    }

    #[derive(Deserialize)]
    struct LinkForm {
        link: String,
    }

    #[tokio::test]
    async fn test_playback_endpoints() {
        let app = Router::new()
            .route(
                "/torrents/addMagnet",
                post(|headers: HeaderMap, Form(form): Form<MagnetForm>| async move {
                    assert!(form.magnet.starts_with("magnet:?xt=urn:btih:"));
                    let host = headers.get(header::HOST).unwrap().to_str().unwrap().to_string();
                    (
                        StatusCode::CREATED,
                        Json(json!({"id": "T1", "uri": format!("http://{}/torrents/info/T1", host)})),
                    )
                }),
            )
            .route(
                "/torrents/info/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"id": id, "status": "downloaded", "links": ["https://rd/d/ABC"]}))
                }),
            )
            .route(
                "/torrents/selectFiles/{id}",
                post(|Path(id): Path<String>, Form(form): Form<FilesForm>| async move {
                    assert_eq!(id, "T1");
                    assert_eq!(form.files, "3");
                    StatusCode::NO_CONTENT
                }),
            )
            .route(
                "/unrestrict/link",
                post(|Form(form): Form<LinkForm>| async move {
                    Json(json!({"download": format!("https://cdn/{}", form.link.rsplit('/').next().unwrap())}))
                }),
            );
        let base = spawn_server(app).await;
        let rd = client(&base, 50);
        let session = DebridSession {
            account: account("k"),
            egress: Egress::Direct,
        };

        let added = rd.add_magnet(&session, &hash('A')).await.unwrap();
        assert_eq!(added.id, "T1");

        let info = rd.torrent_info(&session, &added).await.unwrap();
        assert_eq!(info.links, vec!["https://rd/d/ABC"]);

        rd.select_files(&session, &added, 3).await.unwrap();

        let url = rd.unrestrict_link(&session, &info.links[0]).await.unwrap();
        assert_eq!(url, "https://cdn/ABC");
    }

    #[test]
    fn test_invalid_proxy_disables_proxy_route() {
        let rd = RealDebridClient::new(&DebridConfig {
            proxy_url: Some("not a url".to_string()),
            ..Default::default()
        });
        assert!(!rd.proxy_configured());

        let rd = RealDebridClient::new(&DebridConfig {
            proxy_url: Some("http://127.0.0.1:1080".to_string()),
            ..Default::default()
        });
        assert!(rd.proxy_configured());
    }
}
