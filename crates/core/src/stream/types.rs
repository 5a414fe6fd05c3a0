//! Request and result types for stream resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::debrid::DebridAccount;
use crate::selector::{LanguageFilter, ResolutionFilter};

/// Kind of content requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "movie" => Some(MediaKind::Movie),
            "series" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for malformed stream requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaRequestError {
    #[error("Unknown content type: {0}")]
    UnknownKind(String),

    #[error("Invalid content id: {0}")]
    InvalidId(String),
}

/// Routing identity of a stream request.
///
/// Movies are addressed by a bare id (`tt0133093`), episodes by
/// `id:season:episode` (`tt0903747:2:5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub content_id: String,
    pub kind: MediaKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl MediaRequest {
    pub fn parse(kind: &str, id: &str) -> Result<Self, MediaRequestError> {
        let kind =
            MediaKind::parse(kind).ok_or_else(|| MediaRequestError::UnknownKind(kind.to_string()))?;
        let invalid = || MediaRequestError::InvalidId(id.to_string());

        match kind {
            MediaKind::Movie => {
                if id.is_empty() || id.contains(':') {
                    return Err(invalid());
                }
                Ok(Self {
                    content_id: id.to_string(),
                    kind,
                    season: None,
                    episode: None,
                })
            }
            MediaKind::Series => {
                let mut parts = id.split(':');
                let (Some(content_id), Some(season), Some(episode), None) =
                    (parts.next(), parts.next(), parts.next(), parts.next())
                else {
                    return Err(invalid());
                };
                if content_id.is_empty() {
                    return Err(invalid());
                }
                Ok(Self {
                    content_id: content_id.to_string(),
                    kind,
                    season: Some(season.parse().map_err(|_| invalid())?),
                    episode: Some(episode.parse().map_err(|_| invalid())?),
                })
            }
        }
    }
}

/// What to search for, built once per request after the title lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    title: String,
    kind: MediaKind,
    season: Option<u32>,
    episode: Option<u32>,
}

impl MediaQuery {
    pub fn movie(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn series(title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            title: title.into(),
            kind: MediaKind::Series,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Build the query for a parsed request; `None` for a series request
    /// missing its season or episode.
    pub fn for_request(request: &MediaRequest, title: impl Into<String>) -> Option<Self> {
        match (request.kind, request.season, request.episode) {
            (MediaKind::Movie, _, _) => Some(Self::movie(title)),
            (MediaKind::Series, Some(season), Some(episode)) => {
                Some(Self::series(title, season, episode))
            }
            (MediaKind::Series, _, _) => None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn season(&self) -> Option<u32> {
        self.season
    }

    pub fn episode(&self) -> Option<u32> {
        self.episode
    }

    /// `(season, episode)` for series queries.
    pub fn season_episode(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }

    /// Free-text queries sent to the indexers: the title, plus the
    /// `SxxEyy` form for episodes.
    pub fn search_queries(&self) -> Vec<String> {
        let mut queries = vec![self.title.clone()];
        if let Some((season, episode)) = self.season_episode() {
            queries.push(format!("{} S{:02}E{:02}", self.title, season, episode));
        }
        queries
    }
}

/// Per-request preferences supplied by the caller.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub account: DebridAccount,
    pub indexers: Vec<String>,
    /// Maximum results to return, 0 for unlimited.
    pub max_results: usize,
    pub resolutions: ResolutionFilter,
    pub languages: LanguageFilter,
}

/// One playable stream as presented to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResult {
    pub name: String,
    pub title: String,
    pub url: String,
}
