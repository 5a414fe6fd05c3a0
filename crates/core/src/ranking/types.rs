//! Types for release quality ranking.

use serde::{Deserialize, Serialize};

use crate::searcher::InfoHash;

/// Quality attributes parsed from a release filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Title portion of the filename, separators replaced by spaces.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Normalized resolutions ("2160p", "1080p", ...), best first.
    #[serde(default)]
    pub resolution: Vec<String>,
    /// Source quality ("REMUX", "BluRay", "WEB-DL", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default)]
    pub audio: Vec<String>,
    #[serde(default)]
    pub hdr: Vec<String>,
    /// Lowercase language names ("english", "french", ...).
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub is_multi_audio: bool,
    #[serde(default)]
    pub seasons: Vec<u32>,
    #[serde(default)]
    pub episodes: Vec<u32>,
}

impl QualityProfile {
    /// Bucket key used for balanced selection and stream labels.
    pub fn primary_resolution(&self) -> Option<&str> {
        self.resolution.first().map(String::as_str)
    }
}

/// Output of a ranking oracle for one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub info_hash: InfoHash,
    pub profile: QualityProfile,
    pub rank: i64,
}

/// A ranked, instantly available file. This is the value persisted in the
/// result cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub info_hash: InfoHash,
    pub rank: i64,
    pub profile: QualityProfile,
    pub filename: String,
    pub size_bytes: u64,
    pub file_index: u32,
}

impl RankedEntry {
    /// Resolution bucket name, `Unknown` when the filename carried none.
    pub fn resolution_label(&self) -> &str {
        self.profile.primary_resolution().unwrap_or(UNKNOWN_RESOLUTION)
    }
}

/// Label for entries without a parsed resolution.
pub const UNKNOWN_RESOLUTION: &str = "Unknown";

/// Ordering tier of a resolution; higher is better, 0 for unknown.
pub fn resolution_tier(resolution: Option<&str>) -> u8 {
    match resolution {
        Some("4320p") => 9,
        Some("2880p") => 8,
        Some("2160p") => 7,
        Some("1440p") => 6,
        Some("1080p") => 5,
        Some("720p") => 4,
        Some("576p") => 3,
        Some("480p") => 2,
        Some("360p") => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tier_ordering() {
        assert!(resolution_tier(Some("2160p")) > resolution_tier(Some("1080p")));
        assert!(resolution_tier(Some("1080p")) > resolution_tier(Some("720p")));
        assert!(resolution_tier(Some("480p")) > resolution_tier(None));
        assert_eq!(resolution_tier(Some("weird")), 0);
    }

    #[test]
    fn test_resolution_label_unknown() {
        let entry = RankedEntry {
            info_hash: InfoHash::parse(&"A".repeat(40)).unwrap(),
            rank: 0,
            profile: QualityProfile::default(),
            filename: "file.mkv".to_string(),
            size_bytes: 1,
            file_index: 1,
        };
        assert_eq!(entry.resolution_label(), "Unknown");
    }

    #[test]
    fn test_ranked_entry_json_shape() {
        let entry = RankedEntry {
            info_hash: InfoHash::parse(&"b".repeat(40)).unwrap(),
            rank: 210,
            profile: QualityProfile {
                resolution: vec!["1080p".to_string()],
                ..Default::default()
            },
            filename: "Movie.1080p.mkv".to_string(),
            size_bytes: 1_400_000_000,
            file_index: 2,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["info_hash"], "B".repeat(40));
        assert_eq!(value["profile"]["resolution"][0], "1080p");
        assert!(value["profile"].get("codec").is_none());
    }
}
