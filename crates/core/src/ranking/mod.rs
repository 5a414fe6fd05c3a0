//! Release quality ranking.
//!
//! A `RankingOracle` turns a filename into a quality profile plus a score,
//! and defines the canonical order in which results are presented.

pub mod title_parser;
mod types;

pub use title_parser::{fold_diacritics, normalize_title, parse_title, title_match};
pub use types::*;

use crate::searcher::InfoHash;

/// Scores releases and orders them best first.
pub trait RankingOracle: Send + Sync {
    /// Parse and score one filename.
    fn rank(&self, filename: &str, info_hash: &InfoHash) -> Ranked;

    /// Order entries best first: resolution tier, then rank, then hash.
    fn sort(&self, mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
        sort_ranked(&mut entries);
        entries
    }
}

/// Canonical total order used everywhere results are presented.
pub fn sort_ranked(entries: &mut [RankedEntry]) {
    entries.sort_by(|a, b| {
        resolution_tier(b.profile.primary_resolution())
            .cmp(&resolution_tier(a.profile.primary_resolution()))
            .then(b.rank.cmp(&a.rank))
            .then(a.info_hash.cmp(&b.info_hash))
    });
}

/// Per-attribute weights of the built-in ranking model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingWeights {
    pub uhd: i64,
    pub fhd: i64,
    pub hd: i64,
    pub sd: i64,
    pub dolby_vision: i64,
    pub hdr: i64,
    pub hdr10: i64,
    pub dts_x: i64,
    pub dts_hd: i64,
    pub dts_hd_ma: i64,
    pub atmos: i64,
    pub truehd: i64,
    pub ddplus: i64,
    pub aac: i64,
    pub ac3: i64,
    pub remux: i64,
    pub bluray: i64,
    pub webdl: i64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            uhd: 100,
            fhd: 90,
            hd: 80,
            sd: 70,
            dolby_vision: 100,
            hdr: 80,
            hdr10: 90,
            dts_x: 100,
            dts_hd: 80,
            dts_hd_ma: 90,
            atmos: 90,
            truehd: 60,
            ddplus: 40,
            aac: 30,
            ac3: 20,
            remux: 150,
            bluray: 120,
            webdl: 90,
        }
    }
}

/// Additive ranking over parsed filename attributes.
#[derive(Debug, Clone, Default)]
pub struct WeightedRanker {
    weights: RankingWeights,
}

impl WeightedRanker {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// Score a parsed profile.
    pub fn score(&self, profile: &QualityProfile) -> i64 {
        let w = &self.weights;

        let resolution = match profile.primary_resolution() {
            Some("4320p" | "2880p" | "2160p") => w.uhd,
            Some("1440p" | "1080p") => w.fhd,
            Some("720p") => w.hd,
            Some("576p" | "480p" | "360p") => w.sd,
            _ => 0,
        };

        let hdr: i64 = profile
            .hdr
            .iter()
            .map(|h| match h.as_str() {
                "DV" => w.dolby_vision,
                "HDR10+" | "HDR10" => w.hdr10,
                "HDR" => w.hdr,
                _ => 0,
            })
            .sum();

        let audio: i64 = profile
            .audio
            .iter()
            .map(|a| match a.as_str() {
                "DTS:X" => w.dts_x,
                "DTS-HD MA" => w.dts_hd_ma,
                "DTS-HD" => w.dts_hd,
                "Atmos" => w.atmos,
                "TrueHD" => w.truehd,
                "DD+" => w.ddplus,
                "AAC" => w.aac,
                "AC3" => w.ac3,
                _ => 0,
            })
            .sum();

        let quality = match profile.quality.as_deref() {
            Some("REMUX") => w.remux,
            Some("BluRay") => w.bluray,
            Some("WEB-DL") => w.webdl,
            _ => 0,
        };

        resolution + hdr + audio + quality
    }
}

impl RankingOracle for WeightedRanker {
    fn rank(&self, filename: &str, info_hash: &InfoHash) -> Ranked {
        let profile = parse_title(filename);
        let rank = self.score(&profile);
        Ranked {
            info_hash: info_hash.clone(),
            profile,
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(c: char) -> InfoHash {
        InfoHash::parse(&c.to_string().repeat(40)).unwrap()
    }

    fn entry(c: char, resolution: Option<&str>, rank: i64) -> RankedEntry {
        RankedEntry {
            info_hash: hash(c),
            rank,
            profile: QualityProfile {
                resolution: resolution.map(|r| vec![r.to_string()]).unwrap_or_default(),
                ..Default::default()
            },
            filename: format!("{}.mkv", c),
            size_bytes: 1,
            file_index: 1,
        }
    }

    #[test]
    fn test_score_remux_uhd() {
        let ranker = WeightedRanker::default();
        let ranked = ranker.rank(
            "Movie.2020.2160p.BluRay.REMUX.DV.HDR10.TrueHD.Atmos.mkv",
            &hash('a'),
        );
        // uhd 100 + dv 100 + hdr10 90 + atmos 90 + truehd 60 + remux 150
        assert_eq!(ranked.rank, 590);
        assert_eq!(ranked.profile.resolution, vec!["2160p"]);
    }

    #[test]
    fn test_score_plain_webdl() {
        let ranker = WeightedRanker::default();
        let ranked = ranker.rank("Movie.2020.1080p.WEB-DL.AAC.mkv", &hash('b'));
        assert_eq!(ranked.rank, 90 + 90 + 30);
    }

    #[test]
    fn test_score_unknown_is_zero() {
        let ranker = WeightedRanker::default();
        assert_eq!(ranker.rank("home video.mkv", &hash('c')).rank, 0);
    }

    #[test]
    fn test_custom_weights() {
        let ranker = WeightedRanker::new(RankingWeights {
            fhd: 1,
            ..Default::default()
        });
        assert_eq!(ranker.rank("Movie.1080p.mkv", &hash('d')).rank, 1);
    }

    #[test]
    fn test_sort_total_order() {
        let ranker = WeightedRanker::default();
        let sorted = ranker.sort(vec![
            entry('1', Some("720p"), 500),
            entry('2', Some("2160p"), 100),
            entry('3', None, 900),
            entry('4', Some("2160p"), 300),
            entry('5', Some("2160p"), 300),
        ]);

        let order: Vec<_> = sorted.iter().map(|e| e.info_hash.as_str().chars().next().unwrap()).collect();
        assert_eq!(order, vec!['4', '5', '2', '1', '3']);
    }
}
