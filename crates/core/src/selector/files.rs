//! Per-torrent file selection.

use crate::debrid::{AvailabilityMap, AvailabilityRecord};
use crate::ranking::parse_title;
use crate::searcher::InfoHash;

/// Extensions treated as playable video.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "amv", "asf", "avi", "drc", "f4a", "f4b", "f4p", "f4v", "flv", "gifv", "m2ts",
    "m2v", "m4p", "m4v", "mkv", "mov", "mp2", "mp4", "mpe", "mpeg", "mpg", "mpv", "mng", "mts",
    "mxf", "nsv", "ogg", "ogv", "qt", "rm", "rmvb", "roq", "svi", "ts", "vob", "webm", "wmv",
    "yuv",
];

/// Whether a filename has a known video extension (case-insensitive).
pub fn is_video(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// The one file of a torrent that will be offered for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_index: u32,
    pub filename: String,
    pub size_bytes: u64,
}

/// Pick the playable file of one availability record.
///
/// Files are visited in index order and the first match wins. For an
/// episode request the parsed filename must list both the season and the
/// episode.
pub fn select_file(record: &AvailabilityRecord, episode: Option<(u32, u32)>) -> Option<SelectedFile> {
    record
        .iter()
        .filter(|(_, file)| is_video(&file.filename))
        .find(|(_, file)| match episode {
            Some((season, episode)) => {
                let parsed = parse_title(&file.filename);
                parsed.seasons.contains(&season) && parsed.episodes.contains(&episode)
            }
            None => true,
        })
        .map(|(index, file)| SelectedFile {
            file_index: *index,
            filename: file.filename.clone(),
            size_bytes: file.size_bytes,
        })
}

/// Select one file per available hash, dropping hashes with no match.
///
/// Output is ordered by hash.
pub fn select_files(
    availability: &AvailabilityMap,
    episode: Option<(u32, u32)>,
) -> Vec<(InfoHash, SelectedFile)> {
    let mut selected: Vec<(InfoHash, SelectedFile)> = availability
        .iter()
        .filter_map(|(hash, record)| select_file(record, episode).map(|file| (hash.clone(), file)))
        .collect();
    selected.sort_by(|a, b| a.0.cmp(&b.0));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debrid::AvailableFile;

    fn record(files: &[(u32, &str, u64)]) -> AvailabilityRecord {
        files
            .iter()
            .map(|(index, name, size)| {
                (
                    *index,
                    AvailableFile {
                        filename: name.to_string(),
                        size_bytes: *size,
                    },
                )
            })
            .collect()
    }

    fn hash(c: char) -> InfoHash {
        InfoHash::parse(&c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn test_is_video() {
        assert!(is_video("Movie.2020.1080p.mkv"));
        assert!(is_video("MOVIE.MP4"));
        assert!(!is_video("Movie.nfo"));
        assert!(!is_video("sample.srt"));
        assert!(!is_video("mkv"));
        assert!(!is_video(".mkv"));
    }

    #[test]
    fn test_movie_takes_first_video() {
        let record = record(&[
            (1, "Movie.nfo", 10),
            (2, "Movie.1080p.mkv", 1_400_000_000),
            (3, "Movie.Sample.mkv", 50_000_000),
        ]);

        let selected = select_file(&record, None).unwrap();
        assert_eq!(selected.file_index, 2);
        assert_eq!(selected.filename, "Movie.1080p.mkv");
        assert_eq!(selected.size_bytes, 1_400_000_000);
    }

    #[test]
    fn test_episode_requires_season_and_episode() {
        let record = record(&[
            (1, "Show.S02E04.1080p.mkv", 1),
            (2, "Show.S02E05.1080p.mkv", 2),
            (3, "Show.S03E05.1080p.mkv", 3),
        ]);

        let selected = select_file(&record, Some((2, 5))).unwrap();
        assert_eq!(selected.file_index, 2);

        assert!(select_file(&record, Some((4, 1))).is_none());
    }

    #[test]
    fn test_no_video_drops_hash() {
        let mut availability = AvailabilityMap::new();
        availability.insert(hash('B'), record(&[(1, "Movie.1080p.mkv", 5)]));
        availability.insert(hash('A'), record(&[(0, "Movie.720p.mp4", 3)]));
        availability.insert(hash('C'), record(&[(0, "readme.txt", 1)]));

        let selected = select_files(&availability, None);
        let hashes: Vec<_> = selected.iter().map(|(h, _)| h.clone()).collect();
        assert_eq!(hashes, vec![hash('A'), hash('B')]);
    }
}
