//! Filename parser for scene-style release names.
//!
//! Parses names like:
//! - "The.Movie.2020.2160p.UHD.BluRay.REMUX.HDR.HEVC.Atmos-GRP.mkv"
//! - "Some Show S02E05 1080p WEB-DL DDP5.1 H.264-GRP"
//! - "Some.Show.S01-S03.720p.MULTI.x265"

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::selector::files::is_video;

use super::QualityProfile;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(4320p|2880p|2160p|1440p|1080[pi]|720p|576p|480p|360p|4k|uhd)\b")
});
static DIMENSIONS: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b\d{3,4}x(\d{3,4})\b"));
static YEAR: Lazy<Regex> = Lazy::new(|| re(r"\b(19\d{2}|20\d{2})\b"));

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\bS(\d{1,2})[ .]?E(\d{1,3})(?:(?:-E?|E)(\d{1,3}))?\b"));
static CROSS_EPISODE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,2})x(\d{2,3})\b"));
static SEASON_PACK: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\bS(\d{1,2})(?:[ .]?-[ .]?S?(\d{1,2}))?\b"));
static SEASON_WORD: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\bseasons?[ ._-]?(\d{1,2})(?:[ ._-]?(?:-|to)[ ._-]?(\d{1,2}))?\b")
});
static EPISODE_WORD: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(?:episode|ep|e)[ ._-]?(\d{1,3})\b"));

static LEADING_GROUP: Lazy<Regex> = Lazy::new(|| re(r"^\s*\[[^\]]*\]\s*"));
static MULTI_AUDIO: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(?:multi|dual[ .-]?audio)\b"));

static QUALITIES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("REMUX", re(r"(?i)\bremux\b")),
        ("BluRay", re(r"(?i)\b(?:blu[ .-]?ray|bd[ .-]?rip|br[ .-]?rip)\b")),
        ("WEB-DL", re(r"(?i)\bweb[ .-]?dl\b")),
        ("WEBRip", re(r"(?i)\bweb[ .-]?rip\b")),
        ("WEB", re(r"(?i)\bweb\b")),
        ("HDTV", re(r"(?i)\bhdtv\b")),
        ("DVDRip", re(r"(?i)\bdvd[ .-]?rip\b")),
    ]
});

static CODECS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("hevc", re(r"(?i)\b(?:x265|h[ .]?265|hevc)\b")),
        ("avc", re(r"(?i)\b(?:x264|h[ .]?264|avc)\b")),
        ("av1", re(r"(?i)\bav1\b")),
        ("xvid", re(r"(?i)\bxvid\b")),
    ]
});

static HDR: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("DV", re(r"(?i)\b(?:dolby[ .]?vision|dovi|dv)\b")),
        ("HDR10+", re(r"(?i)\bhdr10(?:\+|plus)")),
        ("HDR10", re(r"(?i)\bhdr10\b")),
        ("HDR", re(r"(?i)\bhdr\b")),
    ]
});

static AUDIO: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("DTS:X", re(r"(?i)\bdts[ .:-]?x\b")),
        ("DTS-HD MA", re(r"(?i)\bdts[ .-]?hd[ .-]?ma\b")),
        ("DTS-HD", re(r"(?i)\bdts[ .-]?hd\b")),
        ("Atmos", re(r"(?i)\batmos\b")),
        ("TrueHD", re(r"(?i)\btrue[ .-]?hd\b")),
        ("DD+", re(r"(?i)\b(?:ddp|dd\+|e-?ac-?3)")),
        ("AAC", re(r"(?i)\baac")),
        ("AC3", re(r"(?i)\b(?:ac-?3|dd[257])")),
    ]
});

static LANGUAGES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("english", re(r"(?i)\b(?:english|eng)\b")),
        ("french", re(r"(?i)\b(?:french|truefrench|vff|vfq|vf2?)\b")),
        ("spanish", re(r"(?i)\b(?:spanish|castellano|espanol|esp|latino)\b")),
        ("italian", re(r"(?i)\b(?:italian|ita)\b")),
        ("german", re(r"(?i)\b(?:german|ger|deutsch)\b")),
        ("portuguese", re(r"(?i)\b(?:portuguese|por|dublado)\b")),
        ("russian", re(r"(?i)\b(?:russian|rus)\b")),
        ("japanese", re(r"(?i)\b(?:japanese|jap|jpn)\b")),
        ("korean", re(r"(?i)\b(?:korean|kor)\b")),
        ("chinese", re(r"(?i)\b(?:chinese|chi|mandarin)\b")),
        ("hindi", re(r"(?i)\b(?:hindi|hin)\b")),
    ]
});

/// Minimum normalized similarity for two titles to be considered the same.
const TITLE_MATCH_THRESHOLD: f64 = 0.85;

/// Parse a release filename into its quality profile.
pub fn parse_title(raw: &str) -> QualityProfile {
    let name = strip_video_extension(raw.trim());
    let name = match LEADING_GROUP.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    };

    let mut profile = QualityProfile::default();
    // Earliest position of any release marker; the title ends there.
    let mut markers: Vec<usize> = Vec::new();

    for caps in RESOLUTION.captures_iter(name) {
        let m = caps.get(0).unwrap();
        markers.push(m.start());
        push_unique(&mut profile.resolution, normalize_resolution(&caps[1]));
    }
    for caps in DIMENSIONS.captures_iter(name) {
        if let Some(resolution) = caps[1].parse().ok().and_then(height_to_resolution) {
            markers.push(caps.get(0).unwrap().start());
            push_unique(&mut profile.resolution, resolution.to_string());
        }
    }

    if let Some(m) = YEAR.find_iter(name).find(|m| m.start() > 0) {
        markers.push(m.start());
        profile.year = m.as_str().parse().ok();
    }

    parse_seasons_and_episodes(name, &mut profile, &mut markers);

    profile.quality = first_match(&QUALITIES, name, &mut markers);
    profile.codec = first_match(&CODECS, name, &mut markers);

    for (label, pattern) in HDR.iter() {
        if *label == "HDR10" && profile.hdr.iter().any(|h| h == "HDR10+") {
            continue;
        }
        if let Some(m) = pattern.find(name) {
            markers.push(m.start());
            profile.hdr.push(label.to_string());
        }
    }

    for (label, pattern) in AUDIO.iter() {
        let skip = match *label {
            "DTS-HD" => profile.audio.iter().any(|a| a == "DTS-HD MA"),
            "AC3" => profile.audio.iter().any(|a| a == "DD+"),
            _ => false,
        };
        if skip {
            continue;
        }
        if let Some(m) = pattern.find(name) {
            markers.push(m.start());
            profile.audio.push(label.to_string());
        }
    }

    if let Some(m) = MULTI_AUDIO.find(name) {
        markers.push(m.start());
        profile.is_multi_audio = true;
    }

    let cut = markers
        .into_iter()
        .filter(|&pos| pos > 0)
        .min()
        .unwrap_or(name.len());

    // Languages are only looked for after the title so that words like
    // "English" in a movie name do not count.
    let tail = &name[cut..];
    for (language, pattern) in LANGUAGES.iter() {
        if pattern.is_match(tail) {
            profile.languages.push(language.to_string());
        }
    }

    profile.title = clean_title(&name[..cut]);
    profile
}

fn parse_seasons_and_episodes(name: &str, profile: &mut QualityProfile, markers: &mut Vec<usize>) {
    for caps in SEASON_EPISODE.captures_iter(name) {
        markers.push(caps.get(0).unwrap().start());
        if let Some(season) = caps[1].parse().ok() {
            push_unique(&mut profile.seasons, season);
        }
        let first: Option<u32> = caps[2].parse().ok();
        let last: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());
        push_range(&mut profile.episodes, first, last);
    }

    if profile.episodes.is_empty() {
        for caps in CROSS_EPISODE.captures_iter(name) {
            markers.push(caps.get(0).unwrap().start());
            if let Some(season) = caps[1].parse().ok() {
                push_unique(&mut profile.seasons, season);
            }
            if let Some(episode) = caps[2].parse().ok() {
                push_unique(&mut profile.episodes, episode);
            }
        }
    }

    for pattern in [&*SEASON_PACK, &*SEASON_WORD] {
        for caps in pattern.captures_iter(name) {
            markers.push(caps.get(0).unwrap().start());
            let first: Option<u32> = caps[1].parse().ok();
            let last: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
            push_range(&mut profile.seasons, first, last);
        }
    }

    if profile.episodes.is_empty() && !profile.seasons.is_empty() {
        if let Some(caps) = EPISODE_WORD.captures(name) {
            if let Some(episode) = caps[1].parse().ok() {
                push_unique(&mut profile.episodes, episode);
            }
        }
    }

    profile.seasons.sort_unstable();
    profile.episodes.sort_unstable();
}

fn first_match(
    table: &[(&'static str, Regex)],
    name: &str,
    markers: &mut Vec<usize>,
) -> Option<String> {
    table.iter().find_map(|(label, pattern)| {
        pattern.find(name).map(|m| {
            markers.push(m.start());
            label.to_string()
        })
    })
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn push_range(values: &mut Vec<u32>, first: Option<u32>, last: Option<u32>) {
    match (first, last) {
        (Some(first), Some(last)) if last > first && last - first <= 100 => {
            for n in first..=last {
                push_unique(values, n);
            }
        }
        (Some(first), _) => push_unique(values, first),
        _ => {}
    }
}

fn normalize_resolution(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "4k" | "uhd" => "2160p".to_string(),
        "1080i" => "1080p".to_string(),
        other => other.to_string(),
    }
}

fn height_to_resolution(height: u32) -> Option<&'static str> {
    match height {
        2160 => Some("2160p"),
        1440 => Some("1440p"),
        1080 => Some("1080p"),
        720 => Some("720p"),
        576 => Some("576p"),
        480 => Some("480p"),
        _ => None,
    }
}

fn strip_video_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if is_video(name) => stem,
        _ => name,
    }
}

fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| c == '-' || c == '(' || c == '[' || c.is_whitespace())
        .to_string()
}

/// Replace accented Latin letters with their ASCII base letters.
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ą' => out.push('A'),
            'ç' | 'ć' | 'č' => out.push('c'),
            'Ç' | 'Ć' | 'Č' => out.push('C'),
            'ď' | 'đ' => out.push('d'),
            'Ď' | 'Đ' => out.push('D'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => out.push('e'),
            'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => out.push('E'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' => out.push('i'),
            'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => out.push('I'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'ñ' | 'ń' | 'ň' => out.push('n'),
            'Ñ' | 'Ń' | 'Ň' => out.push('N'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => out.push('o'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => out.push('O'),
            'ř' => out.push('r'),
            'Ř' => out.push('R'),
            'ś' | 'š' | 'ş' => out.push('s'),
            'Ś' | 'Š' | 'Ş' => out.push('S'),
            'ť' | 'ţ' => out.push('t'),
            'Ť' | 'Ţ' => out.push('T'),
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => out.push('u'),
            'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => out.push('U'),
            'ý' | 'ÿ' => out.push('y'),
            'Ý' | 'Ÿ' => out.push('Y'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'Ź' | 'Ż' | 'Ž' => out.push('Z'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            other => out.push(other),
        }
    }
    out
}

/// Normalize a title for comparison: ASCII-folded, lowercase, punctuation
/// dropped, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let folded = fold_diacritics(title).to_lowercase();
    let spaced: String = folded
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a release's parsed title refers to the requested title.
pub fn title_match(expected: &str, parsed: &str) -> bool {
    let a = normalize_title(expected);
    let b = normalize_title(parsed);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    strsim::normalized_levenshtein(&a, &b) >= TITLE_MATCH_THRESHOLD
}
