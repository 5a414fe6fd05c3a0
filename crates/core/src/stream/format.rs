//! Presentation of ranked entries as client-facing streams.

use crate::debrid::DebridService;
use crate::ranking::RankedEntry;

use super::StreamResult;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units and two decimals.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Same-service indirection URL that resolves the direct link on access.
pub fn playback_url(public_base: &str, config_segment: &str, entry: &RankedEntry) -> String {
    format!(
        "{}/{}/playback/{}/{}",
        public_base.trim_end_matches('/'),
        config_segment,
        entry.info_hash,
        entry.file_index
    )
}

pub fn stream_result(
    entry: &RankedEntry,
    service: DebridService,
    addon_name: &str,
    public_base: &str,
    config_segment: &str,
) -> StreamResult {
    StreamResult {
        name: format!(
            "[{}⚡] {} {}",
            service.short_tag(),
            addon_name,
            entry.resolution_label()
        ),
        title: format!("{}\n💾 {}", entry.filename, format_size(entry.size_bytes)),
        url: playback_url(public_base, config_segment, entry),
    }
}

/// Single explanatory entry returned when a request cannot be served.
pub fn degraded_result(addon_name: &str, message: &str, fallback_url: &str) -> StreamResult {
    StreamResult {
        name: format!("[⚠️] {}", addon_name),
        title: message.to_string(),
        url: fallback_url.to_string(),
    }
}
