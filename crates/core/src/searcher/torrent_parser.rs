//! Torrent file parser - derives the info hash from raw .torrent bytes.
//!
//! The top-level dictionary is decoded, the `info` value is isolated and
//! re-encoded (bencode has exactly one encoding per value, dictionary keys
//! sorted), and the SHA-1 of those bytes is the info hash.

use serde_bencode::value::Value;
use sha1::{Digest, Sha1};
use thiserror::Error;

use super::InfoHash;

/// Errors that can occur when parsing torrent files.
#[derive(Debug, Error)]
pub enum TorrentParseError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Torrent is not a dictionary")]
    NotADictionary,

    #[error("Torrent has no info dictionary")]
    MissingInfo,

    #[error("Failed to encode info dictionary: {0}")]
    EncodeError(String),
}

/// Extract the info hash from a .torrent file.
pub fn parse_torrent_info_hash(bytes: &[u8]) -> Result<InfoHash, TorrentParseError> {
    let value: Value =
        serde_bencode::from_bytes(bytes).map_err(|e| TorrentParseError::ParseError(e.to_string()))?;

    let mut dict = match value {
        Value::Dict(dict) => dict,
        _ => return Err(TorrentParseError::NotADictionary),
    };

    let info = dict
        .remove(b"info".as_slice())
        .ok_or(TorrentParseError::MissingInfo)?;
    if !matches!(info, Value::Dict(_)) {
        return Err(TorrentParseError::MissingInfo);
    }

    let encoded =
        serde_bencode::to_bytes(&info).map_err(|e| TorrentParseError::EncodeError(e.to_string()))?;

    let digest: [u8; 20] = Sha1::digest(&encoded).into();
    Ok(InfoHash::from_digest(&digest))
}
