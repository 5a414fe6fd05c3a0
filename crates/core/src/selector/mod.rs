//! Choosing what to present: one file per torrent, then a capped,
//! resolution-balanced subset of the ranked list.

mod balanced;
pub mod files;

pub use balanced::{select_balanced, LanguageFilter, ResolutionFilter};
pub use files::{is_video, select_file, select_files, SelectedFile, VIDEO_EXTENSIONS};
