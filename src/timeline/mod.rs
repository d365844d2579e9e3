//! Timeline inputs
//!
//! Everything the renderer consumes from the outside world:
//! - Cues (subtitle windows), optionally read from SubRip files
//! - Clip stores mapping cue indices to decoded voice clips

pub mod clip_store;
pub mod cue;
pub mod srt;

pub use clip_store::{ClipStore, DirectoryClipStore, MemoryClipStore, DEFAULT_CLIP_PREFIX};
pub use cue::Cue;
pub use srt::{load_srt, parse_srt};
