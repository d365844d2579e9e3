//! Audio Engine Module
//!
//! Sample-level building blocks:
//! - Audio buffer management and channel/rate conversion
//! - WAV file I/O

pub mod buffer;
pub mod io;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use io::{export_audio, import_clip, probe_duration, write_wav, ExportFormat};
