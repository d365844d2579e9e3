//! Dubtrack - subtitle-aligned dub track renderer
//!
//! Takes a list of subtitle cues, an optional voice clip per cue and the
//! duration of a reference video, and renders one audio track of exactly
//! that duration with every clip stretched to fill its cue window.
//!
//! # Architecture
//!
//! - `timeline`: inputs (cues, SRT parsing, clip stores)
//! - `render`: stretch, compositing, the render pass, export
//! - `engine`: audio buffers and WAV I/O
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use dubtrack::config::RenderConfig;
//! use dubtrack::engine::io::generate_test_tone;
//! use dubtrack::render::TimelineBuilder;
//! use dubtrack::timeline::{Cue, MemoryClipStore};
//!
//! let store = MemoryClipStore::new().with_clip(0, generate_test_tone(440.0, 2.0, 48000));
//! let cues = vec![Cue::from_millis(0, 0, 1000), Cue::from_millis(1, 2000, 3000)];
//!
//! let render = TimelineBuilder::new(RenderConfig::default())
//!     .render(Duration::from_millis(5000), &cues, &store)
//!     .unwrap();
//!
//! assert_eq!(render.track.duration(), Duration::from_millis(5000));
//! assert_eq!(render.report.placed_indices(), vec![0]);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod render;
pub mod timeline;

pub use error::{DubError, Result, SkipReason};
