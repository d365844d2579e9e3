//! Render Module
//!
//! Turns cues and clips into one composite track:
//! - Stretch: fit each clip to its cue window
//! - Compositor: sum stretched clips into a fixed-length silent track
//! - Builder: run the pass and report per-cue outcomes
//! - Export: encode the finished track

pub mod builder;
pub mod compositor;
pub mod export;
pub mod stretch;

pub use builder::{PlacedCue, Render, RenderReport, SkippedCue, TimelineBuilder};
pub use compositor::{Compositor, OverlayOp, OverlayStats, Track};
pub use export::{ExportSummary, TrackExporter, WavExporter};
pub use stretch::{ResampleStretcher, StretchBounds, TimeStretch};
