//! Timeline builder
//!
//! Runs one render pass: for every cue, look up its clip, stretch it to the
//! cue window and overlay it at the cue start. Per-cue problems skip that cue
//! only. The pass fails as a whole only when the reference duration is
//! unusable, which is checked before any work starts.
//!
//! Preparing a cue (lookup + stretch) is pure. With `parallel` set, all cues
//! are prepared on the rayon pool first; otherwise each cue is prepared and
//! overlaid before the next is looked up. Overlays always run in cue order on
//! the calling thread, which is the only writer of the track.
//!
//! A cue index is claimed by the first cue with that index that is placed.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::engine::buffer::{calculate_peak, ChannelLayout};
use crate::error::{Result, SkipReason};
use crate::render::compositor::{Compositor, OverlayOp, Track};
use crate::render::stretch::{speed_ratio, ResampleStretcher, TimeStretch};
use crate::timeline::{ClipStore, Cue};

/// A cue whose clip made it onto the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedCue {
    pub index: u32,
    pub start_ms: u64,
    pub target_ms: u64,
    pub native_ms: u64,
    /// native / target; above 1.0 means compressed and pitched up
    pub speed_ratio: f64,
    /// Samples per channel cut off at the end of the track
    pub truncated_samples: usize,
}

/// A cue that contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCue {
    pub index: u32,
    pub reason: SkipReason,
}

/// Per-cue outcome of a render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub rendered_at: DateTime<Utc>,
    pub reference_ms: u64,
    pub sample_rate: u32,
    pub layout: ChannelLayout,
    pub track_samples: usize,
    /// Peak of the composite in dBFS; above 0 means the export will clip
    pub peak_db: Option<f32>,
    pub placed: Vec<PlacedCue>,
    pub skipped: Vec<SkippedCue>,
}

impl RenderReport {
    pub fn placed_indices(&self) -> Vec<u32> {
        self.placed.iter().map(|p| p.index).collect()
    }

    pub fn skip_reason(&self, index: u32) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.index == index)
            .map(|s| &s.reason)
    }
}

/// Output of a render pass
#[derive(Debug, Clone)]
pub struct Render {
    pub track: Track,
    pub report: RenderReport,
}

/// A cue ready to be overlaid
struct Prepared {
    op: OverlayOp,
    placed: PlacedCue,
}

/// Mutable state of one render pass, owned by the overlay loop
struct Pass {
    compositor: Compositor,
    placed: Vec<PlacedCue>,
    skipped: Vec<SkippedCue>,
    /// Indices already placed on the track
    claimed: HashSet<u32>,
}

impl Pass {
    fn apply(&mut self, cue: &Cue, outcome: std::result::Result<Prepared, SkipReason>) {
        let outcome = outcome.and_then(|prepared| {
            if self.claimed.insert(cue.index) {
                Ok(prepared)
            } else {
                Err(SkipReason::DuplicateIndex { index: cue.index })
            }
        });

        match outcome {
            Ok(Prepared { op, placed: mut record }) => {
                let stats = self.compositor.overlay(op);
                record.truncated_samples = stats.truncated;
                debug!(
                    "Cue {} placed at sample {} (speed {:.3}, {} samples truncated)",
                    cue, stats.start_sample, record.speed_ratio, stats.truncated
                );
                self.placed.push(record);
            }
            Err(reason) => {
                warn!("Skipping cue {} [{}]: {}", cue, reason.kind(), reason);
                self.skipped.push(SkippedCue {
                    index: cue.index,
                    reason,
                });
            }
        }
    }
}

/// Orchestrates cue lookup, stretching and compositing
pub struct TimelineBuilder {
    config: RenderConfig,
    stretcher: Box<dyn TimeStretch>,
}

impl TimelineBuilder {
    /// Builder with the playback-rate stretcher configured from `config`
    pub fn new(config: RenderConfig) -> Self {
        let stretcher = ResampleStretcher::new(config.sample_rate, config.stretch);
        Self {
            config,
            stretcher: Box::new(stretcher),
        }
    }

    /// Replace the stretch transform
    ///
    /// The stretcher must produce buffers at `config.sample_rate`; buffers at
    /// another rate are resampled again at overlay time.
    pub fn with_stretcher(mut self, stretcher: Box<dyn TimeStretch>) -> Self {
        self.stretcher = stretcher;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `cues` over a silent track of length `reference`
    pub fn render(&self, reference: Duration, cues: &[Cue], store: &dyn ClipStore) -> Result<Render> {
        self.config.validate()?;
        let compositor = Compositor::new(reference, self.config.sample_rate, self.config.layout)?;

        info!(
            "Rendering {} cues over {}ms at {}Hz",
            cues.len(),
            reference.as_millis(),
            self.config.sample_rate
        );

        let mut pass = Pass {
            compositor,
            placed: Vec::new(),
            skipped: Vec::new(),
            claimed: HashSet::new(),
        };

        if self.config.parallel {
            let prepared: Vec<_> = cues.par_iter().map(|cue| self.prepare(cue, store)).collect();
            for (cue, outcome) in cues.iter().zip(prepared) {
                pass.apply(cue, outcome);
            }
        } else {
            // One stretched clip alive at a time
            for cue in cues {
                pass.apply(cue, self.prepare(cue, store));
            }
        }

        let Pass {
            compositor,
            placed,
            skipped,
            ..
        } = pass;
        let track = compositor.finalize();
        let peak = calculate_peak(track.buffer());

        info!(
            "Rendered {}ms track: {} cues placed, {} skipped",
            track.duration().as_millis(),
            placed.len(),
            skipped.len()
        );

        let report = RenderReport {
            rendered_at: Utc::now(),
            reference_ms: reference.as_millis() as u64,
            sample_rate: track.sample_rate(),
            layout: self.config.layout,
            track_samples: track.len(),
            peak_db: peak.is_finite().then_some(peak),
            placed,
            skipped,
        };

        Ok(Render { track, report })
    }

    /// Lookup and stretch for one cue; touches no shared state
    fn prepare(&self, cue: &Cue, store: &dyn ClipStore) -> std::result::Result<Prepared, SkipReason> {
        let target = cue.window().ok_or(SkipReason::EmptyWindow {
            start_ms: cue.start_ms(),
            end_ms: cue.end_ms(),
        })?;

        let clip = store
            .get_clip(cue.index)
            .map_err(|e| SkipReason::ClipUnreadable {
                reason: e.to_string(),
            })?
            .ok_or(SkipReason::MissingClip)?;

        if clip.is_empty() {
            return Err(SkipReason::EmptyClip);
        }
        if clip.sample_rate == 0 {
            return Err(SkipReason::InvalidClip {
                reason: "clip has a 0Hz sample rate".to_string(),
            });
        }

        let native = clip.duration();
        let stretched = self.stretcher.stretch(&clip, target)?;
        if stretched.is_empty() {
            return Err(SkipReason::EmptyClip);
        }
        if stretched.sample_rate == 0 {
            return Err(SkipReason::InvalidClip {
                reason: "stretch produced a 0Hz sample rate".to_string(),
            });
        }

        Ok(Prepared {
            op: OverlayOp::new(stretched, cue.start),
            placed: PlacedCue {
                index: cue.index,
                start_ms: cue.start_ms(),
                target_ms: target.as_millis() as u64,
                native_ms: native.as_millis() as u64,
                speed_ratio: speed_ratio(native, target),
                truncated_samples: 0,
            },
        })
    }
}
