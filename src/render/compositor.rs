//! Overlay compositing
//!
//! The compositor owns the one mutable track of a render. It starts as
//! silence of the reference length, accumulates clips by summation, and is
//! consumed by [`Compositor::finalize`] to produce the read-only [`Track`].
//!
//! Summation is commutative, so the order of overlays does not change the
//! result. Nothing is limited or clipped here: overlapping clips add up.

use std::time::Duration;

use log::warn;

use crate::engine::buffer::{duration_to_samples, AudioBuffer, ChannelLayout};
use crate::error::{DubError, Result};

/// One clip placed at one offset, consumed by a single overlay call
#[derive(Debug, Clone)]
pub struct OverlayOp {
    pub clip: AudioBuffer,
    pub offset: Duration,
}

impl OverlayOp {
    pub fn new(clip: AudioBuffer, offset: Duration) -> Self {
        Self { clip, offset }
    }
}

/// What a single overlay did to the track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    /// Track sample index where the clip starts
    pub start_sample: usize,
    /// Samples per channel summed into the track
    pub mixed: usize,
    /// Samples per channel dropped past the track end
    pub truncated: usize,
}

/// The finished composite track
///
/// Its length is fixed at creation and it offers no mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    buffer: AudioBuffer,
}

impl Track {
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.buffer.channels()
    }

    pub fn duration(&self) -> Duration {
        self.buffer.duration()
    }

    pub fn into_buffer(self) -> AudioBuffer {
        self.buffer
    }
}

/// Accumulates overlays into a fixed-length silent base track
#[derive(Debug)]
pub struct Compositor {
    track: AudioBuffer,
    layout: ChannelLayout,
    overlays: usize,
}

impl Compositor {
    /// Create the silent base track
    ///
    /// Fails with `InvalidReferenceDuration` when `reference` is zero or
    /// shorter than one sample, before anything is allocated.
    pub fn new(reference: Duration, sample_rate: u32, layout: ChannelLayout) -> Result<Self> {
        let len = duration_to_samples(reference, sample_rate);
        if len == 0 {
            return Err(DubError::InvalidReferenceDuration {
                duration_ms: reference.as_millis() as u64,
            });
        }

        Ok(Self {
            track: AudioBuffer::silence(len, layout, sample_rate),
            layout,
            overlays: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.track.sample_rate
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Number of overlays applied so far
    pub fn overlay_count(&self) -> usize {
        self.overlays
    }

    /// Sum `op.clip` into the track starting at `op.offset`
    ///
    /// The clip is brought to the track's channel layout and sample rate
    /// first. Samples that would land past the end are dropped.
    pub fn overlay(&mut self, op: OverlayOp) -> OverlayStats {
        let OverlayOp { clip, offset } = op;

        let clip = if clip.channels() != self.layout.num_channels() {
            clip.to_layout(self.layout)
        } else {
            clip
        };
        let clip = if clip.sample_rate != self.track.sample_rate {
            warn!(
                "Overlay clip at {}Hz resampled to track rate {}Hz",
                clip.sample_rate, self.track.sample_rate
            );
            clip.resampled(self.track.sample_rate)
        } else {
            clip
        };

        let track_len = self.track.len();
        let start = duration_to_samples(offset, self.track.sample_rate);
        let mixed = clip.len().min(track_len.saturating_sub(start));

        for (dest, src) in self.track.samples.iter_mut().zip(clip.samples.iter()) {
            for (d, s) in dest[start.min(track_len)..].iter_mut().zip(&src[..mixed]) {
                *d += *s;
            }
        }

        self.overlays += 1;

        OverlayStats {
            start_sample: start,
            mixed,
            truncated: clip.len() - mixed,
        }
    }

    /// Close the pass and hand out the finished track
    pub fn finalize(self) -> Track {
        Track { buffer: self.track }
    }
}
