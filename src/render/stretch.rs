//! Time stretching
//!
//! Fits a clip of any native length into an exact target duration.
//!
//! The built-in transform changes the playback rate: the clip's samples are
//! reinterpreted at `native_rate * speed_ratio` and resampled back to the
//! track rate. Pitch moves with speed (a 2x compression sounds an octave
//! higher). Pitch-preserving transforms plug in through [`TimeStretch`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::buffer::{duration_to_samples, AudioBuffer};
use crate::error::SkipReason;

/// Lowest effective playback rate accepted by default (Hz)
pub const DEFAULT_MIN_EFFECTIVE_RATE: u32 = 1_000;

/// Highest effective playback rate accepted by default (Hz)
pub const DEFAULT_MAX_EFFECTIVE_RATE: u32 = 768_000;

/// A transform that makes a clip last exactly `target`
///
/// Implementations are pure: they never mutate the input and may run
/// concurrently for different clips.
pub trait TimeStretch: Send + Sync {
    /// Return a new buffer at the track rate whose duration is `target`
    /// within one sample period.
    ///
    /// A zero-length clip is returned unchanged; callers must not overlay it.
    fn stretch(&self, clip: &AudioBuffer, target: Duration) -> Result<AudioBuffer, SkipReason>;
}

/// Range of effective playback rates a stretch may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchBounds {
    pub min_effective_rate: u32,
    pub max_effective_rate: u32,
}

impl Default for StretchBounds {
    fn default() -> Self {
        Self {
            min_effective_rate: DEFAULT_MIN_EFFECTIVE_RATE,
            max_effective_rate: DEFAULT_MAX_EFFECTIVE_RATE,
        }
    }
}

impl StretchBounds {
    pub fn contains(&self, effective_rate: f64) -> bool {
        effective_rate >= self.min_effective_rate as f64
            && effective_rate <= self.max_effective_rate as f64
    }
}

/// Playback-rate stretch with linear resampling
#[derive(Debug, Clone)]
pub struct ResampleStretcher {
    output_rate: u32,
    bounds: StretchBounds,
}

impl ResampleStretcher {
    pub fn new(output_rate: u32, bounds: StretchBounds) -> Self {
        Self {
            output_rate,
            bounds,
        }
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn bounds(&self) -> StretchBounds {
        self.bounds
    }
}

/// `native / target`; above 1.0 the clip is compressed and pitched up
pub fn speed_ratio(native: Duration, target: Duration) -> f64 {
    native.as_secs_f64() / target.as_secs_f64()
}

impl TimeStretch for ResampleStretcher {
    fn stretch(&self, clip: &AudioBuffer, target: Duration) -> Result<AudioBuffer, SkipReason> {
        if target.is_zero() {
            return Err(SkipReason::ZeroTargetDuration);
        }
        if clip.is_empty() {
            return Ok(clip.clone());
        }
        if clip.sample_rate == 0 {
            return Err(SkipReason::InvalidClip {
                reason: "clip has a 0Hz sample rate".to_string(),
            });
        }

        let ratio = clip.duration_secs() / target.as_secs_f64();
        let effective_rate = clip.sample_rate as f64 * ratio;
        if !self.bounds.contains(effective_rate) {
            return Err(SkipReason::StretchOutOfRange {
                effective_rate,
                min: self.bounds.min_effective_rate,
                max: self.bounds.max_effective_rate,
            });
        }

        // Length comes from the target, not from effective_rate, so rounding
        // never accumulates past one sample.
        let target_len = duration_to_samples(target, self.output_rate);
        if target_len == 0 {
            return Err(SkipReason::ZeroTargetDuration);
        }

        Ok(clip.resampled_to_len(target_len, self.output_rate))
    }
}
