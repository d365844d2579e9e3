//! Audio Buffer Management
//!
//! Provides the core audio buffer type shared by clips and the composite
//! track. Samples are stored non-interleaved as 32-bit floats.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DubError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Canonical sample rate of rendered tracks (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

const NANOS_PER_SEC: u128 = 1_000_000_000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Number of samples covering `duration` at `sample_rate`, rounded to nearest
///
/// Integer arithmetic on nanoseconds, so millisecond cue times map to the
/// same sample index on every platform.
#[inline]
pub fn duration_to_samples(duration: Duration, sample_rate: u32) -> usize {
    let scaled = duration.as_nanos() * sample_rate as u128;
    ((scaled + NANOS_PER_SEC / 2) / NANOS_PER_SEC) as usize
}

/// Duration of `num_samples` at `sample_rate`
#[inline]
pub fn samples_to_duration(num_samples: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = num_samples as u128 * NANOS_PER_SEC / sample_rate as u128;
    Duration::from_nanos(nanos as u64)
}

/// Calculate the peak level of an audio buffer in dB
///
/// Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    let peak = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded audio: a voice clip before stretching, or the composite track
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate Vec<f32>, all of equal length.
///
/// # Example
/// ```
/// use dubtrack::engine::buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
///
/// // Create a 1-second stereo buffer of silence
/// let buffer = AudioBuffer::silence(DEFAULT_SAMPLE_RATE as usize, ChannelLayout::Stereo, DEFAULT_SAMPLE_RATE);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer of `num_samples` zeroed samples per channel
    pub fn silence(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// Fails if the channel count is not 1 or 2, the channels differ in
    /// length, or the sample rate is zero.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DubError::InvalidAudio {
                reason: "Sample rate must be positive".to_string(),
                source: None,
            });
        }
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(DubError::UnsupportedFormat {
                format: format!("{}-channel audio (only mono/stereo supported)", samples.len()),
            });
        }
        let len = samples[0].len();
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(DubError::InvalidAudio {
                reason: "Channels have different lengths".to_string(),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get a channel's samples
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Alias for channels()
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alias for len()
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.len()
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the duration, truncated to whole nanoseconds
    #[inline]
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.len(), self.sample_rate)
    }

    /// True when every sample in `range` is exactly zero on every channel
    ///
    /// The range is clamped to the buffer length.
    pub fn is_silent_in(&self, range: std::ops::Range<usize>) -> bool {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.samples
            .iter()
            .all(|ch| ch[start..end].iter().all(|&s| s == 0.0))
    }

    /// Return a copy converted to `layout`
    ///
    /// Mono to stereo duplicates the channel; stereo to mono averages the
    /// two channels.
    pub fn to_layout(&self, layout: ChannelLayout) -> AudioBuffer {
        if self.channels() == layout.num_channels() {
            return self.clone();
        }

        let samples = match layout {
            ChannelLayout::Stereo => {
                let mono = self.samples.first().cloned().unwrap_or_default();
                vec![mono.clone(), mono]
            }
            ChannelLayout::Mono => {
                let len = self.len();
                let count = self.channels().max(1) as f32;
                let mixed = (0..len)
                    .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() / count)
                    .collect();
                vec![mixed]
            }
        };

        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Return a copy linearly resampled to exactly `target_len` samples
    ///
    /// The new buffer is tagged with `sample_rate`. The content is spread
    /// evenly over the new length whatever the two rates are, which is what
    /// both rate conversion and rate-change time stretching need.
    pub fn resampled_to_len(&self, target_len: usize, sample_rate: u32) -> AudioBuffer {
        let samples = self
            .samples
            .iter()
            .map(|channel| resample_linear(channel, target_len))
            .collect();

        AudioBuffer {
            samples,
            sample_rate,
        }
    }

    /// Return a copy converted to `sample_rate`, keeping its duration
    ///
    /// A buffer with no usable rate on either side has no duration to keep
    /// and converts to an empty buffer.
    pub fn resampled(&self, sample_rate: u32) -> AudioBuffer {
        if sample_rate == self.sample_rate {
            return self.clone();
        }
        if sample_rate == 0 || self.sample_rate == 0 {
            return AudioBuffer {
                samples: vec![Vec::new(); self.channels()],
                sample_rate,
            };
        }
        let ratio = sample_rate as f64 / self.sample_rate as f64;
        let target_len = (self.len() as f64 * ratio).round() as usize;
        self.resampled_to_len(target_len, sample_rate)
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::silence(0, ChannelLayout::Stereo, DEFAULT_SAMPLE_RATE)
    }
}

/// Linear interpolation resampling to an exact output length
///
/// Output sample `i` reads source position `i * len / target_len`, so the
/// first sample is kept and the source is spanned end to end.
// TODO: replace with a windowed sinc resampler to reduce aliasing on strong compression
pub(crate) fn resample_linear(samples: &[f32], target_len: usize) -> Vec<f32> {
    if samples.is_empty() || target_len == 0 {
        return vec![0.0; target_len];
    }

    let source_len = samples.len();
    let step = source_len as f64 / target_len as f64;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 * step;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn create_test_buffer(samples: Vec<Vec<f32>>) -> AudioBuffer {
        AudioBuffer {
            samples,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    #[test_case(Duration::from_millis(1000), 48000, 48000 ; "one second")]
    #[test_case(Duration::from_millis(5000), 44100, 220500 ; "five seconds at cd rate")]
    #[test_case(Duration::from_millis(1), 44100, 44 ; "one millisecond rounds down")]
    #[test_case(Duration::from_nanos(11_338), 44100, 1 ; "half sample rounds up")]
    #[test_case(Duration::ZERO, 48000, 0 ; "zero")]
    fn test_duration_to_samples(duration: Duration, rate: u32, expected: usize) {
        assert_eq!(duration_to_samples(duration, rate), expected);
    }

    #[test]
    fn test_samples_to_duration() {
        assert_eq!(samples_to_duration(48000, 48000), Duration::from_secs(1));
        assert_eq!(samples_to_duration(24, 48000), Duration::from_micros(500));
        assert_eq!(samples_to_duration(10, 0), Duration::ZERO);
    }

    #[test]
    fn test_linear_to_db() {
        assert_abs_diff_eq!(linear_to_db(1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(linear_to_db(0.5), -6.0206, epsilon = 1e-3);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_calculate_peak_negative() {
        let mut samples = vec![0.0; 1000];
        samples[500] = -0.5;
        let buffer = create_test_buffer(vec![samples]);
        assert_abs_diff_eq!(calculate_peak(&buffer), -6.02, epsilon = 0.1);
    }

    #[test]
    fn test_silence_constructor() {
        let buffer = AudioBuffer::silence(480, ChannelLayout::Mono, 48000);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.len(), 480);
        assert_eq!(buffer.duration(), Duration::from_millis(10));
        assert!(buffer.is_silent_in(0..480));
    }

    #[test]
    fn test_from_channels_rejects_mismatched_lengths() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 48000);
        assert!(matches!(result, Err(DubError::InvalidAudio { .. })));
    }

    #[test]
    fn test_from_channels_rejects_zero_rate() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4]], 0);
        assert!(matches!(result, Err(DubError::InvalidAudio { .. })));
    }

    #[test]
    fn test_from_channels_rejects_surround() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4]; 6], 48000);
        assert!(matches!(result, Err(DubError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_to_layout_mono_to_stereo_duplicates() {
        let buffer = create_test_buffer(vec![vec![0.1, 0.2, 0.3]]);
        let stereo = buffer.to_layout(ChannelLayout::Stereo);
        assert_eq!(stereo.channels(), 2);
        assert_eq!(stereo.channel(0), stereo.channel(1));
        assert_eq!(stereo.channel(0), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_to_layout_stereo_to_mono_averages() {
        let buffer = create_test_buffer(vec![vec![1.0, 0.0], vec![0.0, -1.0]]);
        let mono = buffer.to_layout(ChannelLayout::Mono);
        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.channel(0), &[0.5, -0.5]);
    }

    #[test]
    fn test_resample_linear_exact_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        assert_eq!(resample_linear(&samples, 50).len(), 50);
        assert_eq!(resample_linear(&samples, 333).len(), 333);
        assert!(resample_linear(&samples, 0).is_empty());
    }

    #[test]
    fn test_resample_linear_compress_2x_takes_every_other_sample() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let out = resample_linear(&samples, 4);
        assert_eq!(out, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_resample_linear_upsample_interpolates() {
        let out = resample_linear(&[0.0, 1.0, 0.0], 6);
        assert_abs_diff_eq!(out[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_resampled_keeps_duration() {
        let buffer = AudioBuffer::silence(44100, ChannelLayout::Mono, 44100);
        let converted = buffer.resampled(48000);
        assert_eq!(converted.len(), 48000);
        assert_eq!(converted.sample_rate, 48000);
    }

    #[test]
    fn test_resampled_from_zero_rate_is_empty() {
        let buffer = AudioBuffer {
            samples: vec![vec![0.1; 100]],
            sample_rate: 0,
        };
        let converted = buffer.resampled(48000);
        assert!(converted.is_empty());
        assert_eq!(converted.channels(), 1);
        assert_eq!(converted.sample_rate, 48000);
    }

    #[test]
    fn test_is_silent_in_clamps_range() {
        let mut buffer = AudioBuffer::silence(10, ChannelLayout::Mono, 48000);
        buffer.samples[0][9] = 0.25;
        assert!(buffer.is_silent_in(0..9));
        assert!(!buffer.is_silent_in(5..100));
        assert!(buffer.is_silent_in(20..30));
    }
}
