//! Audio file I/O for Dubtrack
//!
//! WAV decoding of voice clips, WAV encoding of rendered tracks, and header
//! probing for reference durations.
//!
//! Clips are decoded at their native sample rate. Rate conversion happens
//! once, in the stretch step, so a clip is never resampled twice.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use crate::engine::buffer::{AudioBuffer, DEFAULT_SAMPLE_RATE};
use crate::error::{DubError, Result};

// Longest clip we agree to decode (2 hours)
const MAX_DURATION_SECS: f64 = 2.0 * 60.0 * 60.0;

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    /// Target sample rate (default: 48000)
    pub sample_rate: u32,
    /// Bit depth: 16, 24, or 32 (default: 16)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: 16,
        }
    }
}

impl ExportFormat {
    /// Create a new export format with the given sample rate and bit depth
    pub fn new(sample_rate: u32, bit_depth: u16) -> Self {
        ExportFormat {
            sample_rate,
            bit_depth,
        }
    }

    /// Check the format can be encoded
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DubError::UnsupportedFormat {
                format: "0Hz export sample rate".to_string(),
            });
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(DubError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", self.bit_depth),
            });
        }
        Ok(())
    }
}

/// Decode a WAV clip at its native sample rate
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the audio has more than 2 channels
pub fn import_clip(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(DubError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| DubError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 || channels > 2 {
        return Err(DubError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }
    if spec.sample_rate == 0 {
        return Err(DubError::InvalidAudio {
            reason: format!("{} declares a 0Hz sample rate", path.display()),
            source: None,
        });
    }

    let frames = reader.duration() as f64;
    let duration_secs = frames / spec.sample_rate as f64;
    if duration_secs > MAX_DURATION_SECS {
        return Err(DubError::InvalidAudio {
            reason: format!("Clip too long: {:.1}s (maximum 2 hours)", duration_secs),
            source: None,
        });
    }

    let samples_f32 = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let channel_data = deinterleave(&samples_f32, channels);

    AudioBuffer::from_channels(channel_data, spec.sample_rate)
}

/// Read the duration of a WAV file from its header
///
/// Truncated to whole milliseconds, which is how reference durations are
/// handed to the renderer.
pub fn probe_duration(path: &Path) -> Result<Duration> {
    if !path.exists() {
        return Err(DubError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| DubError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(DubError::InvalidAudio {
            reason: format!("{} declares a 0Hz sample rate", path.display()),
            source: None,
        });
    }

    let millis = reader.duration() as u64 * 1000 / spec.sample_rate as u64;
    Ok(Duration::from_millis(millis))
}

/// Export an AudioBuffer to a WAV file
///
/// Resamples if the target sample rate differs from the buffer's rate.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path).map_err(|e| DubError::Export {
        reason: format!("Cannot create {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;
    write_wav(buffer, BufWriter::new(file), format)
}

/// Encode an AudioBuffer as WAV into any seekable writer
pub fn write_wav<W: Write + Seek>(buffer: &AudioBuffer, writer: W, format: ExportFormat) -> Result<()> {
    format.validate()?;

    let export_data = buffer.resampled(format.sample_rate);
    let interleaved = export_data.to_interleaved();

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::new(writer, spec).map_err(export_error)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(export_error)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(export_error)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(export_error)?;
            }
        }
    }

    writer.finalize().map_err(export_error)?;

    Ok(())
}

/// Generate a mono sine tone
///
/// Handy stand-in for a voice clip in tests and demos.
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32).round() as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    let samples = (0..num_samples)
        .map(|i| 0.5 * (angular_freq * i as f32).sin())
        .collect();

    AudioBuffer {
        samples: vec![samples],
        sample_rate,
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn export_error(e: hound::Error) -> DubError {
    DubError::Export {
        reason: e.to_string(),
        source: Some(Box::new(e)),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let decoded: std::result::Result<Vec<f32>, hound::Error> = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect(),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect(),
            // 24-bit stored as i32 in hound
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect(),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect(),
            _ => {
                return Err(DubError::UnsupportedFormat {
                    format: format!("{}-bit integer audio", bits_per_sample),
                })
            }
        },
    };

    decoded.map_err(|e| DubError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    })
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for (i, sample) in samples.iter().enumerate() {
        result[i % channels].push(*sample);
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
