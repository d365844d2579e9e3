//! Render configuration
//!
//! Loaded from a JSON file; every key is optional and falls back to its
//! default.
//!
//! ```json
//! {
//!   "sample_rate": 48000,
//!   "layout": "stereo",
//!   "stretch": { "min_effective_rate": 1000, "max_effective_rate": 768000 },
//!   "parallel": true,
//!   "clip_prefix": "tts",
//!   "export": { "sample_rate": 48000, "bit_depth": 16 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{ChannelLayout, ExportFormat, DEFAULT_SAMPLE_RATE};
use crate::error::{DubError, Result};
use crate::render::stretch::StretchBounds;
use crate::timeline::DEFAULT_CLIP_PREFIX;

/// Settings for one render pass and its export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canonical sample rate of the composite track
    pub sample_rate: u32,
    /// Channel layout of the composite track
    pub layout: ChannelLayout,
    /// Accepted range of effective playback rates when stretching
    pub stretch: StretchBounds,
    /// Stretch clips on the rayon pool before overlaying them
    pub parallel: bool,
    /// File name prefix of per-cue clips in a clip directory
    pub clip_prefix: String,
    /// Output encoding
    pub export: ExportFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            layout: ChannelLayout::Stereo,
            stretch: StretchBounds::default(),
            parallel: true,
            clip_prefix: DEFAULT_CLIP_PREFIX.to_string(),
            export: ExportFormat::default(),
        }
    }
}

impl RenderConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DubError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }
        let json = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DubError::InvalidConfig {
                reason: "sample_rate must be positive".to_string(),
            });
        }
        if self.stretch.min_effective_rate == 0
            || self.stretch.min_effective_rate > self.stretch.max_effective_rate
        {
            return Err(DubError::InvalidConfig {
                reason: format!(
                    "stretch bounds {}..={} are empty",
                    self.stretch.min_effective_rate, self.stretch.max_effective_rate
                ),
            });
        }
        if self.clip_prefix.is_empty() {
            return Err(DubError::InvalidConfig {
                reason: "clip_prefix must not be empty".to_string(),
            });
        }
        self.export
            .validate()
            .map_err(|e| DubError::InvalidConfig {
                reason: format!("export: {}", e),
            })
    }
}
