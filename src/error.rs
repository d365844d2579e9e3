//! Error handling for Dubtrack
//!
//! Two layers of failure exist. `DubError` covers pass-level problems
//! (bad inputs, unreadable sources, export failures) and is returned through
//! `Result`. `SkipReason` covers per-cue problems: those are logged and
//! recorded in the render report, and the pass carries on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Dubtrack operations
pub type Result<T> = std::result::Result<T, DubError>;

/// Main error type for Dubtrack operations
#[derive(Error, Debug)]
pub enum DubError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Render precondition errors (fatal, nothing is rendered)
    #[error("Reference duration must be positive, got {duration_ms}ms")]
    InvalidReferenceDuration { duration_ms: u64 },

    #[error("Clip store unreadable at {path}: {reason}")]
    ClipStoreUnreadable { path: String, reason: String },

    #[error("Invalid subtitle data at line {line}: {reason}")]
    InvalidSubtitle { line: usize, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Export Errors
    #[error("Export failed: {reason}")]
    Export {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DubError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DubError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DubError::InvalidAudio { .. } => "INVALID_AUDIO",
            DubError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            DubError::InvalidReferenceDuration { .. } => "INVALID_REFERENCE_DURATION",
            DubError::ClipStoreUnreadable { .. } => "CLIP_STORE_UNREADABLE",
            DubError::InvalidSubtitle { .. } => "INVALID_SUBTITLE",
            DubError::InvalidConfig { .. } => "INVALID_CONFIG",
            DubError::Export { .. } => "EXPORT_ERROR",
            DubError::Io(_) => "IO_ERROR",
            DubError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error aborts a render before any track is created
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DubError::InvalidReferenceDuration { .. }
                | DubError::ClipStoreUnreadable { .. }
                | DubError::InvalidSubtitle { .. }
                | DubError::InvalidConfig { .. }
                | DubError::FileNotFound { .. }
        )
    }

    /// Check if this error is recoverable without recomputing the track
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DubError::Export { .. } | DubError::Io(_))
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DubError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            DubError::InvalidAudio { .. } => vec![
                "Convert the clip to a PCM WAV file",
                "Check if the file plays in another application",
            ],
            DubError::UnsupportedFormat { .. } => vec![
                "Convert to mono or stereo WAV",
                "Supported bit depths: 8, 16, 24, 32 (int) and 32 (float)",
            ],
            DubError::InvalidReferenceDuration { .. } => vec![
                "Pass a positive --duration-ms",
                "Check the reference file is not empty",
            ],
            DubError::ClipStoreUnreadable { .. } => vec![
                "Check the clip directory exists and is readable",
            ],
            DubError::InvalidSubtitle { .. } => vec![
                "Check the subtitle file is valid SubRip (.srt)",
                "Timestamps must look like 00:01:02,345 --> 00:01:03,000",
            ],
            DubError::InvalidConfig { .. } => vec![
                "Remove the offending key to fall back to the default",
            ],
            DubError::Export { .. } => vec![
                "Check there is free space at the output location",
                "Retry the export; the rendered track is still in memory",
            ],
            _ => vec![],
        }
    }
}

/// Why a single cue contributed nothing to the track
///
/// None of these abort the render.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no clip available")]
    MissingClip,

    #[error("cue window is empty ({start_ms}ms -> {end_ms}ms)")]
    EmptyWindow { start_ms: u64, end_ms: u64 },

    #[error("clip has zero duration")]
    EmptyClip,

    #[error("clip is not playable: {reason}")]
    InvalidClip { reason: String },

    #[error("target duration rounds to zero samples")]
    ZeroTargetDuration,

    #[error("effective rate {effective_rate:.0}Hz outside {min}..={max}Hz")]
    StretchOutOfRange {
        effective_rate: f64,
        min: u32,
        max: u32,
    },

    #[error("clip unreadable: {reason}")]
    ClipUnreadable { reason: String },

    #[error("cue index {index} already rendered")]
    DuplicateIndex { index: u32 },
}

impl SkipReason {
    /// Short machine-readable name, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::MissingClip => "missing_clip",
            SkipReason::EmptyWindow { .. } => "empty_window",
            SkipReason::EmptyClip => "empty_clip",
            SkipReason::InvalidClip { .. } => "invalid_clip",
            SkipReason::ZeroTargetDuration => "zero_target_duration",
            SkipReason::StretchOutOfRange { .. } => "stretch_out_of_range",
            SkipReason::ClipUnreadable { .. } => "clip_unreadable",
            SkipReason::DuplicateIndex { .. } => "duplicate_index",
        }
    }
}
