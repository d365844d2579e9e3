//! Clip stores
//!
//! A clip store answers one question: which decoded voice clip, if any,
//! belongs to a cue index. Absence is a normal answer, not an error.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::engine::{import_clip, AudioBuffer};
use crate::error::{DubError, Result};

/// Default file name prefix for per-cue clips on disk
pub const DEFAULT_CLIP_PREFIX: &str = "tts";

/// Lookup from cue index to an optional decoded clip
///
/// Implementations must be free of side effects and safe to read from
/// several threads at once.
pub trait ClipStore: Send + Sync {
    /// `Ok(None)` when no clip exists for the cue; `Err` when one exists
    /// but cannot be decoded.
    fn get_clip(&self, cue_index: u32) -> Result<Option<AudioBuffer>>;
}

/// Clips held in memory, keyed by cue index
#[derive(Debug, Clone, Default)]
pub struct MemoryClipStore {
    clips: HashMap<u32, AudioBuffer>,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cue_index: u32, clip: AudioBuffer) -> Option<AudioBuffer> {
        self.clips.insert(cue_index, clip)
    }

    pub fn with_clip(mut self, cue_index: u32, clip: AudioBuffer) -> Self {
        self.insert(cue_index, clip);
        self
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl ClipStore for MemoryClipStore {
    fn get_clip(&self, cue_index: u32) -> Result<Option<AudioBuffer>> {
        Ok(self.clips.get(&cue_index).cloned())
    }
}

/// Clips stored as WAV files in one directory
///
/// The clip for cue `i` of media `stem` lives at
/// `<dir>/<prefix>_<stem>_<i>.wav`.
#[derive(Debug, Clone)]
pub struct DirectoryClipStore {
    dir: PathBuf,
    prefix: String,
    stem: String,
}

impl DirectoryClipStore {
    /// Open a store rooted at `dir`
    ///
    /// Fails with `ClipStoreUnreadable` when `dir` is not a readable
    /// directory; this is checked once, before any rendering starts.
    pub fn open(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let unreadable = |reason: String| DubError::ClipStoreUnreadable {
            path: dir.display().to_string(),
            reason,
        };

        if !dir.is_dir() {
            return Err(unreadable("not a directory".to_string()));
        }
        std::fs::read_dir(&dir).map_err(|e| unreadable(e.to_string()))?;

        Ok(Self {
            dir,
            prefix: DEFAULT_CLIP_PREFIX.to_string(),
            stem: stem.into(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path where the clip for `cue_index` is expected
    pub fn clip_path(&self, cue_index: u32) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.wav", self.prefix, self.stem, cue_index))
    }

    /// Cue indices that currently have a clip file, ascending
    pub fn available_indices(&self) -> Result<BTreeSet<u32>> {
        let file_prefix = format!("{}_{}_", self.prefix, self.stem);
        let mut indices = BTreeSet::new();

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| DubError::ClipStoreUnreadable {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let index = name
                .strip_prefix(file_prefix.as_str())
                .and_then(|rest| rest.strip_suffix(".wav"))
                .and_then(|digits| digits.parse::<u32>().ok());
            if let Some(index) = index {
                indices.insert(index);
            }
        }

        Ok(indices)
    }
}

impl ClipStore for DirectoryClipStore {
    fn get_clip(&self, cue_index: u32) -> Result<Option<AudioBuffer>> {
        let path = self.clip_path(cue_index);
        if !path.is_file() {
            return Ok(None);
        }
        debug!("Decoding clip {}", path.display());
        import_clip(&path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::io::{export_audio, generate_test_tone, ExportFormat};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_absent_vs_present() {
        let store = MemoryClipStore::new().with_clip(3, generate_test_tone(440.0, 0.1, 48000));
        assert!(store.get_clip(3).unwrap().is_some());
        assert!(store.get_clip(4).unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_keeps_empty_clip_distinct_from_absent() {
        let empty = AudioBuffer::from_channels(vec![Vec::new()], 48000).unwrap();
        let store = MemoryClipStore::new().with_clip(0, empty);
        let clip = store.get_clip(0).unwrap();
        assert!(clip.is_some_and(|c| c.is_empty()));
    }

    #[test]
    fn test_open_missing_directory_is_fatal() {
        let err = DirectoryClipStore::open("/nonexistent/clips", "movie").unwrap_err();
        assert!(matches!(err, DubError::ClipStoreUnreadable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_clip_path_naming() {
        let dir = tempdir().unwrap();
        let store = DirectoryClipStore::open(dir.path(), "movie").unwrap();
        assert_eq!(store.clip_path(12), dir.path().join("tts_movie_12.wav"));

        let store = store.with_prefix("voice");
        assert_eq!(store.clip_path(1), dir.path().join("voice_movie_1.wav"));
    }

    #[test]
    fn test_directory_store_lookup() {
        let dir = tempdir().unwrap();
        let store = DirectoryClipStore::open(dir.path(), "movie").unwrap();
        let tone = generate_test_tone(440.0, 0.2, 24000);
        export_audio(&tone, &store.clip_path(1), ExportFormat::new(24000, 16)).unwrap();

        let clip = store.get_clip(1).unwrap().unwrap();
        assert_eq!(clip.sample_rate, 24000);
        assert_eq!(clip.num_samples(), tone.num_samples());
        assert!(store.get_clip(2).unwrap().is_none());
    }

    #[test]
    fn test_directory_store_corrupt_clip_is_error() {
        let dir = tempdir().unwrap();
        let store = DirectoryClipStore::open(dir.path(), "movie").unwrap();
        std::fs::write(store.clip_path(5), b"not audio").unwrap();

        assert!(store.get_clip(5).is_err());
    }

    #[test]
    fn test_available_indices() {
        let dir = tempdir().unwrap();
        let store = DirectoryClipStore::open(dir.path(), "movie").unwrap();
        for name in [
            "tts_movie_3.wav",
            "tts_movie_1.wav",
            "tts_other_2.wav",
            "tts_movie_x.wav",
            "final_movie.wav",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("tts_movie_9.wav")).unwrap();

        let indices: Vec<u32> = store.available_indices().unwrap().into_iter().collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
