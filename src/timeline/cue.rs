//! Subtitle cues
//!
//! A cue is one subtitle interval with a stable index. Cues come from an
//! external source already parsed and ordered; they are never mutated.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One subtitle interval on the shared timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// Source-defined index, unique within a cue list
    pub index: u32,
    /// Window start, measured from the beginning of the reference media
    pub start: Duration,
    /// Window end; a usable cue has `end > start`
    pub end: Duration,
    /// Subtitle text, kept for display only
    #[serde(default)]
    pub text: String,
}

impl Cue {
    pub fn new(index: u32, start: Duration, end: Duration) -> Self {
        Self {
            index,
            start,
            end,
            text: String::new(),
        }
    }

    /// Convenience constructor from millisecond timestamps
    pub fn from_millis(index: u32, start_ms: u64, end_ms: u64) -> Self {
        Self::new(
            index,
            Duration::from_millis(start_ms),
            Duration::from_millis(end_ms),
        )
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Length of the window, or `None` when `end <= start`
    pub fn window(&self) -> Option<Duration> {
        self.end
            .checked_sub(self.start)
            .filter(|window| !window.is_zero())
    }

    pub fn is_valid(&self) -> bool {
        self.window().is_some()
    }

    pub fn start_ms(&self) -> u64 {
        self.start.as_millis() as u64
    }

    pub fn end_ms(&self) -> u64 {
        self.end.as_millis() as u64
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}ms -> {}ms]",
            self.index,
            self.start_ms(),
            self.end_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 1000, Some(1000) ; "normal window")]
    #[test_case(2000, 2001, Some(1) ; "one millisecond")]
    #[test_case(1000, 1000, None ; "zero length")]
    #[test_case(3000, 2000, None ; "inverted")]
    fn test_window(start_ms: u64, end_ms: u64, expected_ms: Option<u64>) {
        let cue = Cue::from_millis(1, start_ms, end_ms);
        assert_eq!(cue.window(), expected_ms.map(Duration::from_millis));
        assert_eq!(cue.is_valid(), expected_ms.is_some());
    }

    #[test]
    fn test_display() {
        let cue = Cue::from_millis(7, 1500, 2750).with_text("hello");
        assert_eq!(cue.to_string(), "#7 [1500ms -> 2750ms]");
        assert_eq!(cue.text, "hello");
    }
}
