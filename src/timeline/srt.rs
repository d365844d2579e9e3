//! SubRip (.srt) cue source
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,500
//! First line
//! Second line
//! ```
//!
//! Blocks are separated by blank lines. A malformed block makes the whole
//! file unusable: the error names the offending line.

use std::path::Path;
use std::time::Duration;

use crate::error::{DubError, Result};
use crate::timeline::cue::Cue;

const ARROW: &str = "-->";

/// Read and parse an SRT file
pub fn load_srt(path: &Path) -> Result<Vec<Cue>> {
    if !path.exists() {
        return Err(DubError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_srt(&text)
}

/// Parse SRT text into cues, in file order
pub fn parse_srt(text: &str) -> Result<Vec<Cue>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut cues = Vec::new();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim_end_matches('\r')));

    while let Some((line_no, line)) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let index = line.parse::<u32>().map_err(|_| DubError::InvalidSubtitle {
            line: line_no,
            reason: format!("expected cue index, found '{}'", line),
        })?;

        let (timing_no, timing) = lines.next().ok_or(DubError::InvalidSubtitle {
            line: line_no,
            reason: format!("cue {} has no timing line", index),
        })?;
        let (start, end) = parse_timing(timing.trim(), timing_no)?;

        let mut text_lines = Vec::new();
        for (_, text_line) in lines.by_ref() {
            if text_line.trim().is_empty() {
                break;
            }
            text_lines.push(text_line);
        }

        cues.push(Cue::new(index, start, end).with_text(text_lines.join("\n")));
    }

    Ok(cues)
}

/// Parse `00:00:01,000 --> 00:00:02,500 [X1:.. Y1:..]`
fn parse_timing(line: &str, line_no: usize) -> Result<(Duration, Duration)> {
    let (start, rest) = line.split_once(ARROW).ok_or(DubError::InvalidSubtitle {
        line: line_no,
        reason: format!("expected 'start {} end', found '{}'", ARROW, line),
    })?;
    // Anything after the end timestamp is positioning data
    let end = rest.split_whitespace().next().unwrap_or("");

    Ok((
        parse_timestamp(start.trim(), line_no)?,
        parse_timestamp(end, line_no)?,
    ))
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too)
fn parse_timestamp(stamp: &str, line_no: usize) -> Result<Duration> {
    let invalid = || DubError::InvalidSubtitle {
        line: line_no,
        reason: format!("invalid timestamp '{}'", stamp),
    };

    let (clock, millis) = stamp.split_once(|c: char| c == ',' || c == '.').ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let number = |field: &str| field.trim().parse::<u64>().map_err(|_| invalid());
    let (hours, minutes, seconds) = (number(h)?, number(m)?, number(s)?);
    if minutes >= 60 || seconds >= 60 || millis.is_empty() || millis.len() > 3 {
        return Err(invalid());
    }
    // "5" after the separator means 500ms, as in "00:00:01,5"
    let millis = number(millis)? * 10u64.pow(3 - millis.len() as u32);

    let total = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)?;

    Ok(Duration::from_millis(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use test_case::test_case;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello there\n\n2\n00:00:02,000 --> 00:00:03,000\nGeneral\nKenobi\n";

    #[test]
    fn test_parse_basic() {
        let cues = parse_srt(SAMPLE).unwrap();
        assert_eq!(
            cues,
            vec![
                Cue::from_millis(1, 0, 1000).with_text("Hello there"),
                Cue::from_millis(2, 2000, 3000).with_text("General\nKenobi"),
            ]
        );
    }

    #[test]
    fn test_parse_crlf_bom_and_extra_blank_lines() {
        let text = "\u{feff}\r\n\r\n7\r\n00:01:02,345 --> 00:01:03,000\r\nLine\r\n\r\n\r\n";
        let cues = parse_srt(text).unwrap();
        assert_eq!(cues, vec![Cue::from_millis(7, 62_345, 63_000).with_text("Line")]);
    }

    #[test]
    fn test_parse_position_coordinates_are_ignored() {
        let text = "1\n00:00:01,000 --> 00:00:02,000 X1:100 X2:200 Y1:10 Y2:20\nText\n";
        let cues = parse_srt(text).unwrap();
        assert_eq!(cues[0].end, Duration::from_millis(2000));
    }

    #[test]
    fn test_parse_keeps_inverted_cue_for_the_renderer_to_skip() {
        let text = "1\n00:00:03,000 --> 00:00:02,000\nBackwards\n";
        let cues = parse_srt(text).unwrap();
        assert!(!cues[0].is_valid());
    }

    #[test]
    fn test_parse_empty_text_block() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nNext\n";
        let cues = parse_srt(text).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_srt("").unwrap().is_empty());
    }

    #[test_case("00:00:01,000", 1000 ; "comma")]
    #[test_case("00:00:01.250", 1250 ; "dot separator")]
    #[test_case("01:02:03,004", 3_723_004 ; "all fields")]
    #[test_case("100:00:00,000", 360_000_000 ; "three digit hours")]
    #[test_case("00:00:01,5", 1500 ; "short millis")]
    fn test_parse_timestamp(stamp: &str, expected_ms: u64) {
        assert_eq!(
            parse_timestamp(stamp, 1).unwrap(),
            Duration::from_millis(expected_ms)
        );
    }

    #[test_case("00:00:01" ; "no millis")]
    #[test_case("00:61:00,000" ; "minutes overflow")]
    #[test_case("00:00:01,0000" ; "four digit millis")]
    #[test_case("aa:00:01,000" ; "letters")]
    #[test_case("00:01,000" ; "missing hours")]
    #[test_case("99999999999999999:00:00,000" ; "hours overflow")]
    fn test_parse_timestamp_rejects(stamp: &str) {
        assert!(parse_timestamp(stamp, 1).is_err());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nok\n\ntwo\n00:00:03,000 --> 00:00:04,000\n";
        match parse_srt(text).unwrap_err() {
            DubError::InvalidSubtitle { line, .. } => assert_eq!(line, 5),
            other => panic!("Expected InvalidSubtitle, got: {:?}", other),
        }
    }

    #[test]
    fn test_huge_hours_is_error_on_timing_line() {
        let text = "1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nx\n";
        assert!(matches!(
            parse_srt(text),
            Err(DubError::InvalidSubtitle { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_arrow_is_error() {
        let err = parse_srt("1\n00:00:01,000 00:00:02,000\n").unwrap_err();
        assert!(matches!(err, DubError::InvalidSubtitle { line: 2, .. }));
    }

    #[test]
    fn test_missing_timing_line_is_error() {
        assert!(parse_srt("1\n").is_err());
    }

    #[test]
    fn test_load_srt_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movie.srt");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(load_srt(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_srt(Path::new("/nonexistent/movie.srt")).unwrap_err();
        assert!(err.is_fatal());
    }
}
