//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::cli::{InspectArgs, RenderArgs, SourceArgs};
use crate::config::RenderConfig;
use crate::engine::io::probe_duration;
use crate::error::{DubError, Result};
use crate::render::{TimelineBuilder, TrackExporter, WavExporter};
use crate::timeline::{load_srt, Cue, DirectoryClipStore};

/// Everything a command needs, loaded before any audio work
struct Session {
    config: RenderConfig,
    cues: Vec<Cue>,
    store: DirectoryClipStore,
    stem: String,
}

fn open_session(source: &SourceArgs) -> Result<Session> {
    let config = match &source.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    let stem = match &source.stem {
        Some(stem) => stem.clone(),
        None => file_stem(&source.subtitles)?,
    };

    let cues = load_srt(&source.subtitles)?;
    let store = DirectoryClipStore::open(&source.clips, &stem)?.with_prefix(&config.clip_prefix);

    Ok(Session {
        config,
        cues,
        store,
        stem,
    })
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| DubError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        })
}

/// Take the reference duration from the flag, or from the reference file
pub fn resolve_reference(duration_ms: Option<u64>, reference: Option<&Path>) -> Result<Duration> {
    let duration = match (duration_ms, reference) {
        (Some(ms), _) => Duration::from_millis(ms),
        (None, Some(path)) => probe_duration(path)?,
        (None, None) => Duration::ZERO,
    };

    if duration.is_zero() {
        return Err(DubError::InvalidReferenceDuration { duration_ms: 0 });
    }
    Ok(duration)
}

/// Render the composite track and export it.
pub fn render(args: &RenderArgs) -> Result<PathBuf> {
    let reference = resolve_reference(args.duration_ms, args.reference.as_deref())?;
    let mut session = open_session(&args.source)?;
    if args.sequential {
        session.config.parallel = false;
    }

    info!(
        "Rendering {} cues from {} ({} clip(s) on disk)",
        session.cues.len(),
        args.source.subtitles.display(),
        session.store.available_indices()?.len()
    );

    let exporter = WavExporter::new(session.config.export);
    let builder = TimelineBuilder::new(session.config);
    let render = builder.render(reference, &session.cues, &session.store)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| session.store.dir().join(format!("final_{}.wav", session.stem)));
    let summary = exporter.export(&render.track, &output)?;

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&render.report)?;
        std::fs::write(report_path, json)?;
        info!("Report written to {}", report_path.display());
    }

    println!("Track written: {}", summary.path.display());
    println!(
        "Duration: {}ms, cues placed: {}, skipped: {}",
        render.track.duration().as_millis(),
        render.report.placed.len(),
        render.report.skipped.len()
    );
    for skipped in &render.report.skipped {
        println!("  cue {}: {}", skipped.index, skipped.reason);
    }

    Ok(summary.path)
}

/// List cues with their windows and whether a clip exists.
pub fn inspect(args: &InspectArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let available = session.store.available_indices()?;

    println!("Cues for '{}':", session.stem);
    println!("{:-<60}", "");

    for cue in &session.cues {
        let marker = if available.contains(&cue.index) {
            "clip"
        } else {
            "----"
        };
        let first_line = cue.text.lines().next().unwrap_or("");
        println!("{} {} {}", marker, cue, first_line);
    }

    let with_clip = session
        .cues
        .iter()
        .filter(|c| available.contains(&c.index))
        .count();
    println!("{:-<60}", "");
    println!("{}/{} cues have a clip", with_clip, session.cues.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::io::{export_audio, generate_test_tone, import_clip, ExportFormat};
    use tempfile::tempdir;

    const SRT: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello\n\n2\n00:00:02,000 --> 00:00:03,000\nWorld\n";

    fn source(dir: &Path) -> SourceArgs {
        let subtitles = dir.join("movie.srt");
        std::fs::write(&subtitles, SRT).unwrap();
        SourceArgs {
            subtitles,
            clips: dir.to_path_buf(),
            stem: None,
            config: None,
        }
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(
            resolve_reference(Some(5000), None).unwrap(),
            Duration::from_millis(5000)
        );
        assert!(resolve_reference(Some(0), None).unwrap_err().is_fatal());
        assert!(resolve_reference(None, None).is_err());
    }

    #[test]
    fn test_render_command_writes_track_and_report() {
        let dir = tempdir().unwrap();
        let tone = generate_test_tone(440.0, 2.0, 16000);
        export_audio(&tone, &dir.path().join("tts_movie_1.wav"), ExportFormat::new(16000, 16))
            .unwrap();

        let report = dir.path().join("report.json");
        let args = RenderArgs {
            source: source(dir.path()),
            duration_ms: Some(4000),
            reference: None,
            output: None,
            report: Some(report.clone()),
            sequential: true,
        };

        let output = render(&args).unwrap();
        assert_eq!(output, dir.path().join("final_movie.wav"));

        let track = import_clip(&output).unwrap();
        assert_eq!(track.num_samples(), 4 * 48000);
        assert_eq!(track.num_channels(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["placed"][0]["index"], 1);
        assert_eq!(json["skipped"][0]["index"], 2);
    }

    #[test]
    fn test_render_command_uses_reference_file() {
        let dir = tempdir().unwrap();
        let reference = dir.path().join("reference.wav");
        export_audio(
            &generate_test_tone(100.0, 3.5, 8000),
            &reference,
            ExportFormat::new(8000, 16),
        )
        .unwrap();

        let args = RenderArgs {
            source: source(dir.path()),
            duration_ms: None,
            reference: Some(reference),
            output: Some(dir.path().join("out.wav")),
            report: None,
            sequential: false,
        };

        let output = render(&args).unwrap();
        assert_eq!(import_clip(&output).unwrap().num_samples(), 3 * 48000 + 24000);
    }

    #[test]
    fn test_render_command_missing_clip_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let mut source = source(dir.path());
        source.clips = dir.path().join("missing");

        let args = RenderArgs {
            source,
            duration_ms: Some(1000),
            reference: None,
            output: None,
            report: None,
            sequential: false,
        };
        assert!(matches!(
            render(&args),
            Err(DubError::ClipStoreUnreadable { .. })
        ));
    }

    #[test]
    fn test_inspect_command() {
        let dir = tempdir().unwrap();
        assert!(inspect(&InspectArgs {
            source: source(dir.path())
        })
        .is_ok());
    }
}
