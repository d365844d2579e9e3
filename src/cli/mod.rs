//! CLI Module
//!
//! Command-line interface for rendering dub tracks.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dubtrack - render subtitle-aligned voice clips into one audio track
#[derive(Parser, Debug)]
#[command(name = "dubtrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the composite track
    #[command(name = "render")]
    Render(RenderArgs),

    /// List cues and which of them have a clip
    #[command(name = "inspect")]
    Inspect(InspectArgs),
}

/// Where cues and clips come from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// SubRip subtitle file
    pub subtitles: PathBuf,

    /// Directory holding per-cue clips (<prefix>_<stem>_<index>.wav)
    #[arg(short, long)]
    pub clips: PathBuf,

    /// Media name used in clip file names (defaults to the subtitle file stem)
    #[arg(short, long)]
    pub stem: Option<String>,

    /// JSON render configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Length of the output track in milliseconds
    #[arg(short, long, required_unless_present = "reference", conflicts_with = "reference")]
    pub duration_ms: Option<u64>,

    /// WAV file whose length the output track should match
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Output WAV path (defaults to final_<stem>.wav in the clip directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a JSON render report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Stretch clips one at a time instead of in parallel
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
