//! Track the pitch of a WAV file, segment it into notes and export the results.
//!
//! ```text
//! pitch-notes <audio.wav> [--fmin HZ] [--fmax HZ] [--confidence-threshold X]
//!             [--algorithm yin|mcleod] [--split-semitones X] [--min-note-duration S]
//!             [--config FILE] [--output-dir DIR] [--debug]
//! ```
//!
//! Writes `pitch_data.csv`, `notes.csv` and `notes.mid` to the output directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use log::{info, warn};

use pitch_notes::config::PipelineConfig;
use pitch_notes::detector::Algorithm;
use pitch_notes::export::{export_notes_to_csv, export_to_csv, export_to_midi};
use pitch_notes::segment::segment_notes;
use pitch_notes::tracker::PitchTracker;

const USAGE: &str = "Usage: pitch-notes <audio.wav> [--fmin HZ] [--fmax HZ] \
[--confidence-threshold X] [--algorithm yin|mcleod] [--split-semitones X] \
[--min-note-duration S] [--config FILE] [--output-dir DIR] [--debug]";

fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_arg<T>(args: &[String], name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match arg_value(args, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value `{raw}` for {name}: {e}")),
        None => Ok(None),
    }
}

fn build_config(args: &[String]) -> anyhow::Result<PipelineConfig> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => PipelineConfig::default(),
    };

    if let Some(fmin) = parse_arg(args, "--fmin")? {
        config.tracker.fmin = fmin;
    }
    if let Some(fmax) = parse_arg(args, "--fmax")? {
        config.tracker.fmax = fmax;
    }
    if let Some(threshold) = parse_arg(args, "--confidence-threshold")? {
        config.tracker.confidence_threshold = threshold;
    }
    if let Some(algorithm) = parse_arg::<Algorithm>(args, "--algorithm")? {
        config.tracker.algorithm = algorithm;
    }
    if let Some(split) = parse_arg(args, "--split-semitones")? {
        config.segmentation.split_semitone_threshold = split;
    }
    if let Some(duration) = parse_arg(args, "--min-note-duration")? {
        config.segmentation.min_note_duration = duration;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1].starts_with("--") {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }
    let audio_file = Path::new(&args[1]);
    let debug_mode = args.iter().any(|a| a == "--debug");

    let filter = if debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = build_config(&args)?;
    let output_dir = PathBuf::from(arg_value(&args, "--output-dir").unwrap_or("."));
    if !output_dir.is_dir() {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
    }

    let mut tracker = PitchTracker::new(config.tracker.clone())?;
    let settings = tracker.config();
    info!("Audio file: {}", audio_file.display());
    info!(
        "Frequency range: {} - {} Hz, confidence threshold {}, {:?}",
        settings.fmin, settings.fmax, settings.confidence_threshold, settings.algorithm
    );

    let result = tracker
        .detect_from_file(audio_file)
        .with_context(|| format!("pitch detection failed for {}", audio_file.display()))?;

    println!("Total frames: {}", result.len());
    match result.stats() {
        Some(stats) => println!("{stats}"),
        None => println!("No voiced frames"),
    }

    export_to_csv(&result, output_dir.join("pitch_data.csv"))?;

    let notes = segment_notes(&result, &config.segmentation)?;
    if notes.is_empty() {
        warn!("No notes found in {}", audio_file.display());
    }

    println!("\n{} notes:", notes.len());
    println!("{:>10}{:>10}{:>12}{:>6}", "Start (s)", "End (s)", "Pitch (Hz)", "Note");
    for note in &notes {
        println!(
            "{:>10.3}{:>10.3}{:>12.2}{:>6}",
            note.start,
            note.end,
            note.pitch_hz,
            note.name()
        );
    }

    export_notes_to_csv(&notes, output_dir.join("notes.csv"))?;
    export_to_midi(&notes, output_dir.join("notes.mid"), &config.midi)?;

    Ok(())
}
