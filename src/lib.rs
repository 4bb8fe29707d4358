//! # Pitch Notes
//! *pitch_notes* tracks the fundamental frequency of a monophonic recording, splits the
//! resulting contour into notes and exports both as CSV and MIDI.
//!
//! # Pipeline
//! Data flows one way: audio → [PitchResult] → [Note]s → files.
//!
//!   * [PitchTracker][tracker::PitchTracker] resamples audio to 16 kHz and runs a frame
//!     detector every 16 ms, producing a [PitchResult] of timestamps, frequencies,
//!     confidences and voicing flags.
//!   * [segment_notes][segment::segment_notes] groups voiced, pitch-stable frames into notes.
//!   * [export] writes the pitch series and the notes.
//!
//! # Detectors
//! A *detector* estimates the pitch of a single frame. The tracker can use either:
//!
//!   * [YINDetector][detector::yin] (default)
//!   * [McLeodDetector][detector::mcleod]
//!
//! # Examples
//! ```no_run
//! use pitch_notes::export::{export_to_csv, export_to_midi, MidiExportOptions};
//! use pitch_notes::segment::{segment_notes, SegmentConfig};
//! use pitch_notes::tracker::{PitchTracker, TrackerConfig};
//!
//! fn main() -> pitch_notes::Result<()> {
//!     // For speech analysis, consider fmin = 65 and fmax = 400.
//!     let mut tracker = PitchTracker::new(TrackerConfig {
//!         fmin: 46.875,
//!         fmax: 2093.75,
//!         confidence_threshold: 0.9,
//!         ..Default::default()
//!     })?;
//!     let result = tracker.detect_from_file("recorded_samples.wav")?;
//!     export_to_csv(&result, "pitch_data.csv")?;
//!
//!     let notes = segment_notes(
//!         &result,
//!         &SegmentConfig {
//!             split_semitone_threshold: 0.8,
//!             min_note_duration: 0.05,
//!             ..Default::default()
//!         },
//!     )?;
//!     export_to_midi(&notes, "notes.mid", &MidiExportOptions::default())?;
//!     Ok(())
//! }
//! ```

pub use detector::internals::Pitch;
pub use error::{Error, Result};
pub use result::{Frame, PitchResult, PitchStats};
pub use segment::Note;

pub mod audio;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod float;
pub mod result;
pub mod segment;
pub mod tracker;
pub mod utils;
