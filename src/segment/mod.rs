//! Note segmentation: turning a pitch contour into discrete note events.
//!
//! Voiced frames are grouped into notes while their pitch stays within
//! `split_semitone_threshold` of the running median of the note. A larger jump starts
//! a new note, and an unvoiced stretch longer than `unvoiced_grace_period` ends one.
//! Notes shorter than `min_note_duration` are discarded.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::PitchResult;
use crate::utils::tuning::{hz_to_midi, midi_key, note_name};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Largest deviation, in semitones, from the note's median before a new note starts.
    pub split_semitone_threshold: f32,
    /// Shortest note kept, in seconds.
    pub min_note_duration: f32,
    /// Longest unvoiced gap bridged inside a note, in seconds.
    pub unvoiced_grace_period: f32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            split_semitone_threshold: 0.8,
            min_note_duration: 0.05,
            unvoiced_grace_period: 0.02,
        }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.split_semitone_threshold > 0.0 && self.split_semitone_threshold.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "split_semitone_threshold must be positive, got {}",
                self.split_semitone_threshold
            )));
        }
        if !(self.min_note_duration >= 0.0 && self.min_note_duration.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "min_note_duration must be non-negative, got {}",
                self.min_note_duration
            )));
        }
        if !(self.unvoiced_grace_period >= 0.0 && self.unvoiced_grace_period.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "unvoiced_grace_period must be non-negative, got {}",
                self.unvoiced_grace_period
            )));
        }
        Ok(())
    }
}

/// A note event. `end` is always greater than `start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub start: f32,
    pub end: f32,
    /// Median frequency of the note's frames, in Hz.
    pub pitch_hz: f32,
    /// Median pitch of the note's frames, in fractional MIDI semitones.
    pub midi_pitch: f32,
}

impl Note {
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    pub fn midi_key(&self) -> u8 {
        midi_key(self.midi_pitch)
    }

    pub fn name(&self) -> String {
        note_name(self.midi_pitch)
    }
}

/// Frames collected for the note currently being built.
struct OpenNote {
    start: f32,
    last_voiced: f32,
    hz: Vec<f32>,
    /// Kept sorted so the running median is a lookup.
    semitones: Vec<f32>,
}

impl OpenNote {
    fn new(time: f32, hz: f32, semitone: f32) -> Self {
        OpenNote {
            start: time,
            last_voiced: time,
            hz: vec![hz],
            semitones: vec![semitone],
        }
    }

    fn push(&mut self, time: f32, hz: f32, semitone: f32) {
        self.last_voiced = time;
        self.hz.push(hz);
        let at = match self.semitones.binary_search_by(|s| s.total_cmp(&semitone)) {
            Ok(i) | Err(i) => i,
        };
        self.semitones.insert(at, semitone);
    }

    fn median_semitone(&self) -> f32 {
        median_of_sorted(&self.semitones)
    }

    fn close(self, hop: f32) -> Note {
        Note {
            start: self.start,
            end: self.last_voiced + hop,
            pitch_hz: median(self.hz),
            midi_pitch: median_of_sorted(&self.semitones),
        }
    }
}

fn median(mut values: Vec<f32>) -> f32 {
    values.sort_by(f32::total_cmp);
    median_of_sorted(&values)
}

fn median_of_sorted(values: &[f32]) -> f32 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Close `note` into `segments`. The previous note is cut at the start of this one, so
/// notes never overlap even when the hop is longer than the gap between them.
fn push_closed(segments: &mut Vec<Note>, note: OpenNote, hop: f32) {
    let note = note.close(hop);
    if let Some(prev) = segments.last_mut() {
        prev.end = prev.end.min(note.start);
    }
    segments.push(note);
}

/// Group the voiced frames of `result` into time-ordered, non-overlapping notes.
pub fn segment_notes(result: &PitchResult, config: &SegmentConfig) -> Result<Vec<Note>> {
    config.validate()?;

    let hop = result.hop_duration();
    let mut segments = Vec::new();
    let mut open: Option<OpenNote> = None;

    for frame in result.frames() {
        if !frame.voiced || frame.pitch_hz <= 0.0 {
            if let Some(note) = open.take() {
                if frame.time - note.last_voiced > config.unvoiced_grace_period {
                    push_closed(&mut segments, note, hop);
                } else {
                    open = Some(note);
                }
            }
            continue;
        }

        let semitone = hz_to_midi(frame.pitch_hz);
        open = Some(match open.take() {
            Some(mut note) => {
                if (semitone - note.median_semitone()).abs() > config.split_semitone_threshold {
                    push_closed(&mut segments, note, hop);
                    OpenNote::new(frame.time, frame.pitch_hz, semitone)
                } else {
                    note.push(frame.time, frame.pitch_hz, semitone);
                    note
                }
            }
            None => OpenNote::new(frame.time, frame.pitch_hz, semitone),
        });
    }
    if let Some(note) = open {
        push_closed(&mut segments, note, hop);
    }

    let found = segments.len();
    let notes: Vec<Note> = segments
        .into_iter()
        .filter(|note| note.duration() >= config.min_note_duration)
        .collect();
    debug!(
        "Segmented {} notes, dropped {} shorter than {} s",
        notes.len(),
        found - notes.len(),
        config.min_note_duration
    );

    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOP: f32 = 0.01;

    /// A pitch series at a 10 ms hop; `None` marks an unvoiced frame.
    fn contour(pitches: &[Option<f32>]) -> PitchResult {
        let n = pitches.len();
        PitchResult::from_parts(
            pitches.iter().map(|p| p.unwrap_or(0.0)).collect(),
            pitches.iter().map(|p| if p.is_some() { 0.95 } else { 0.1 }).collect(),
            (0..n).map(|i| i as f32 * HOP).collect(),
            pitches.iter().map(Option::is_some).collect(),
            HOP,
        )
        .unwrap()
    }

    fn repeat(pitch: Option<f32>, frames: usize) -> Vec<Option<f32>> {
        vec![pitch; frames]
    }

    #[test]
    fn pitch_jump_splits_notes() {
        let mut pitches = repeat(Some(440.0), 10);
        pitches.extend(repeat(Some(493.88), 10));
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].midi_key(), 69);
        assert_eq!(notes[1].midi_key(), 71);
        assert_eq!(notes[0].start, 0.0);
        assert!((notes[0].end - 0.1).abs() < 1e-6);
        assert!(notes[0].end <= notes[1].start + 1e-6);
        assert_eq!(notes[1].name(), "B4");
    }

    #[test]
    fn vibrato_stays_one_note() {
        let pitches: Vec<Option<f32>> = (0..30)
            .map(|i| Some(440.0 * 2f32.powf(0.3 * (i as f32 * 0.7).sin() / 12.0)))
            .collect();
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].midi_key(), 69);
    }

    #[test]
    fn short_gaps_are_bridged() {
        let mut pitches = repeat(Some(220.0), 10);
        pitches.extend(repeat(None, 1));
        pitches.extend(repeat(Some(220.0), 10));
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].duration() - 0.21).abs() < 1e-5);
    }

    #[test]
    fn long_gaps_end_notes() {
        let mut pitches = repeat(Some(220.0), 10);
        pitches.extend(repeat(None, 5));
        pitches.extend(repeat(Some(220.0), 10));
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].end < notes[1].start);
    }

    #[test]
    fn short_notes_are_dropped() {
        let mut pitches = repeat(Some(220.0), 3);
        pitches.extend(repeat(None, 5));
        pitches.extend(repeat(Some(330.0), 8));
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].midi_key(), 64);
    }

    #[test]
    fn silence_has_no_notes() {
        let notes = segment_notes(&contour(&repeat(None, 20)), &SegmentConfig::default()).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SegmentConfig {
            split_semitone_threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            segment_notes(&contour(&[]), &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn median_of_even_count_is_the_midpoint() {
        assert_eq!(median(vec![3.0, 1.0, 4.0, 2.0]), 2.5);
        assert_eq!(median(vec![5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn running_median_tracks_inserts() {
        let mut note = OpenNote::new(0.0, 440.0, 69.0);
        for (i, semitone) in [69.4, 68.8, 69.2, 68.9].into_iter().enumerate() {
            note.push(i as f32 * HOP, 440.0, semitone);
        }
        assert_eq!(note.semitones, vec![68.8, 68.9, 69.0, 69.2, 69.4]);
        assert_eq!(note.median_semitone(), 69.0);
    }

    #[test]
    fn notes_never_overlap_when_frames_are_closer_than_the_hop() {
        // Frames slightly closer together than the hop, inside its tolerance.
        let spacing = HOP * 0.995;
        let mut pitches = repeat(Some(220.0), 10);
        pitches.extend(repeat(Some(330.0), 10));
        let n = pitches.len();
        let result = PitchResult::from_parts(
            pitches.iter().map(|p| p.unwrap_or(0.0)).collect(),
            vec![0.95; n],
            (0..n).map(|i| i as f32 * spacing).collect(),
            vec![true; n],
            HOP,
        )
        .unwrap();

        let notes = segment_notes(&result, &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].end <= notes[1].start, "{:?}", notes);
        assert!(notes[0].end > notes[0].start);
    }

    #[test]
    fn long_notes_segment_quickly() {
        // Ten minutes of one sustained pitch.
        let pitches = repeat(Some(261.63), 37_500);
        let notes = segment_notes(&contour(&pitches), &SegmentConfig::default()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].name(), "C4");
    }
}
