//! MIDI export of note events using the midly crate, plus the reverse direction so
//! exported files can be checked.

use std::fs;
use std::path::Path;

use log::info;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::segment::Note;

/// Longest quarter note a tempo meta event can hold, in microseconds.
const MAX_MICROSECONDS_PER_QUARTER: f64 = 0xFF_FFFF as f64;

/// MIDI export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note
    pub ppq: u16,
    pub tempo_bpm: f64,
    pub velocity: u8,
    /// Zero-based MIDI channel
    pub channel: u8,
    pub track_name: String,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            tempo_bpm: 120.0,
            velocity: 100,
            channel: 0,
            track_name: "Pitch".to_string(),
        }
    }
}

impl MidiExportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.ppq == 0 || self.ppq > 0x7fff {
            return Err(Error::InvalidConfig(format!(
                "ppq must be in 1..=32767, got {}",
                self.ppq
            )));
        }
        if !(self.tempo_bpm > 0.0 && self.tempo_bpm.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "tempo_bpm must be positive, got {}",
                self.tempo_bpm
            )));
        }
        if (60_000_000.0 / self.tempo_bpm).round() > MAX_MICROSECONDS_PER_QUARTER {
            return Err(Error::InvalidConfig(format!(
                "tempo_bpm must be at least {:.3}, got {}",
                60_000_000.0 / MAX_MICROSECONDS_PER_QUARTER,
                self.tempo_bpm
            )));
        }
        if self.velocity == 0 || self.velocity > 127 {
            return Err(Error::InvalidConfig(format!(
                "velocity must be in 1..=127, got {}",
                self.velocity
            )));
        }
        if self.channel > 15 {
            return Err(Error::InvalidConfig(format!(
                "channel must be in 0..=15, got {}",
                self.channel
            )));
        }
        Ok(())
    }

    fn ticks_per_second(&self) -> f64 {
        self.ppq as f64 * self.tempo_bpm / 60.0
    }

    fn microseconds_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.tempo_bpm).round() as u32
    }
}

/// A note read back from a MIDI file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiNote {
    pub start: f64,
    pub end: f64,
    pub key: u8,
    pub velocity: u8,
}

/// Write `notes` to a Standard MIDI File at `path`.
pub fn export_to_midi<P: AsRef<Path>>(
    notes: &[Note],
    path: P,
    options: &MidiExportOptions,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = notes_to_midi_bytes(notes, options)?;
    fs::write(path, bytes)?;
    info!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}

/// Encode `notes` as a single-track Standard MIDI File.
pub fn notes_to_midi_bytes(notes: &[Note], options: &MidiExportOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let ticks_per_second = options.ticks_per_second();
    let channel = u4::from(options.channel);
    let velocity = u7::from(options.velocity);

    let mut events: Vec<(u32, TrackEventKind)> = Vec::with_capacity(2 * notes.len());
    for note in notes {
        let key = u7::from(note.midi_key());
        let tick_on = seconds_to_ticks(note.start, ticks_per_second)?;
        let tick_off = seconds_to_ticks(note.end, ticks_per_second)?.max(tick_on.saturating_add(1));
        events.push((
            tick_on,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel: velocity },
            },
        ));
        events.push((
            tick_off,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::from(0),
                },
            },
        ));
    }
    // Stable sort; at equal ticks a note ends before the next one starts.
    events.sort_by_key(|(tick, kind)| (*tick, !is_note_off(kind)));

    let mut track = Track::new();
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(options.track_name.as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(
            options.microseconds_per_quarter(),
        ))),
    });

    let mut last_tick = 0;
    for (tick, kind) in events {
        let delta = tick - last_tick;
        if delta > u28::max_value().as_int() {
            return Err(Error::Midi(format!(
                "{delta} ticks between events at tick {last_tick} and {tick} exceed a delta-time"
            )));
        }
        track.push(TrackEvent {
            delta: u28::from(delta),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::from(options.ppq))),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| Error::Midi(format!("failed to write MIDI: {e}")))?;
    Ok(bytes)
}

fn seconds_to_ticks(seconds: f32, ticks_per_second: f64) -> Result<u32> {
    let ticks = (seconds.max(0.0) as f64 * ticks_per_second).round();
    if !(ticks <= u32::MAX as f64) {
        return Err(Error::Midi(format!(
            "note time {seconds} s does not fit in a MIDI track"
        )));
    }
    Ok(ticks as u32)
}

fn is_note_off(kind: &TrackEventKind) -> bool {
    matches!(
        kind,
        TrackEventKind::Midi {
            message: MidiMessage::NoteOff { .. },
            ..
        }
    )
}

/// Decode the notes of a Standard MIDI File with metrical timing. Tempo changes are
/// honoured; a NoteOn with velocity 0 ends a note.
pub fn read_midi_notes(bytes: &[u8]) -> Result<Vec<MidiNote>> {
    let smf = Smf::parse(bytes).map_err(|e| Error::Midi(format!("failed to parse MIDI: {e}")))?;
    let ppq = match smf.header.timing {
        Timing::Metrical(ppq) => ppq.as_int() as f64,
        Timing::Timecode(..) => {
            return Err(Error::Midi("timecode-based MIDI files are not supported".into()))
        }
    };

    let mut notes = Vec::new();
    for track in &smf.tracks {
        let mut seconds = 0.0;
        // 120 bpm until the file says otherwise.
        let mut seconds_per_tick = 0.5 / ppq;
        let mut sounding: Vec<(u8, u8, f64)> = Vec::new();

        for event in track {
            seconds += event.delta.as_int() as f64 * seconds_per_tick;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                    seconds_per_tick = us.as_int() as f64 / 1_000_000.0 / ppq;
                }
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, vel },
                    ..
                } if vel.as_int() > 0 => sounding.push((key.as_int(), vel.as_int(), seconds)),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. },
                    ..
                } => {
                    if let Some(i) = sounding.iter().position(|n| n.0 == key.as_int()) {
                        let (key, velocity, start) = sounding.remove(i);
                        notes.push(MidiNote {
                            start,
                            end: seconds,
                            key,
                            velocity,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    notes.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(notes)
}
