//! CSV export of pitch series and notes.
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::result::PitchResult;
use crate::segment::Note;

pub const PITCH_HEADER: &str = "timestamp,pitch_hz,confidence,voiced";
pub const NOTES_HEADER: &str = "start,end,duration,pitch_hz,midi_pitch,midi_key,note_name";

/// One row of the notes table, in `NOTES_HEADER` order.
#[derive(Serialize)]
struct NoteRow {
    start: f32,
    end: f32,
    duration: f32,
    pitch_hz: f32,
    midi_pitch: f32,
    midi_key: u8,
    note_name: String,
}

impl From<&Note> for NoteRow {
    fn from(note: &Note) -> Self {
        NoteRow {
            start: note.start,
            end: note.end,
            duration: note.duration(),
            pitch_hz: note.pitch_hz,
            midi_pitch: note.midi_pitch,
            midi_key: note.midi_key(),
            note_name: note.name(),
        }
    }
}

/// Write one row per frame of `result` to `path`.
pub fn export_to_csv<P: AsRef<Path>>(result: &PitchResult, path: P) -> Result<()> {
    let path = path.as_ref();
    write_pitch_csv(result, &mut File::create(path)?)?;
    info!("Wrote {} frames to {}", result.len(), path.display());
    Ok(())
}

pub fn write_pitch_csv<W: Write>(result: &PitchResult, out: &mut W) -> Result<()> {
    // The header is written explicitly so an empty series still gets one.
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(PITCH_HEADER.split(','))?;
    for frame in result.frames() {
        writer.serialize(frame)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per note to `path`.
pub fn export_notes_to_csv<P: AsRef<Path>>(notes: &[Note], path: P) -> Result<()> {
    let path = path.as_ref();
    write_notes_csv(notes, &mut File::create(path)?)?;
    info!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}

pub fn write_notes_csv<W: Write>(notes: &[Note], out: &mut W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(NOTES_HEADER.split(','))?;
    for note in notes {
        writer.serialize(NoteRow::from(note))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_rows_follow_the_header() {
        let result = PitchResult::from_parts(
            vec![0.0, 220.5],
            vec![0.25, 0.5],
            vec![0.5, 1.0],
            vec![false, true],
            0.5,
        )
        .unwrap();
        let mut out = Vec::new();
        write_pitch_csv(&result, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "timestamp,pitch_hz,confidence,voiced\n0.5,0.0,0.25,false\n1.0,220.5,0.5,true\n"
        );
    }

    #[test]
    fn note_rows_include_key_and_name() {
        let notes = vec![Note {
            start: 0.5,
            end: 1.5,
            pitch_hz: 440.0,
            midi_pitch: 69.0,
        }];
        let mut out = Vec::new();
        write_notes_csv(&notes, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(NOTES_HEADER));
        assert_eq!(lines.next(), Some("0.5,1.5,1.0,440.0,69.0,69,A4"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_tables_keep_their_header() {
        let mut out = Vec::new();
        write_notes_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{NOTES_HEADER}\n"));
    }

    #[test]
    fn note_table_reads_back() {
        let notes = vec![
            Note {
                start: 0.25,
                end: 0.75,
                pitch_hz: 261.63,
                midi_pitch: 60.0,
            },
            Note {
                start: 1.0,
                end: 1.125,
                pitch_hz: 466.16,
                midi_pitch: 70.0,
            },
        ];
        let mut out = Vec::new();
        write_notes_csv(&notes, &mut out).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>().join(","), NOTES_HEADER);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][5], "70");
        assert_eq!(&rows[1][6], "A#4");
        assert_eq!(rows[0][2].parse::<f32>().unwrap(), 0.5);
    }
}
