//! Writers for the artifacts of a pipeline run: the pitch series and notes as CSV, and
//! notes as a Standard MIDI File.
pub mod csv;
pub mod midi;

pub use self::csv::{export_notes_to_csv, export_to_csv};
pub use self::midi::{export_to_midi, read_midi_notes, MidiExportOptions, MidiNote};
