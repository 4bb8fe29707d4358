//! Conversions between Hz, fractional MIDI semitones and note names (A4 = 440 Hz = 69).

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn hz_to_midi(frequency: f32) -> f32 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2f32.powf((midi - 69.0) / 12.0)
}

/// Round a fractional semitone to a valid MIDI key.
pub fn midi_key(midi: f32) -> u8 {
    midi.round().clamp(0.0, 127.0) as u8
}

/// Scientific pitch name of the nearest key, e.g. `A4` or `C#3`.
pub fn note_name(midi: f32) -> String {
    let key = midi.round() as i32;
    let octave = key.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[key.rem_euclid(12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a() {
        assert_eq!(hz_to_midi(440.0), 69.0);
        assert_eq!(midi_to_hz(69.0), 440.0);
        assert_eq!(note_name(69.0), "A4");
    }

    #[test]
    fn octaves_are_twelve_semitones() {
        assert!((hz_to_midi(220.0) - 57.0).abs() < 1e-4);
        assert!((midi_to_hz(81.0) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn names_round_to_the_nearest_key() {
        assert_eq!(note_name(60.4), "C4");
        assert_eq!(note_name(60.6), "C#4");
        assert_eq!(note_name(0.0), "C-1");
    }

    #[test]
    fn keys_are_clamped() {
        assert_eq!(midi_key(-3.0), 0);
        assert_eq!(midi_key(140.0), 127);
        assert_eq!(midi_key(61.5), 62);
    }
}
