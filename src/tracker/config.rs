use serde::{Deserialize, Serialize};

use crate::detector::{mcleod, yin, Algorithm};
use crate::error::{Error, Result};

/// Analysis sample rate. Input is resampled to this rate before framing.
pub const TARGET_SAMPLE_RATE: u32 = 16000;
/// Distance between frame starts, in samples at [TARGET_SAMPLE_RATE].
pub const HOP_LENGTH: usize = 256;
pub const FRAME_LENGTH: usize = 1024;
/// Zeros added on both sides of the signal so the first frame is centred near t = 0.
pub const FRAME_PADDING: usize = (FRAME_LENGTH - HOP_LENGTH) / 2;
/// Shorter input is zero padded to this length and yields a single frame.
pub const MIN_AUDIO_LENGTH: usize = 256;
/// Centre of frame 0 relative to the start of the unpadded signal, in samples.
pub const CENTER_OFFSET: f32 = (FRAME_LENGTH - 1) as f32 / 2.0 - FRAME_PADDING as f32;

/// Lowest and highest frequencies the tracker can report.
pub const MIN_FREQUENCY: f32 = 46.875;
pub const MAX_FREQUENCY: f32 = 2093.75;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.9;
pub const DEFAULT_POWER_THRESHOLD: f32 = 1e-3;

/// Options for [PitchTracker](super::PitchTracker). A frame is voiced when its confidence
/// is above `confidence_threshold` and its pitch is within `fmin ..= fmax`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub fmin: f32,
    pub fmax: f32,
    pub confidence_threshold: f32,
    pub algorithm: Algorithm,
    /// Frames whose sum of squared samples is below this are treated as silence.
    pub power_threshold: f32,
    /// Absolute threshold on YIN's normalized difference.
    pub yin_threshold: f32,
    /// Fraction of the highest NSDF key maximum a candidate needs for McLeod.
    pub mcleod_cutoff: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            fmin: MIN_FREQUENCY,
            fmax: MAX_FREQUENCY,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            algorithm: Algorithm::default(),
            power_threshold: DEFAULT_POWER_THRESHOLD,
            yin_threshold: yin::DEFAULT_THRESHOLD,
            mcleod_cutoff: mcleod::DEFAULT_CUTOFF,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid(format!(
                "confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )));
        }
        if !(self.fmin >= MIN_FREQUENCY) {
            return Err(invalid(format!(
                "fmin {} is below the supported minimum of {MIN_FREQUENCY} Hz",
                self.fmin
            )));
        }
        if !(self.fmax <= MAX_FREQUENCY) {
            return Err(invalid(format!(
                "fmax {} is above the supported maximum of {MAX_FREQUENCY} Hz",
                self.fmax
            )));
        }
        if self.fmin > self.fmax {
            return Err(invalid(format!(
                "fmin {} cannot be greater than fmax {}",
                self.fmin, self.fmax
            )));
        }
        if !(self.power_threshold >= 0.0) {
            return Err(invalid(format!(
                "power_threshold must be non-negative, got {}",
                self.power_threshold
            )));
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold < 1.0) {
            return Err(invalid(format!(
                "yin_threshold must be in (0, 1), got {}",
                self.yin_threshold
            )));
        }
        if !(self.mcleod_cutoff > 0.0 && self.mcleod_cutoff <= 1.0) {
            return Err(invalid(format!(
                "mcleod_cutoff must be in (0, 1], got {}",
                self.mcleod_cutoff
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_constants() {
        assert_eq!(FRAME_PADDING, 384);
        assert_eq!(CENTER_OFFSET, 127.5);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let cases = [
            TrackerConfig {
                confidence_threshold: 1.5,
                ..Default::default()
            },
            TrackerConfig {
                fmin: 20.0,
                ..Default::default()
            },
            TrackerConfig {
                fmax: 4000.0,
                ..Default::default()
            },
            TrackerConfig {
                fmin: 500.0,
                fmax: 400.0,
                ..Default::default()
            },
            TrackerConfig {
                fmin: f32::NAN,
                ..Default::default()
            },
            TrackerConfig {
                yin_threshold: 0.0,
                ..Default::default()
            },
            TrackerConfig {
                mcleod_cutoff: 1.5,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "fmin": 65.0, "fmax": 400.0, "algorithm": "mcleod" }"#)
                .unwrap();
        assert_eq!(config.fmin, 65.0);
        assert_eq!(config.fmax, 400.0);
        assert_eq!(config.algorithm, Algorithm::McLeod);
        assert_eq!(config.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
    }
}
