use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::export::MidiExportOptions;
use crate::segment::SegmentConfig;
use crate::tracker::TrackerConfig;

/// Options for every stage of the pipeline. Missing sections and fields keep their
/// defaults, so a file only needs to name what it changes:
///
/// ```json
/// { "tracker": { "fmin": 65.0, "fmax": 400.0 }, "segmentation": { "min_note_duration": 0.1 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub segmentation: SegmentConfig,
    pub midi: MidiExportOptions,
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.segmentation.validate()?;
        self.midi.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Algorithm;
    use crate::error::Error;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn sections_override_independently() {
        let config = PipelineConfig::from_json(
            r#"{
                "tracker": { "confidence_threshold": 0.8, "algorithm": "yin" },
                "segmentation": { "split_semitone_threshold": 0.5 },
                "midi": { "tempo_bpm": 100.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.tracker.confidence_threshold, 0.8);
        assert_eq!(config.tracker.algorithm, Algorithm::Yin);
        assert_eq!(config.segmentation.split_semitone_threshold, 0.5);
        assert_eq!(config.segmentation.min_note_duration, 0.05);
        assert_eq!(config.midi.tempo_bpm, 100.0);
        assert_eq!(config.midi.ppq, 480);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_a_config_file_error() {
        assert!(matches!(
            PipelineConfig::from_json("{ tracker: }"),
            Err(Error::ConfigFile(_))
        ));
    }

    #[test]
    fn validation_reaches_every_section() {
        let mut config = PipelineConfig::default();
        config.midi.velocity = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
