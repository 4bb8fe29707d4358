//! The pitch series produced by a [PitchTracker](crate::tracker::PitchTracker).
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// One frame of a [PitchResult].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// Centre of the analysis frame, in seconds.
    pub time: f32,
    /// Estimated F0 in Hz, or [PitchResult::UNVOICED_HZ] when the frame had no estimate.
    pub pitch_hz: f32,
    pub confidence: f32,
    pub voiced: bool,
}

/// A time series of pitch estimates at a fixed hop. The series can't be modified once
/// built; every frame has a timestamp, a frequency, a confidence and a voicing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchResult {
    pitch_hz: Vec<f32>,
    confidence: Vec<f32>,
    timestamps: Vec<f32>,
    voicing: Vec<bool>,
    hop_duration: f32,
}

impl PitchResult {
    /// Frequency reported for frames where the detector found nothing (e.g. silence).
    pub const UNVOICED_HZ: f32 = 0.0;

    /// Assemble a result from parallel columns, checking that they describe a valid
    /// series: equal lengths, strictly increasing timestamps spaced `hop_duration`
    /// apart, confidences in `[0, 1]`, non-negative frequencies and a positive hop.
    pub fn from_parts(
        pitch_hz: Vec<f32>,
        confidence: Vec<f32>,
        timestamps: Vec<f32>,
        voicing: Vec<bool>,
        hop_duration: f32,
    ) -> Result<Self> {
        let n = timestamps.len();
        if pitch_hz.len() != n || confidence.len() != n || voicing.len() != n {
            return Err(Error::InvalidPitchData(format!(
                "column lengths differ: {} pitches, {} confidences, {} timestamps, {} voicing flags",
                pitch_hz.len(),
                confidence.len(),
                n,
                voicing.len()
            )));
        }
        if !(hop_duration > 0.0 && hop_duration.is_finite()) {
            return Err(Error::InvalidPitchData(format!(
                "hop duration must be positive, got {hop_duration}"
            )));
        }
        if let Some(i) = timestamps.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(Error::InvalidPitchData(format!(
                "timestamps must increase, frame {} is at {} after {}",
                i + 1,
                timestamps[i + 1],
                timestamps[i]
            )));
        }
        if let Some(i) = timestamps
            .windows(2)
            .position(|w| !spaced_by_hop(w[0], w[1], hop_duration))
        {
            return Err(Error::InvalidPitchData(format!(
                "frames {} and {} are {} s apart, expected a hop of {} s",
                i,
                i + 1,
                timestamps[i + 1] - timestamps[i],
                hop_duration
            )));
        }
        if let Some(c) = confidence.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(Error::InvalidPitchData(format!(
                "confidence {c} is outside [0, 1]"
            )));
        }
        if let Some(f) = pitch_hz.iter().find(|f| !(f.is_finite() && **f >= 0.0)) {
            return Err(Error::InvalidPitchData(format!("invalid frequency {f}")));
        }

        Ok(PitchResult {
            pitch_hz,
            confidence,
            timestamps,
            voicing,
            hop_duration,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn pitch_hz(&self) -> &[f32] {
        &self.pitch_hz
    }

    pub fn confidence(&self) -> &[f32] {
        &self.confidence
    }

    pub fn timestamps(&self) -> &[f32] {
        &self.timestamps
    }

    pub fn voicing(&self) -> &[bool] {
        &self.voicing
    }

    /// Time between consecutive frames, in seconds.
    pub fn hop_duration(&self) -> f32 {
        self.hop_duration
    }

    /// Time covered by the series: from zero to one hop past the last frame.
    pub fn duration(&self) -> f32 {
        self.timestamps
            .last()
            .map_or(0.0, |&last| last + self.hop_duration)
    }

    pub fn frame(&self, i: usize) -> Option<Frame> {
        (i < self.len()).then(|| Frame {
            time: self.timestamps[i],
            pitch_hz: self.pitch_hz[i],
            confidence: self.confidence[i],
            voiced: self.voicing[i],
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        (0..self.len()).filter_map(move |i| self.frame(i))
    }

    pub fn voiced_count(&self) -> usize {
        self.voicing.iter().filter(|&&v| v).count()
    }

    /// Summary statistics over the voiced frames, `None` if no frame is voiced.
    pub fn stats(&self) -> Option<PitchStats> {
        let voiced: Vec<Frame> = self.frames().filter(|f| f.voiced).collect();
        if voiced.is_empty() {
            return None;
        }
        let count = voiced.len() as f32;
        let (min_hz, max_hz) = voiced
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), f| {
                (lo.min(f.pitch_hz), hi.max(f.pitch_hz))
            });

        Some(PitchStats {
            total_frames: self.len(),
            voiced_frames: voiced.len(),
            min_hz,
            max_hz,
            mean_hz: voiced.iter().map(|f| f.pitch_hz).sum::<f32>() / count,
            mean_confidence: voiced.iter().map(|f| f.confidence).sum::<f32>() / count,
        })
    }
}

/// Whether `next` follows `prev` by one hop. The tolerance covers f32 rounding of
/// timestamps far into a recording.
fn spaced_by_hop(prev: f32, next: f32, hop: f32) -> bool {
    let tolerance = 0.01 * hop + 4.0 * f32::EPSILON * next.abs();
    ((next - prev) - hop).abs() <= tolerance
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchStats {
    pub total_frames: usize,
    pub voiced_frames: usize,
    pub min_hz: f32,
    pub max_hz: f32,
    pub mean_hz: f32,
    pub mean_confidence: f32,
}

impl PitchStats {
    pub fn voiced_ratio(&self) -> f32 {
        self.voiced_frames as f32 / self.total_frames as f32
    }
}

impl fmt::Display for PitchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Voiced frames: {} / {} ({:.1}%)",
            self.voiced_frames,
            self.total_frames,
            100.0 * self.voiced_ratio()
        )?;
        writeln!(f, "  Min pitch: {:.2} Hz", self.min_hz)?;
        writeln!(f, "  Max pitch: {:.2} Hz", self.max_hz)?;
        writeln!(f, "  Avg pitch: {:.2} Hz", self.mean_hz)?;
        write!(f, "  Avg confidence: {:.4}", self.mean_confidence)
    }
}
