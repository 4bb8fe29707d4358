//! Frame-level pitch estimators. A [FrameDetector] looks at one fixed-size frame and
//! reports the most likely fundamental frequency together with a clarity in `[0, 1]`.
use crate::detector::internals::Pitch;
use crate::float::Float;

pub mod internals;
pub mod mcleod;
pub mod yin;

pub trait FrameDetector<T>
where
    T: Float,
{
    /// Estimate the pitch of `signal`. Only periods inside `lags` are considered.
    /// Frames whose power is below `power_threshold` yield `None`.
    fn get_pitch(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        lags: LagRange,
        power_threshold: T,
    ) -> Option<Pitch<T>>;
}

/// Inclusive range of candidate periods, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min: usize,
    pub max: usize,
}

impl LagRange {
    /// The periods of `fmax ..= fmin` at `sample_rate`, rounded outwards and clamped
    /// so that every lag has a neighbour on both sides inside a `window`-long lag function.
    pub fn from_frequencies(fmin: f32, fmax: f32, sample_rate: usize, window: usize) -> Option<Self> {
        if !(fmin > 0.0 && fmax >= fmin) {
            return None;
        }
        let sample_rate = sample_rate as f32;
        let min = ((sample_rate / fmax).floor() as usize).max(1);
        let max = ((sample_rate / fmin).ceil() as usize).min(window.saturating_sub(2));
        LagRange { min, max }.non_empty()
    }

    /// This range restricted to lags usable in a `window`-long lag function.
    pub fn within(self, window: usize) -> Option<Self> {
        LagRange {
            min: self.min.max(1),
            max: self.max.min(window.saturating_sub(2)),
        }
        .non_empty()
    }

    fn non_empty(self) -> Option<Self> {
        if self.min < self.max {
            Some(self)
        } else {
            None
        }
    }
}

/// Frame detection algorithms a tracker can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Yin,
    McLeod,
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yin" => Ok(Algorithm::Yin),
            "mcleod" | "mpm" => Ok(Algorithm::McLeod),
            other => Err(format!("unknown algorithm `{other}` (expected yin or mcleod)")),
        }
    }
}
