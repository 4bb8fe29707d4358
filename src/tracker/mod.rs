//! Whole-signal pitch tracking: resampling, framing, per-frame detection and voicing.
//!
//! Audio is resampled to 16 kHz, padded by 384 zeros on both sides and cut into
//! 1024-sample frames every 256 samples. Frame `i` is centred at
//! `(i * 256 + 127.5) / 16000` seconds of the original signal.
//!
//! ```
//! use pitch_notes::tracker::{PitchTracker, TrackerConfig};
//!
//! let sample_rate = 16000;
//! let audio: Vec<f32> = (0..sample_rate)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
//!     .collect();
//!
//! let mut tracker = PitchTracker::new(TrackerConfig::default()).unwrap();
//! let result = tracker.detect_from_array(&audio, sample_rate as u32).unwrap();
//!
//! let stats = result.stats().unwrap();
//! assert!((stats.mean_hz - 440.0).abs() < 5.0);
//! ```
use std::path::Path;

use log::{debug, warn};

use crate::audio;
use crate::detector::mcleod::McLeodDetector;
use crate::detector::yin::YINDetector;
use crate::detector::{Algorithm, FrameDetector, LagRange};
use crate::error::{Error, Result};
use crate::result::PitchResult;
use crate::utils::resample::resample_linear;

mod config;

pub use config::*;

pub struct PitchTracker {
    config: TrackerConfig,
    detector: Box<dyn FrameDetector<f32>>,
    lags: LagRange,
}

impl PitchTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        let lags = LagRange::from_frequencies(
            config.fmin,
            config.fmax,
            TARGET_SAMPLE_RATE as usize,
            FRAME_LENGTH / 2,
        )
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "no lag fits the band {} - {} Hz",
                config.fmin, config.fmax
            ))
        })?;

        let detector: Box<dyn FrameDetector<f32>> = match config.algorithm {
            Algorithm::Yin => Box::new(YINDetector::new(FRAME_LENGTH, config.yin_threshold)),
            Algorithm::McLeod => Box::new(McLeodDetector::new(FRAME_LENGTH, config.mcleod_cutoff)),
        };

        Ok(PitchTracker {
            config,
            detector,
            lags,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Read a WAV file, downmix it to mono and track its pitch.
    pub fn detect_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<PitchResult> {
        let signal = audio::read_wav(path)?;
        debug!(
            "Read {:.2} s of audio at {} Hz",
            signal.duration_secs(),
            signal.sample_rate
        );
        self.detect_from_array(&signal.samples, signal.sample_rate)
    }

    /// Track the pitch of mono `audio` sampled at `sample_rate`.
    pub fn detect_from_array(&mut self, audio: &[f32], sample_rate: u32) -> Result<PitchResult> {
        if audio.is_empty() {
            return Err(Error::InvalidAudio("input audio cannot be empty".into()));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidAudio("sample rate must be positive".into()));
        }
        if let Some(i) = audio.iter().position(|s| !s.is_finite()) {
            return Err(Error::InvalidAudio(format!("sample {i} is not finite")));
        }

        let mut audio = resample_linear(audio, sample_rate, TARGET_SAMPLE_RATE);
        debug!(
            "Resampled to {} samples at {} Hz",
            audio.len(),
            TARGET_SAMPLE_RATE
        );
        if audio.len() < MIN_AUDIO_LENGTH {
            warn!(
                "Audio is only {} samples at {} Hz, padding to {}",
                audio.len(),
                TARGET_SAMPLE_RATE,
                MIN_AUDIO_LENGTH
            );
            audio.resize(MIN_AUDIO_LENGTH, 0.0);
        }

        let padded = pad(&audio);
        let n_frames = (padded.len() - FRAME_LENGTH) / HOP_LENGTH + 1;

        let mut pitch_hz = Vec::with_capacity(n_frames);
        let mut confidence = Vec::with_capacity(n_frames);
        for frame in (0..n_frames).map(|i| &padded[i * HOP_LENGTH..i * HOP_LENGTH + FRAME_LENGTH]) {
            let pitch = self.detector.get_pitch(
                frame,
                TARGET_SAMPLE_RATE as usize,
                self.lags,
                self.config.power_threshold,
            );
            let (f, c) = pitch.map_or((PitchResult::UNVOICED_HZ, 0.0), |p| {
                (p.frequency, p.clarity)
            });
            pitch_hz.push(f);
            confidence.push(c);
        }

        let voicing = self.compute_voicing(&pitch_hz, &confidence);
        debug!(
            "Tracked {} frames, {} voiced",
            n_frames,
            voicing.iter().filter(|&&v| v).count()
        );

        PitchResult::from_parts(
            pitch_hz,
            confidence,
            frame_timestamps(n_frames),
            voicing,
            HOP_LENGTH as f32 / TARGET_SAMPLE_RATE as f32,
        )
    }

    fn compute_voicing(&self, pitch_hz: &[f32], confidence: &[f32]) -> Vec<bool> {
        let config = &self.config;
        pitch_hz
            .iter()
            .zip(confidence)
            .map(|(&f, &c)| c > config.confidence_threshold && f >= config.fmin && f <= config.fmax)
            .collect()
    }
}

fn pad(audio: &[f32]) -> Vec<f32> {
    let mut padded = vec![0.0; audio.len() + 2 * FRAME_PADDING];
    padded[FRAME_PADDING..FRAME_PADDING + audio.len()].copy_from_slice(audio);
    padded
}

/// Centre time, in seconds, of each of the first `n_frames` frames.
pub fn frame_timestamps(n_frames: usize) -> Vec<f32> {
    (0..n_frames)
        .map(|i| (i as f32 * HOP_LENGTH as f32 + CENTER_OFFSET) / TARGET_SAMPLE_RATE as f32)
        .collect()
}
