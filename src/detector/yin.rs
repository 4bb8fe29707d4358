//! The YIN pitch detection algorithm is based on the algorithm from the paper
//! *[YIN, a fundamental frequency estimator for speech and music](http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf)*.
//! It is efficient and offers an improvement over basic autocorrelation.
//!
//! Let $S=(s_0,s_1,\ldots,s_N)$ be a discrete signal. The *mean square difference function* at time $t$
//! is defined by
//! $$ d(t) = \sum_{i=0}^{N-t} (s_i-s_{i+t})^2. $$
//! This function is close to zero when the signal "lines up" with itself, but its scale depends on
//! volume. The YIN algorithm therefore computes the *cumulative mean normalized difference function*,
//! $$ d\'(t) = \begin{cases}1&\text{if }t=0\\\\ d(t) / \left[ \tfrac{1}{t}\sum_{i=1}^t d(i) \right] & \text{otherwise}\end{cases}. $$
//! Then, it searches for the first local minimum of $d\'(t)$ below a given threshold.
//!
//! ## Implementation
//! $d(t)$ is computed with an [FFT](https://en.wikipedia.org/wiki/Fast_Fourier_transform).
//! Only lags inside the requested [LagRange] are searched. When no dip falls below the
//! threshold the global minimum of the range is reported instead (step 4 of the paper), so
//! every audible frame gets an estimate and the reported clarity, $1 - d\'(t)$, decides
//! whether it is usable.
//!
//! After a candidate lag is found, quadratic interpolation is applied to refine the estimate.

use crate::detector::internals::{choose_lag, strongest_lag, Pitch};
use crate::detector::internals::{windowed_square_error, yin_normalize_square_error, DetectorInternals};
use crate::detector::{FrameDetector, LagRange};
use crate::float::Float;
use crate::utils::buffer::square_sum;
use crate::utils::peak::PeakCorrection;

/// The absolute threshold suggested by the YIN paper is 0.1; 0.15 is slightly more
/// forgiving with breathy or noisy recordings.
pub const DEFAULT_THRESHOLD: f32 = 0.15;

pub struct YINDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    threshold: T,
}

impl<T> YINDetector<T>
where
    T: Float,
{
    /// A detector for frames of `size` samples using the absolute `threshold` on d'(t).
    pub fn new(size: usize, threshold: T) -> Self {
        let internals = DetectorInternals::<T>::new(size, 0);
        YINDetector {
            internals,
            threshold,
        }
    }
}

impl<T> FrameDetector<T> for YINDetector<T>
where
    T: Float,
{
    fn get_pitch(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        lags: LagRange,
        power_threshold: T,
    ) -> Option<Pitch<T>> {
        assert_eq!(signal.len(), self.internals.size);

        let threshold = self.threshold;
        let window_size = signal.len() / 2;

        if square_sum(signal) < power_threshold {
            return None;
        }
        let lags = lags.within(window_size)?;

        let result_ref = self.internals.buffers.get_real_buffer();
        let result = &mut result_ref.borrow_mut()[..window_size];

        // STEP 2: Calculate the difference function, d_t.
        windowed_square_error(signal, window_size, &mut self.internals.buffers, result);

        // STEP 3: Calculate the cumulative mean normalized difference function, d_t'.
        yin_normalize_square_error(result);

        // STEP 4: The absolute threshold. Peak picking looks for maximums, so the
        // function is flipped around the threshold: dips below it become positive peaks.
        result.iter_mut().for_each(|val| *val = threshold - *val);

        // STEP 5: Pick the lag and use quadratic interpolation to fine-tune it.
        let (lag, value) = choose_lag(result, lags, T::zero(), PeakCorrection::Quadratic)
            .or_else(|| strongest_lag(result, lags, PeakCorrection::Quadratic))?;
        if lag <= T::zero() {
            return None;
        }

        // `value` is threshold - d'(t), so the clarity 1 - d'(t) is recovered by shifting back.
        let clarity = (T::one() - threshold + value).max(T::zero()).min(T::one());

        Some(Pitch {
            frequency: T::cast_usize(sample_rate) / lag,
            clarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, size: usize, sample_rate: usize) -> Vec<f64> {
        (0..size)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    #[test]
    fn sine_is_found_with_high_clarity() {
        let mut detector = YINDetector::new(1024, 0.15);
        let lags = LagRange::from_frequencies(46.875, 2093.75, 16000, 512).unwrap();
        let pitch = detector
            .get_pitch(&sine(220.0, 1024, 16000), 16000, lags, 0.1)
            .unwrap();
        assert!((pitch.frequency - 220.0).abs() < 1.0, "{:?}", pitch);
        assert!(pitch.clarity > 0.95, "{:?}", pitch);
    }

    #[test]
    fn quiet_frames_are_skipped() {
        let mut detector = YINDetector::new(1024, 0.15);
        let lags = LagRange::from_frequencies(46.875, 2093.75, 16000, 512).unwrap();
        let signal: Vec<f64> = sine(220.0, 1024, 16000).iter().map(|s| s * 1e-3).collect();
        assert!(detector.get_pitch(&signal, 16000, lags, 0.1).is_none());
    }

    #[test]
    fn buffers_are_reused_between_frames() {
        let mut detector = YINDetector::new(256, 0.15f32);
        let lags = LagRange { min: 2, max: 120 };
        let signal: Vec<f32> = sine(500.0, 256, 16000).iter().map(|&s| s as f32).collect();
        for _ in 0..3 {
            detector.get_pitch(&signal, 16000, lags, 0.0);
        }
        assert_eq!(detector.internals.buffers.real_buffer_count(), 1);
        assert_eq!(detector.internals.buffers.complex_buffer_count(), 3);
    }
}
