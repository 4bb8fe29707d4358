//! The McLeod pitch method, from *A Smarter Way to Find Pitch* (McLeod & Wyvill, 2005).
//!
//! The normalized square difference function n(t) lies in `[-1, 1]` and is close to 1
//! at multiples of the period. Its *key maxima* are the highest points between each
//! positive-going and negative-going zero crossing. The first key maximum within
//! `cutoff` of the highest one is taken as the period, and its height is the clarity.

use crate::detector::internals::{choose_lag, normalized_square_difference, DetectorInternals, Pitch};
use crate::detector::{FrameDetector, LagRange};
use crate::float::Float;
use crate::utils::buffer::square_sum;
use crate::utils::peak::{detect_peaks, PeakCorrection};

pub const DEFAULT_CUTOFF: f32 = 0.9;

pub struct McLeodDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    cutoff: T,
}

impl<T> McLeodDetector<T>
where
    T: Float,
{
    /// A detector for frames of `size` samples. The autocorrelation is zero padded by
    /// half a frame, which keeps every searched lag free of wrap-around.
    pub fn new(size: usize, cutoff: T) -> Self {
        let internals = DetectorInternals::new(size, size / 2);
        McLeodDetector { internals, cutoff }
    }
}

impl<T> FrameDetector<T> for McLeodDetector<T>
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

        if square_sum(signal) < power_threshold {
            return None;
        }
        let window_size = signal.len() / 2;
        let lags = lags.within(window_size)?;

        let result_ref = self.internals.buffers.get_real_buffer();
        let result = &mut result_ref.borrow_mut()[..];
        normalized_square_difference(signal, &mut self.internals.buffers, result);
        let nsdf = &result[..window_size];

        let highest = detect_peaks(&nsdf[..=lags.max])
            .filter(|peak| peak.0 >= lags.min)
            .map(|peak| peak.1)
            .fold(T::zero(), |a, b| a.max(b));
        if highest <= T::zero() {
            return None;
        }

        let (lag, clarity) = choose_lag(
            nsdf,
            lags,
            self.cutoff * highest,
            PeakCorrection::Quadratic,
        )?;
        if lag <= T::zero() {
            return None;
        }

        Some(Pitch {
            frequency: T::cast_usize(sample_rate) / lag,
            clarity: clarity.max(T::zero()).min(T::one()),
        })
    }
}
