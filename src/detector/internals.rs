use rustfft::FftPlanner;

use crate::detector::LagRange;
use crate::float::Float;
use crate::utils::buffer::{copy_complex_to_real, copy_real_to_complex, square_sum};
use crate::utils::buffer::{modulus_squared, BufferPool, ComplexComponent};
use crate::utils::peak::{choose_peak, correct_peak, detect_peaks, find_maximum, PeakCorrection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch<T>
where
    T: Float,
{
    pub frequency: T,
    pub clarity: T,
}

/// Data structure to hold any buffers needed for pitch computation.
/// A tracker runs the same detector over thousands of frames, so buffers are
/// allocated once and handed out by a `BufferPool`.
pub struct DetectorInternals<T>
where
    T: Float,
{
    pub size: usize,
    pub padding: usize,
    pub buffers: BufferPool<T>,
}

impl<T> DetectorInternals<T>
where
    T: Float,
{
    pub fn new(size: usize, padding: usize) -> Self {
        let buffers = BufferPool::new(size + padding);

        DetectorInternals {
            size,
            padding,
            buffers,
        }
    }
}

/// Compute the autocorrelation of `signal` to `result`, zero padded to the buffer
/// size of `buffers`. `result` must be at least that long.
pub fn autocorrelation<T>(signal: &[T], buffers: &mut BufferPool<T>, result: &mut [T])
where
    T: Float,
{
    let (ref1, ref2) = (buffers.get_complex_buffer(), buffers.get_complex_buffer());
    let signal_complex = &mut ref1.borrow_mut()[..];
    let scratch = &mut ref2.borrow_mut()[..];

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(signal_complex.len());
    let inv_fft = planner.plan_fft_inverse(signal_complex.len());

    // rustfft does not normalize, so fft -> inverse fft scales by the length once.
    let normalization_const = T::one() / T::cast_usize(signal_complex.len());

    copy_real_to_complex(signal, signal_complex, ComplexComponent::Re);
    fft.process_with_scratch(signal_complex, scratch);
    modulus_squared(signal_complex, normalization_const);
    inv_fft.process_with_scratch(signal_complex, scratch);
    copy_complex_to_real(signal_complex, result, ComplexComponent::Re);
}

/// The lag from the first peak of `input` above `threshold` whose index lies in `lags`.
/// Returns `(lag, value)` after `correction`.
pub fn choose_lag<T>(
    input: &[T],
    lags: LagRange,
    threshold: T,
    correction: PeakCorrection,
) -> Option<(T, T)>
where
    T: Float,
{
    let peaks = detect_peaks(&input[..=lags.max]).filter(|peak| peak.0 >= lags.min);

    choose_peak(peaks, threshold).map(|peak| correct_peak(peak, input, correction))
}

/// The lag of the largest value of `input` inside `lags`, as `(lag, value)`.
pub fn strongest_lag<T>(input: &[T], lags: LagRange, correction: PeakCorrection) -> Option<(T, T)>
where
    T: Float,
{
    find_maximum(input, lags.min, lags.max).map(|peak| correct_peak(peak, input, correction))
}

/// m(t) = sum_{i=0}^{N-t-1} (x_i^2 + x_{i+t}^2), zero for t >= N.
fn m_of_tau<T>(signal: &[T], result: &mut [T])
where
    T: Float,
{
    let n = signal.len();
    let mut m = T::cast_f32(2.0) * square_sum(signal);
    for (tau, r) in result.iter_mut().enumerate() {
        if tau >= n {
            *r = T::zero();
            continue;
        }
        *r = m;
        m = m - signal[tau] * signal[tau] - signal[n - 1 - tau] * signal[n - 1 - tau];
    }
}

/// The normalized square difference function n(t) = 2 r(t) / m(t) of the McLeod
/// pitch method, where r is the autocorrelation. Lags with no overlap are zero.
pub fn normalized_square_difference<T>(signal: &[T], buffers: &mut BufferPool<T>, result: &mut [T])
where
    T: Float,
{
    let two = T::cast_f32(2.0);

    let scratch_ref = buffers.get_real_buffer();
    let scratch = &mut scratch_ref.borrow_mut()[..];

    autocorrelation(signal, buffers, result);
    m_of_tau(signal, scratch);
    result.iter_mut().zip(scratch.iter()).for_each(|(r, &m)| {
        *r = if m > T::zero() {
            two * *r / m
        } else {
            T::zero()
        }
    })
}

/// Compute the windowed autocorrelation of `signal` and put the result in `result`.
/// For a signal _x=(x_0,x_1,...)_, the windowed autocorrelation with window size _w_ is
/// the function
///
/// > r(t) = sum_{i=0}^{w-1} x_i*x_{i+t}
///
/// This function assumes `window_size` is at most half of the length of `signal`.
pub fn windowed_autocorrelation<T>(
    signal: &[T],
    window_size: usize,
    buffers: &mut BufferPool<T>,
    result: &mut [T],
) where
    T: Float,
{
    assert!(
        buffers.buffer_size >= signal.len(),
        "Buffers must have a length at least equal to `signal`."
    );

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(signal.len());
    let inv_fft = planner.plan_fft_inverse(signal.len());

    let (scratch_ref1, scratch_ref2, scratch_ref3) = (
        buffers.get_complex_buffer(),
        buffers.get_complex_buffer(),
        buffers.get_complex_buffer(),
    );

    let signal_complex = &mut scratch_ref1.borrow_mut()[..signal.len()];
    let truncated_signal_complex = &mut scratch_ref2.borrow_mut()[..signal.len()];
    let scratch = &mut scratch_ref3.borrow_mut()[..signal.len()];

    // The windowed autocorrelation is the cross correlation between the signal
    // and the signal truncated to `0..window_size`.
    copy_real_to_complex(signal, signal_complex, ComplexComponent::Re);
    copy_real_to_complex(
        &signal[..window_size],
        truncated_signal_complex,
        ComplexComponent::Re,
    );
    fft.process_with_scratch(signal_complex, scratch);
    fft.process_with_scratch(truncated_signal_complex, scratch);
    let normalization_const = T::one() / T::cast_usize(signal.len());
    signal_complex
        .iter_mut()
        .zip(truncated_signal_complex.iter())
        .for_each(|(a, b)| {
            *a = *a * normalization_const * b.conj();
        });
    inv_fft.process_with_scratch(signal_complex, scratch);

    // The result is valid only for `0..window_size`
    copy_complex_to_real(&signal_complex[..window_size], result, ComplexComponent::Re);
}

/// Compute the windowed square error, _d(t)_, of `signal`. For a window size of _w_ and a signal
/// _x=(x_0,x_1,...)_, this is defined by
///
///  > d(t) = sum_{i=0}^{w-1} (x_i - x_{i+t})^2
///
/// This function is computed efficiently using an FFT. It is assumed that `window_size` is at most half
/// the length of `signal`.
pub fn windowed_square_error<T>(
    signal: &[T],
    window_size: usize,
    buffers: &mut BufferPool<T>,
    result: &mut [T],
) where
    T: Float,
{
    assert!(
        2 * window_size <= signal.len(),
        "The window size cannot be more than half the signal length"
    );

    let two = T::cast_f32(2.0);

    // d(t) = pow_0^w + pow_t^{t+w} - 2*windowed_autocorrelation(t)
    // where pow_a^b is the sum of the square of `signal` on the window `a..b`.
    windowed_autocorrelation(signal, window_size, buffers, result);
    let mut windowed_power = square_sum(&signal[..window_size]);
    let power = windowed_power;

    result.iter_mut().enumerate().for_each(|(i, a)| {
        // FFT round-off can push a perfect match slightly below zero.
        *a = (power + windowed_power - two * *a).max(T::zero());
        windowed_power = windowed_power - signal[i] * signal[i]
            + signal[i + window_size] * signal[i + window_size];
    })
}

/// Calculate the "cumulative mean normalized difference function" as
/// specified in the YIN paper. If _d(t)_ is the square error function,
/// compute _d'(0) = 1_ and for _t > 0_
///
///  > d'(t) = d(t) / [ (1/t) * sum_{i=1}^t d(i) ]
///
/// Lags where the running sum is still zero are set to 1.
pub fn yin_normalize_square_error<T: Float>(square_error: &mut [T]) {
    let mut sum = T::zero();
    square_error[0] = T::one();
    square_error
        .iter_mut()
        .enumerate()
        .skip(1)
        .for_each(|(i, a)| {
            sum = sum + *a;
            *a = if sum > T::zero() {
                *a * T::cast_usize(i) / sum
            } else {
                T::one()
            };
        });
}
