//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::float::FloatCore as NumFloatCore;
use rustfft::FftNum;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Frames are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
///
/// The `cast_*` helpers are infallible conversions for the indices, sample rates
/// and constants the detectors work with.
pub trait Float: Display + Debug + NumFloatCore + FftNum + Sum {
    fn cast_usize(n: usize) -> Self;
    fn cast_f32(x: f32) -> Self;
    fn lossy_f32(self) -> f32;
}

impl Float for f64 {
    fn cast_usize(n: usize) -> Self {
        n as f64
    }
    fn cast_f32(x: f32) -> Self {
        x as f64
    }
    fn lossy_f32(self) -> f32 {
        self as f32
    }
}

impl Float for f32 {
    fn cast_usize(n: usize) -> Self {
        n as f32
    }
    fn cast_f32(x: f32) -> Self {
        x
    }
    fn lossy_f32(self) -> f32 {
        self
    }
}
