//! Buffer management, peak picking, resampling and pitch-unit conversions shared by
//! the detectors and the note segmenter.
pub mod buffer;
pub mod peak;
pub mod resample;
pub mod tuning;
