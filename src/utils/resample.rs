/// Resample `audio` from `from_rate` to `to_rate` by linear interpolation.
///
/// The output has `floor(len * to_rate / from_rate)` samples. Output sample `i` is read
/// at source position `i * from_rate / to_rate`, interpolating between the two nearest
/// source samples; the last source sample is held past the end.
pub fn resample_linear(audio: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || audio.is_empty() {
        return audio.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_length = (audio.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let last = audio.len() - 1;

    (0..new_length)
        .map(|i| {
            let position = i as f64 / ratio;
            let low = (position.floor() as usize).min(last);
            let high = (low + 1).min(last);
            let frac = position - low as f64;
            (audio[low] as f64 * (1.0 - frac) + audio[high] as f64 * frac) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_identity() {
        let audio = vec![0.1, -0.2, 0.3];
        assert_eq!(resample_linear(&audio, 16000, 16000), audio);
    }

    #[test]
    fn downsampling_by_two_picks_every_other_sample() {
        let audio: Vec<f32> = (0..8).map(|i| i as f32).collect();
        assert_eq!(resample_linear(&audio, 32000, 16000), vec![0., 2., 4., 6.]);
    }

    #[test]
    fn upsampling_interpolates_and_holds_the_tail() {
        let audio = vec![0.0, 1.0];
        assert_eq!(resample_linear(&audio, 8000, 16000), vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn length_follows_the_rate_ratio() {
        let audio = vec![0.0; 44100];
        assert_eq!(resample_linear(&audio, 44100, 16000).len(), 16000);
    }
}
