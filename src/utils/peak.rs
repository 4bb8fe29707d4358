use crate::float::Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakCorrection {
    Quadratic,
    None,
}

struct Point<T: Float> {
    x: T,
    y: T,
}

/// Yield `(start, stop)` index pairs of every region of `arr` that starts with a
/// negative-to-positive crossing and ends with a positive-to-negative one.
fn detect_crossings<T: Float>(arr: &[T]) -> impl Iterator<Item = (usize, usize)> + '_ {
    arr.windows(2)
        .enumerate()
        .scan(
            None,
            |positive_zero_cross: &mut Option<usize>, (i, win)| match positive_zero_cross.take() {
                Some(idx) => {
                    if win[1] < T::zero() && win[0] > T::zero() {
                        *positive_zero_cross = None;
                        Some(Some((idx, i + 1)))
                    } else {
                        *positive_zero_cross = Some(idx);
                        Some(None)
                    }
                }
                None => {
                    if win[1] > T::zero() && win[0] < T::zero() {
                        *positive_zero_cross = Some(i + 1);
                    }
                    Some(None)
                }
            },
        )
        .flatten()
}

/// The maximum of each positive region of `arr`, as `(index, value)`.
pub fn detect_peaks<T: Float>(arr: &[T]) -> impl Iterator<Item = (usize, T)> + '_ {
    detect_crossings(arr).map(move |(start, stop)| {
        let mut peak_idx = start;
        let mut peak_val = -T::infinity();
        for (i, &val) in arr.iter().enumerate().take(stop).skip(start) {
            if val > peak_val {
                peak_val = val;
                peak_idx = i;
            }
        }
        (peak_idx, peak_val)
    })
}

pub fn choose_peak<I: Iterator<Item = (usize, T)>, T: Float>(
    mut peaks: I,
    threshold: T,
) -> Option<(usize, T)> {
    peaks.find(|p| p.1 > threshold)
}

/// The largest value of `arr` at an index in `start..=stop`.
pub fn find_maximum<T: Float>(arr: &[T], start: usize, stop: usize) -> Option<(usize, T)> {
    arr.iter()
        .enumerate()
        .take(stop + 1)
        .skip(start)
        .fold(None, |best: Option<(usize, T)>, (i, &val)| match best {
            Some((_, best_val)) if best_val >= val => best,
            _ => Some((i, val)),
        })
}

/// Refine `peak` using its neighbours in `data`. Peaks on the boundary of `data`
/// are returned unchanged.
pub fn correct_peak<T: Float>(peak: (usize, T), data: &[T], correction: PeakCorrection) -> (T, T) {
    let idx = peak.0;
    let on_boundary = idx == 0 || idx + 1 >= data.len();
    match correction {
        PeakCorrection::Quadratic if !on_boundary => {
            let point = quadratic_interpolation(
                Point {
                    x: T::cast_usize(idx - 1),
                    y: data[idx - 1],
                },
                Point {
                    x: T::cast_usize(idx),
                    y: data[idx],
                },
                Point {
                    x: T::cast_usize(idx + 1),
                    y: data[idx + 1],
                },
            );
            (point.x, point.y)
        }
        _ => (T::cast_usize(idx), peak.1),
    }
}

fn quadratic_interpolation<T: Float>(
    left: Point<T>,
    center: Point<T>,
    right: Point<T>,
) -> Point<T> {
    let half = T::cast_f32(0.5);
    let denominator = T::cast_f32(2.0) * center.y - left.y - right.y;
    if denominator == T::zero() {
        return center;
    }
    // A vertex further than one step away means `center` was not a local maximum.
    let shift = (half * (right.y - left.y) / denominator)
        .max(-T::one())
        .min(T::one());
    let x = center.x + shift;
    let y = center.y + T::cast_f32(0.25) * (right.y - left.y) * shift;
    Point { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_correction() {
        let point = quadratic_interpolation(
            Point {
                x: -1.5,
                y: -(1.5 * 1.5) + 4.0,
            },
            Point {
                x: -0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
            Point {
                x: 0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
        );
        assert_eq!(point.x, 0.0);
        assert_eq!(point.y, 4.0);
    }

    #[test]
    fn flat_neighbourhood_is_left_alone() {
        let data = [1.0f64, 1.0, 1.0];
        assert_eq!(
            correct_peak((1, 1.0), &data, PeakCorrection::Quadratic),
            (1.0, 1.0)
        );
    }

    #[test]
    fn boundary_peaks_are_not_interpolated() {
        let data = [3.0f64, 2.0, 1.0];
        assert_eq!(
            correct_peak((0, 3.0), &data, PeakCorrection::Quadratic),
            (0.0, 3.0)
        );
    }

    #[test]
    fn peaks_need_both_crossings() {
        // The leading positive lobe and the unterminated trailing one are ignored.
        let data = [1.0f64, 0.5, -1.0, 2.0, 3.0, -1.0, 1.0, 4.0];
        let peaks: Vec<_> = detect_peaks(&data).collect();
        assert_eq!(peaks, vec![(4, 3.0)]);
    }

    #[test]
    fn maximum_respects_bounds() {
        let data = [9.0f64, 1.0, 3.0, 2.0, 8.0];
        assert_eq!(find_maximum(&data, 1, 3), Some((2, 3.0)));
        assert_eq!(find_maximum(&data, 5, 6), None);
    }
}
