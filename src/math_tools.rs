//! This module provides the numeric building blocks of the F-K filter: the triangular smoothing
//! window, a separable same-size 2-D convolution, 2-D FFTs over both axes of an array and the
//! FFT-shift helpers used to center the spectrum.

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// Lower bound applied to power values before converting them to dB.
const DB_FLOOR: f64 = 1e-30;

/// Computes the normalized triangular (Bartlett-like) window of odd length `spread`.
///
/// The raw window is `t = 1 - |linspace(-1, 1, spread)|`, i.e. zero at both ends and one in the
/// middle. It is scaled to unit sum so that smoothing a constant region leaves it unchanged.
/// A window of length 1 is the identity `[1.0]`.
pub fn triangular_window(spread: usize) -> Array1<f64> {
    if spread <= 1 {
        return Array1::ones(1);
    }
    let raw = Array1::linspace(-1.0, 1.0, spread).mapv(|x: f64| 1.0 - x.abs());
    let sum = raw.sum();
    raw / sum
}

/// Convolves a 1-D signal with a symmetric odd-length kernel, "same" mode with zero padding.
fn convolve_same(signal: &mut ArrayViewMut1<f64>, kernel: &Array1<f64>, scratch: &mut Vec<f64>) {
    let n = signal.len();
    let half = (kernel.len() / 2) as isize;
    scratch.clear();
    scratch.extend(signal.iter().copied());
    for i in 0..n {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let j = i as isize + k as isize - half;
            if j >= 0 && (j as usize) < n {
                acc += w * scratch[j as usize];
            }
        }
        signal[i] = acc;
    }
}

/// Convolves a 2-D array with the separable kernel `kernel[i] * kernel[j]`.
///
/// The output has the shape of the input; samples outside the grid count as zero.
pub fn separable_convolve_same(data: &Array2<f64>, kernel: &Array1<f64>) -> Array2<f64> {
    let mut out = data.clone();
    if kernel.len() <= 1 && kernel.iter().all(|&w| w == 1.0) {
        return out;
    }
    let mut scratch = Vec::with_capacity(data.nrows().max(data.ncols()));
    for axis in [Axis(0), Axis(1)] {
        for mut lane in out.lanes_mut(axis) {
            convolve_same(&mut lane, kernel, &mut scratch);
        }
    }
    out
}

/// Transforms a complex 2-D array in place along both axes.
///
/// The inverse direction is normalized by the number of elements, so that a forward transform
/// followed by an inverse one returns the input.
pub fn fft2(data: &mut Array2<Complex64>, direction: FftDirection) {
    let (rows, cols) = data.dim();
    let mut planner = FftPlanner::<f64>::new();
    let mut buffer: Vec<Complex64> = Vec::with_capacity(rows.max(cols));

    for (axis, len) in [(Axis(1), cols), (Axis(0), rows)] {
        let fft = planner.plan_fft(len, direction);
        let mut scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];
        for mut lane in data.lanes_mut(axis) {
            buffer.clear();
            buffer.extend(lane.iter().copied());
            fft.process_with_scratch(&mut buffer, &mut scratch);
            lane.iter_mut()
                .zip(buffer.iter())
                .for_each(|(dst, src)| *dst = *src);
        }
    }

    if direction == FftDirection::Inverse {
        let norm = 1.0 / (rows * cols) as f64;
        data.mapv_inplace(|c| c * norm);
    }
}

/// Moves the zero-frequency element of both axes to the center index `n / 2`.
pub fn fftshift2<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (rows, cols) = data.dim();
    roll2(data, rows / 2, cols / 2)
}

/// Inverse of [`fftshift2`], also for odd lengths.
pub fn ifftshift2<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (rows, cols) = data.dim();
    roll2(data, rows - rows / 2, cols - cols / 2)
}

/// Rolls both axes forward: `out[(i + di) % rows, (j + dj) % cols] = data[i, j]`.
fn roll2<T: Clone>(data: &Array2<T>, di: usize, dj: usize) -> Array2<T> {
    let (rows, cols) = data.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[[(i + rows - di % rows) % rows, (j + cols - dj % cols) % cols]].clone()
    })
}

/// Converts power values to dB, clamping at a small floor to avoid `-inf`.
pub fn power_to_db(power: &Array2<f64>) -> Array2<f64> {
    power.mapv(|p| 10.0 * p.max(DB_FLOOR).log10())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_triangular_window() {
        let w = triangular_window(1);
        assert_eq!(w, array![1.0]);

        let w = triangular_window(5);
        // raw window [0, 0.5, 1, 0.5, 0] scaled to unit sum
        for (a, b) in w.iter().zip([0.0, 0.25, 0.5, 0.25, 0.0]) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(triangular_window(7).sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_convolution_preserves_interior_of_constant_region() {
        let data = Array2::<f64>::ones((9, 11));
        let out = separable_convolve_same(&data, &triangular_window(5));
        assert_eq!(out.dim(), (9, 11));
        // two samples away from every edge the full kernel sees ones
        assert_abs_diff_eq!(out[[4, 5]], 1.0, epsilon = 1e-12);
        // the corner only sees a quarter of the kernel mass
        assert!(out[[0, 0]] < 1.0);
        assert!(out.iter().all(|&v| (0.0..=1.0 + 1e-12).contains(&v)));
    }

    #[test]
    fn test_convolution_identity_kernel() {
        let data = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(separable_convolve_same(&data, &triangular_window(1)), data);
        // length 3 kernel [0, 1, 0] is also the identity
        let out = separable_convolve_same(&data, &triangular_window(3));
        for (a, b) in out.iter().zip(data.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fft2_round_trip() {
        let mut data = Array2::from_shape_fn((4, 6), |(i, j)| {
            Complex64::new((i * 6 + j) as f64, (i as f64) - (j as f64))
        });
        let original = data.clone();
        fft2(&mut data, FftDirection::Forward);
        // DC bin is the sum of all elements
        let sum: Complex64 = original.iter().sum();
        assert_abs_diff_eq!(data[[0, 0]].re, sum.re, epsilon = 1e-9);
        assert_abs_diff_eq!(data[[0, 0]].im, sum.im, epsilon = 1e-9);
        fft2(&mut data, FftDirection::Inverse);
        for (a, b) in data.iter().zip(original.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fftshift_centers_zero_index() {
        let data = Array2::from_shape_fn((4, 6), |(i, j)| (i, j));
        let shifted = fftshift2(&data);
        assert_eq!(shifted[[2, 3]], (0, 0));
        assert_eq!(ifftshift2(&shifted), data);

        let odd = Array2::from_shape_fn((3, 5), |(i, j)| i * 5 + j);
        assert_eq!(fftshift2(&odd)[[1, 2]], 0);
        assert_eq!(ifftshift2(&fftshift2(&odd)), odd);
    }

    #[test]
    fn test_power_to_db() {
        let db = power_to_db(&array![[1.0, 100.0], [0.0, 1e-3]]);
        assert_abs_diff_eq!(db[[0, 0]], 0.0);
        assert_abs_diff_eq!(db[[0, 1]], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(db[[1, 0]], -300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(db[[1, 1]], -30.0, epsilon = 1e-9);
    }
}
