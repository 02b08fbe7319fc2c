//! Zero-padded 2-D Fourier transform of a trace gather (position axis x time axis).
//!
//! The gather is arranged as a `(n_positions, n_samples)` grid in ascending position order,
//! zero-padded by [`ZERO_PADDING_FACTOR`] along both axes, transformed, and FFT-shifted so that
//! zero wavenumber and zero frequency sit at the center indices `(n_k / 2, n_f / 2)`.

use crate::config::{FkConfig, ZERO_PADDING_FACTOR};
use crate::data_container::TraceGather;
use crate::math_tools::{fft2, fftshift2, ifftshift2, power_to_db};
use ndarray::{s, Array1, Array2, Axis};
use num_complex::Complex64;
use rustfft::FftDirection;
use serde::{Deserialize, Serialize};

/// A point in the (frequency, wavenumber) plane.
///
/// Frequencies are in Hz, wavenumbers in cycles per position unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPoint {
    pub frequency: f64,
    pub wavenumber: f64,
}

impl SpectralPoint {
    pub fn new(frequency: f64, wavenumber: f64) -> Self {
        SpectralPoint {
            frequency,
            wavenumber,
        }
    }

    /// Apparent velocity `frequency / wavenumber * scale`, `None` on the zero-wavenumber column.
    pub fn velocity(&self, scale: f64) -> Option<f64> {
        if self.wavenumber == 0.0 {
            None
        } else {
            Some(self.frequency / self.wavenumber * scale)
        }
    }
}

/// The centered complex F-K spectrum of a gather together with its grid geometry.
#[derive(Debug, Clone)]
pub struct FkSpectrum {
    data: Array2<Complex64>,
    n_positions: usize,
    n_samples: usize,
    dx: f64,
    sample_interval: f64,
    ascending: bool,
}

/// Computes the shifted, zero-padded 2-D spectrum of `gather`.
///
/// Descending gathers are flipped to ascending position order first, so the wavenumber axis
/// always refers to a positive step `|dx|`.
pub fn transform(gather: &TraceGather) -> FkSpectrum {
    let n_positions = gather.n_positions();
    let n_samples = gather.n_samples();
    let n_k = ZERO_PADDING_FACTOR * n_positions;
    let n_f = ZERO_PADDING_FACTOR * n_samples;
    let ascending = gather.is_ascending();

    let mut padded = Array2::<Complex64>::zeros((n_k, n_f));
    for (row, trace) in gather.traces().iter().enumerate() {
        let target = if ascending {
            row
        } else {
            n_positions - 1 - row
        };
        padded
            .slice_mut(s![target, ..n_samples])
            .iter_mut()
            .zip(trace.samples.iter())
            .for_each(|(dst, &src)| *dst = Complex64::new(src, 0.0));
    }

    fft2(&mut padded, FftDirection::Forward);

    let spectrum = FkSpectrum {
        data: fftshift2(&padded),
        n_positions,
        n_samples,
        dx: gather.dx().abs(),
        sample_interval: gather.sample_interval(),
        ascending,
    };
    log::debug!(
        "F-K spectrum: grid {:?}, dk = {:e} 1/{}, df = {:e} Hz",
        spectrum.shape(),
        spectrum.dk(),
        gather.axis().unit(),
        spectrum.df()
    );
    spectrum
}

impl FkSpectrum {
    /// Complex shifted spectrum `S[i, j]`.
    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    /// Grid shape `(n_k, n_f)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn n_k(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_f(&self) -> usize {
        self.data.ncols()
    }

    /// Shape `(n_positions, n_samples)` of the gather the spectrum was computed from.
    pub fn original_shape(&self) -> (usize, usize) {
        (self.n_positions, self.n_samples)
    }

    /// Wavenumber spacing `1 / (n_k * dx)`.
    pub fn dk(&self) -> f64 {
        1.0 / (self.n_k() as f64 * self.dx)
    }

    /// Frequency spacing `1 / (n_f * sample_interval)`.
    pub fn df(&self) -> f64 {
        1.0 / (self.n_f() as f64 * self.sample_interval)
    }

    pub fn wavenumber(&self, i: usize) -> f64 {
        (i as f64 - (self.n_k() / 2) as f64) * self.dk()
    }

    pub fn frequency(&self, j: usize) -> f64 {
        (j as f64 - (self.n_f() / 2) as f64) * self.df()
    }

    pub fn wavenumbers(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_k(), |i| self.wavenumber(i))
    }

    pub fn frequencies(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_f(), |j| self.frequency(j))
    }

    /// Spectral coordinates of grid cell `(i, j)`.
    pub fn point_at(&self, i: usize, j: usize) -> SpectralPoint {
        SpectralPoint::new(self.frequency(j), self.wavenumber(i))
    }

    /// Grid cell closest to `point`, clamped to the grid.
    pub fn nearest_index(&self, point: &SpectralPoint) -> (usize, usize) {
        let to_index = |value: f64, step: f64, n: usize| -> usize {
            let idx = (value / step).round() + (n / 2) as f64;
            idx.clamp(0.0, (n - 1) as f64) as usize
        };
        (
            to_index(point.wavenumber, self.dk(), self.n_k()),
            to_index(point.frequency, self.df(), self.n_f()),
        )
    }

    /// Squared magnitude of the shifted spectrum, for display.
    pub fn power_spectrum(&self) -> Array2<f64> {
        self.data.mapv(|c| c.norm_sqr())
    }

    /// Power spectrum in dB.
    pub fn power_spectrum_db(&self) -> Array2<f64> {
        power_to_db(&self.power_spectrum())
    }

    /// Power spectrum in the scaling selected by `config.log_power`.
    pub fn display_power(&self, config: &FkConfig) -> Array2<f64> {
        if config.log_power {
            self.power_spectrum_db()
        } else {
            self.power_spectrum()
        }
    }

    /// Same geometry, different spectral values.
    pub(crate) fn with_data(&self, data: Array2<Complex64>) -> FkSpectrum {
        FkSpectrum {
            data,
            n_positions: self.n_positions,
            n_samples: self.n_samples,
            dx: self.dx,
            sample_interval: self.sample_interval,
            ascending: self.ascending,
        }
    }

    /// Inverts the transform: inverse FFT-shift, inverse 2-D DFT, real part, cropped to the first
    /// `n_positions` rows and `n_samples` columns. Rows are returned in the order of the gather
    /// the spectrum was computed from.
    pub fn reconstruct(&self) -> Array2<f64> {
        let mut unshifted = ifftshift2(&self.data);
        fft2(&mut unshifted, FftDirection::Inverse);

        let cropped = unshifted
            .slice(s![..self.n_positions, ..self.n_samples])
            .mapv(|c| c.re);
        if self.ascending {
            cropped
        } else {
            let mut flipped = cropped;
            flipped.invert_axis(Axis(0));
            flipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_container::SpatialAxis;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn gather(data: &Array2<f64>, positions: &[f64]) -> TraceGather {
        TraceGather::from_array(data, positions, 1e-8, 0.0, "V", SpatialAxis::millimetres())
            .unwrap()
    }

    #[test]
    fn test_grid_geometry() {
        let data = Array2::from_shape_fn((4, 8), |(i, j)| (i + j) as f64);
        let spectrum = transform(&gather(&data, &[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(spectrum.shape(), (8, 16));
        assert_eq!(spectrum.original_shape(), (4, 8));
        assert_relative_eq!(spectrum.dk(), 0.125);
        assert_relative_eq!(spectrum.df(), 6.25e6);
        assert_eq!(spectrum.wavenumber(4), 0.0);
        assert_eq!(spectrum.frequency(8), 0.0);
        assert_relative_eq!(spectrum.wavenumber(0), -0.5);
        assert_relative_eq!(spectrum.frequency(15), 7.0 * 6.25e6);
        assert_eq!(spectrum.wavenumbers().len(), 8);
        assert_eq!(spectrum.frequencies().len(), 16);
    }

    #[test]
    fn test_dc_lands_in_center() {
        let data = Array2::from_elem((4, 8), 1.0);
        let spectrum = transform(&gather(&data, &[0.0, 1.0, 2.0, 3.0]));
        let center = spectrum.data()[[4, 8]];
        assert_abs_diff_eq!(center.re, 32.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.im, 0.0, epsilon = 1e-9);
        let power = spectrum.power_spectrum();
        let max = power.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(power[[4, 8]], max);
    }

    #[test]
    fn test_round_trip_identity() {
        let data = Array2::from_shape_fn((5, 7), |(i, j)| ((i * 7 + j) as f64 * 0.37).sin());
        let spectrum = transform(&gather(&data, &[0.0, 0.5, 1.0, 1.5, 2.0]));
        let back = spectrum.reconstruct();
        assert_eq!(back.dim(), (5, 7));
        for (a, b) in back.iter().zip(data.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_descending_gather_round_trip_keeps_order() {
        let data = Array2::from_shape_fn((3, 4), |(i, j)| (i * 10 + j) as f64);
        let descending = transform(&gather(&data, &[2.0, 1.0, 0.0]));
        let back = descending.reconstruct();
        for (a, b) in back.iter().zip(data.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }

        // the descending gather is the ascending one read backwards
        let mut reversed = data.clone();
        reversed.invert_axis(Axis(0));
        let ascending = transform(&gather(&reversed, &[0.0, 1.0, 2.0]));
        for (a, b) in descending.data().iter().zip(ascending.data().iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_nearest_index_and_point_at() {
        let data = Array2::zeros((4, 8));
        let spectrum = transform(&gather(&data, &[0.0, 1.0, 2.0, 3.0]));
        let point = spectrum.point_at(5, 10);
        assert_eq!(spectrum.nearest_index(&point), (5, 10));
        assert_eq!(
            spectrum.nearest_index(&SpectralPoint::new(1e12, -1e3)),
            (0, 15)
        );
    }

    #[test]
    fn test_velocity_of_point() {
        assert_eq!(SpectralPoint::new(1.0, 0.0).velocity(1e3), None);
        assert_relative_eq!(
            SpectralPoint::new(6.25e6, 0.125).velocity(1e-3).unwrap(),
            5e4
        );
    }

    #[test]
    fn test_display_power_respects_log_setting() {
        let data = Array2::from_elem((2, 2), 1.0);
        let spectrum = transform(&gather(&data, &[0.0, 1.0]));
        let mut config = FkConfig::default();
        assert_eq!(spectrum.display_power(&config), spectrum.power_spectrum());
        config.log_power = true;
        let db = spectrum.display_power(&config);
        assert_abs_diff_eq!(db[[2, 2]], 10.0 * 16.0_f64.log10(), epsilon = 1e-9);
    }
}
