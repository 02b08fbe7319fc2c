//! Velocity band and notch mask construction.
//!
//! Two picked spectral points define a band of apparent velocities `[v_min, v_max]`. The mask
//! *rejects* (0) every grid cell whose apparent velocity lies inside the band and *passes* (1)
//! everything else, i.e. it is a velocity notch and not a band pass. The binary mask is then
//! smoothed with a separable triangular kernel to soften the transition before inversion.
//!
//! The zero-wavenumber column has no defined velocity. It is rejected only when the band
//! straddles zero (`v_min < 0 < v_max`) and passed otherwise, including bands that end at zero.

use crate::config::validate_spread;
use crate::error::{FkError, Result};
use crate::filters::fk_spectrum::{FkSpectrum, SpectralPoint};
use crate::math_tools::{separable_convolve_same, triangular_window};
use crate::picker::require_two;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Formats a velocity for display as `"<int> m/s"`, rounded to the nearest integer.
pub fn velocity_label(velocity: f64) -> String {
    format!("{} m/s", velocity.round() as i64)
}

/// A closed band of apparent velocities, `v_min <= v_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityBand {
    v_min: f64,
    v_max: f64,
}

impl VelocityBand {
    /// Creates a band from two velocities in any order.
    pub fn new(a: f64, b: f64) -> Self {
        VelocityBand {
            v_min: a.min(b),
            v_max: a.max(b),
        }
    }

    /// Builds the band from exactly two picks.
    ///
    /// A pick on the zero-wavenumber column has no velocity and is rejected as a
    /// configuration error.
    pub fn from_picks(points: &[SpectralPoint], scale: f64) -> Result<Self> {
        let [first, second] = require_two(points)?;
        let velocity = |point: &SpectralPoint| {
            point.velocity(scale).ok_or_else(|| {
                FkError::configuration(format!(
                    "pick at f = {:e} Hz lies on the zero-wavenumber column",
                    point.frequency
                ))
            })
        };
        let band = VelocityBand::new(velocity(&first)?, velocity(&second)?);
        log::info!("velocity band {}", band.label());
        if band.is_degenerate() {
            log::warn!("picks share one velocity, the notch collapses to a single line");
        }
        Ok(band)
    }

    pub fn v_min(&self) -> f64 {
        self.v_min
    }

    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// True when the band contains velocities of both signs.
    pub fn straddles_zero(&self) -> bool {
        self.v_min < 0.0 && self.v_max > 0.0
    }

    /// True when both picks have the same velocity.
    pub fn is_degenerate(&self) -> bool {
        self.v_min == self.v_max
    }

    pub fn contains(&self, velocity: f64) -> bool {
        self.v_min <= velocity && velocity <= self.v_max
    }

    pub fn label(&self) -> String {
        format!(
            "{} .. {}",
            velocity_label(self.v_min),
            velocity_label(self.v_max)
        )
    }
}

/// Real-valued pass/reject weights over the spectral grid, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityMask {
    values: Array2<f64>,
}

impl VelocityMask {
    /// Binary notch mask of `band` over the grid of `spectrum`.
    pub fn notch(band: &VelocityBand, spectrum: &FkSpectrum, scale: f64) -> Self {
        let (n_k, n_f) = spectrum.shape();
        let frequencies = spectrum.frequencies();
        let zero_column = if band.straddles_zero() { 0.0 } else { 1.0 };

        let values = Array2::from_shape_fn((n_k, n_f), |(i, j)| {
            let k = spectrum.wavenumber(i);
            if k == 0.0 {
                zero_column
            } else if band.contains(frequencies[j] / k * scale) {
                0.0
            } else {
                1.0
            }
        });
        let mask = VelocityMask { values };
        log::debug!(
            "notch mask {:?} for {}: {:.1} % pass",
            mask.shape(),
            band.label(),
            100.0 * mask.pass_fraction()
        );
        mask
    }

    /// Mask that passes every cell.
    pub fn all_pass(shape: (usize, usize)) -> Self {
        VelocityMask {
            values: Array2::ones(shape),
        }
    }

    /// Wraps precomputed weights.
    pub fn from_values(values: Array2<f64>) -> Self {
        VelocityMask { values }
    }

    /// Returns the mask convolved with a `spread x spread` triangular kernel (same size,
    /// zero-padded at the grid boundary). `spread` must be odd and `>= 1`.
    pub fn smoothed(&self, spread: usize) -> Result<Self> {
        validate_spread(spread)?;
        Ok(VelocityMask {
            values: separable_convolve_same(&self.values, &triangular_window(spread)),
        })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Mean weight over the grid.
    pub fn pass_fraction(&self) -> f64 {
        self.values.mean().unwrap_or(0.0)
    }
}
