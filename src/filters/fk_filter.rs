//! Velocity notch filtering in the F-K domain.
//!
//! [`fk_filter`] runs the whole pipeline for one gather: delay removal, zero-padded 2-D FFT,
//! velocity band from the two picks, notch mask with smoothed edges, masking and inversion.
//! The picks are checked before anything is transformed, so a wrong number of points never
//! produces a partial mask.
//!
//! [`FkNotchFilter`] wraps the same steps as a [`Filter`] for use in a
//! [`FilterChain`](crate::filters::filter::FilterChain).

use crate::config::FkConfig;
use crate::data_container::TraceGather;
use crate::error::{FkError, Result};
use crate::filters::delay_normalizer::{normalize_delay, DelayNotice};
use crate::filters::filter::{Filter, FilterConfig, FilterDomain};
use crate::filters::fk_spectrum::{transform, FkSpectrum, SpectralPoint};
use crate::filters::velocity_mask::{VelocityBand, VelocityMask};
use crate::picker::require_two;
use ndarray::{Array2, Zip};
use num_complex::Complex64;

/// Result of [`fk_filter`].
#[derive(Debug, Clone)]
pub struct FkFilterOutput {
    /// Filtered gather, same positions and headers as the delay-normalized input.
    pub gather: TraceGather,
    /// Rejected velocity band.
    pub band: VelocityBand,
    /// Smoothed mask that was applied.
    pub mask: VelocityMask,
    /// Set when the input carried no delay to remove.
    pub notice: Option<DelayNotice>,
}

/// Multiplies `spectrum` element-wise by `mask`.
///
/// Returns [`FkError::ShapeMismatch`] if the grids differ.
pub fn apply_mask(spectrum: &FkSpectrum, mask: &VelocityMask) -> Result<FkSpectrum> {
    if spectrum.shape() != mask.shape() {
        return Err(FkError::ShapeMismatch {
            spectrum: spectrum.shape(),
            mask: mask.shape(),
        });
    }
    let mut data = Array2::<Complex64>::zeros(spectrum.shape());
    Zip::from(&mut data)
        .and(spectrum.data())
        .and(mask.values())
        .for_each(|out, &s, &m| *out = s * m);
    Ok(spectrum.with_data(data))
}

/// Masks the spectrum of `gather` and reconstructs a gather of the original shape.
///
/// `spectrum` must have been computed from `gather`.
pub fn apply_filter(
    gather: &TraceGather,
    spectrum: &FkSpectrum,
    mask: &VelocityMask,
) -> Result<TraceGather> {
    let (n_positions, n_samples) = spectrum.original_shape();
    if (gather.n_positions(), gather.n_samples()) != (n_positions, n_samples) {
        return Err(FkError::configuration(format!(
            "spectrum was computed from a {n_positions} x {n_samples} gather, got {} x {}",
            gather.n_positions(),
            gather.n_samples()
        )));
    }
    let filtered = apply_mask(spectrum, mask)?;
    gather.with_samples(&filtered.reconstruct())
}

/// Rejects the apparent velocities between the two `picks` from `gather`.
///
/// Fails with [`FkError::InsufficientInput`] or [`FkError::AmbiguousInput`] unless exactly two
/// picks are given, and with [`FkError::Configuration`] for an invalid `config` or a delay that
/// exceeds the trace length.
pub fn fk_filter(
    gather: &TraceGather,
    picks: &[SpectralPoint],
    config: &FkConfig,
) -> Result<FkFilterOutput> {
    config.validate()?;
    let band = VelocityBand::from_picks(picks, config.scale)?;

    let correction = normalize_delay(gather)?;
    let notice = correction.notice();
    let normalized = correction.into_gather();

    let spectrum = transform(&normalized);
    let mask = VelocityMask::notch(&band, &spectrum, config.scale).smoothed(config.spread)?;
    let filtered = apply_filter(&normalized, &spectrum, &mask)?;
    log::info!(
        "F-K notch {} applied to {} traces of {} samples",
        band.label(),
        filtered.n_positions(),
        filtered.n_samples()
    );

    Ok(FkFilterOutput {
        gather: filtered,
        band,
        mask,
        notice,
    })
}

/// The F-K velocity notch as a chain stage.
///
/// Runs on an already delay-normalized gather (put a
/// [`DelayNormalizer`](crate::filters::delay_normalizer::DelayNormalizer) in front of it).
/// The power spectrum and mask of the last run are kept for display.
#[derive(Debug, Clone, Default)]
pub struct FkNotchFilter {
    picks: Option<[SpectralPoint; 2]>,
    pub last_spectrum: Option<Array2<f64>>,
    pub last_mask: Option<VelocityMask>,
}

impl FkNotchFilter {
    /// Sets the picks from any number of points; exactly two are accepted.
    pub fn set_picks(&mut self, points: &[SpectralPoint]) -> Result<()> {
        self.picks = Some(require_two(points)?);
        Ok(())
    }

    pub fn picks(&self) -> Option<&[SpectralPoint; 2]> {
        self.picks.as_ref()
    }
}

impl Filter for FkNotchFilter {
    fn new() -> Self {
        FkNotchFilter::default()
    }

    fn reset(&mut self) {
        self.last_spectrum = None;
        self.last_mask = None;
    }

    fn config(&self) -> FilterConfig {
        FilterConfig {
            name: "F-K Velocity Notch".to_string(),
            description: "Rejects a band of apparent velocities in the frequency-wavenumber \
                domain, keeping all other arrivals."
                .to_string(),
            domain: FilterDomain::Frequency,
        }
    }

    fn filter(&mut self, gather: &TraceGather, config: &FkConfig) -> Result<TraceGather> {
        config.validate()?;
        let picks = self.picks.ok_or(FkError::InsufficientInput { got: 0 })?;
        let band = VelocityBand::from_picks(&picks, config.scale)?;

        let spectrum = transform(gather);
        let mask = VelocityMask::notch(&band, &spectrum, config.scale).smoothed(config.spread)?;
        let filtered = apply_filter(gather, &spectrum, &mask)?;

        self.last_spectrum = Some(spectrum.display_power(config));
        self.last_mask = Some(mask);
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_container::SpatialAxis;
    use approx::assert_relative_eq;

    fn gather(n_positions: usize, n_samples: usize) -> TraceGather {
        let data = Array2::from_shape_fn((n_positions, n_samples), |(i, j)| {
            ((i * n_samples + j) as f64 * 0.61).cos() + 0.1 * i as f64
        });
        let positions: Vec<f64> = (0..n_positions).map(|i| 0.5 * i as f64).collect();
        TraceGather::from_array(
            &data,
            &positions,
            1e-8,
            0.0,
            "m/s/V",
            SpatialAxis::millimetres(),
        )
        .unwrap()
    }

    fn picks() -> [SpectralPoint; 2] {
        [
            SpectralPoint::new(6.25e6, 0.125),
            SpectralPoint::new(3.75e7, 0.125),
        ]
    }

    #[test]
    fn test_all_pass_mask_is_identity() {
        let input = gather(5, 12);
        let spectrum = transform(&input);
        let mask = VelocityMask::all_pass(spectrum.shape());
        let out = apply_filter(&input, &spectrum, &mask).unwrap();
        for (a, b) in out.to_array().iter().zip(input.to_array().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_shape_invariance() {
        let input = gather(6, 16);
        let config = FkConfig {
            scale: 1e-3,
            ..FkConfig::default()
        };
        let output = fk_filter(&input, &picks(), &config).unwrap();
        let out = &output.gather;
        assert_eq!(out.n_positions(), input.n_positions());
        assert_eq!(out.n_samples(), input.n_samples());
        assert_eq!(out.positions(), input.positions());
        assert_eq!(out.sample_interval(), input.sample_interval());
        assert_eq!(out.axis(), input.axis());
        assert!(out
            .traces()
            .iter()
            .all(|t| t.calibration_unit == "m/s/V"));
        assert_eq!(output.mask.shape(), (12, 32));
        assert!(output.notice.is_some());
    }

    #[test]
    fn test_shape_mismatch() {
        let input = gather(4, 8);
        let spectrum = transform(&input);
        let mask = VelocityMask::all_pass((8, 15));
        assert_eq!(
            apply_mask(&spectrum, &mask).map(|_| ()),
            Err(FkError::ShapeMismatch {
                spectrum: (8, 16),
                mask: (8, 15),
            })
        );
        assert!(apply_filter(&gather(3, 8), &spectrum, &VelocityMask::all_pass((8, 16))).is_err());
    }

    #[test]
    fn test_wrong_pick_count_stops_before_filtering() {
        let input = gather(4, 8);
        let config = FkConfig::default();
        let one = &picks()[..1];
        assert!(matches!(
            fk_filter(&input, one, &config),
            Err(FkError::InsufficientInput { got: 1 })
        ));
        let three = [picks()[0], picks()[1], picks()[0]];
        assert!(matches!(
            fk_filter(&input, &three, &config),
            Err(FkError::AmbiguousInput { got: 3 })
        ));
    }

    #[test]
    fn test_invalid_spread_is_rejected() {
        let config = FkConfig {
            spread: 4,
            ..FkConfig::default()
        };
        assert!(matches!(
            fk_filter(&gather(4, 8), &picks(), &config),
            Err(FkError::Configuration { .. })
        ));
    }

    #[test]
    fn test_notch_filter_stage() {
        let input = gather(4, 8);
        let config = FkConfig {
            scale: 1e-3,
            ..FkConfig::default()
        };
        let mut stage = FkNotchFilter::new();
        assert_eq!(
            stage.filter(&input, &config),
            Err(FkError::InsufficientInput { got: 0 })
        );
        assert!(stage.set_picks(&picks()[..1]).is_err());
        assert!(stage.picks().is_none());

        stage.set_picks(&picks()).unwrap();
        for scale in [f64::NAN, 0.0] {
            let invalid = FkConfig {
                scale,
                ..config.clone()
            };
            assert!(matches!(
                stage.filter(&input, &invalid),
                Err(FkError::Configuration { .. })
            ));
        }
        assert!(stage.last_mask.is_none());

        stage.set_picks(&picks()).unwrap();
        let out = stage.filter(&input, &config).unwrap();
        let direct = fk_filter(&input, &picks(), &config).unwrap();
        assert_eq!(out, direct.gather);
        assert_eq!(stage.last_mask.as_ref(), Some(&direct.mask));
        assert_eq!(stage.last_spectrum.as_ref().map(|s| s.dim()), Some((8, 16)));

        stage.reset();
        assert!(stage.last_mask.is_none());
        assert!(stage.picks().is_some());
    }
}
