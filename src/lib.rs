//! Frequency-wavenumber (F-K) velocity filtering of scanned trace gathers.
//!
//! A gather of time traces recorded at uniformly spaced positions is transformed into the F-K
//! domain, where a wave crossing the aperture at a constant apparent velocity shows up as a
//! line through the origin. Two picked points define a band of velocities that is notched out
//! of the spectrum before the gather is reconstructed.
//!
//! ```no_run
//! use fk_velocity_filter::{fk_filter, FkConfig, SpectralPoint, SpatialAxis, TraceGather};
//! use ndarray::Array2;
//!
//! # fn main() -> fk_velocity_filter::Result<()> {
//! let data = Array2::<f64>::zeros((4, 8));
//! let gather = TraceGather::from_array(
//!     &data,
//!     &[0.0, 1.0, 2.0, 3.0],
//!     1e-8,
//!     0.0,
//!     "mm/s/V",
//!     SpatialAxis::millimetres(),
//! )?;
//! let picks = [
//!     SpectralPoint::new(6.25e6, 0.125),
//!     SpectralPoint::new(3.75e7, 0.125),
//! ];
//! let output = fk_filter(&gather, &picks, &FkConfig::default())?;
//! println!("rejected {}", output.band.label());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_container;
pub mod error;
pub mod filters;
pub mod math_tools;
pub mod picker;

pub use config::{ConfigCommand, FkConfig};
pub use data_container::{SpatialAxis, Trace, TraceGather};
pub use error::{FkError, Result};
pub use filters::delay_normalizer::{
    normalize_delay, DelayCorrection, DelayNormalizer, DelayNotice,
};
pub use filters::filter::{Filter, FilterChain, FilterConfig, FilterDomain};
pub use filters::fk_filter::{
    apply_filter, apply_mask, fk_filter, FkFilterOutput, FkNotchFilter,
};
pub use filters::fk_spectrum::{transform, FkSpectrum, SpectralPoint};
pub use filters::velocity_mask::{velocity_label, VelocityBand, VelocityMask};
pub use picker::{collect_picks, PickAccumulator, PickEvent};
