//! Filters applied to trace gathers.
//!
//! Filters are organized by their domain of operation and processing order.
//!
//! # Filter Categories
//!
//! * **Time Domain Filters (Pre-FFT)**: Applied to the raw traces before the 2-D transform.
//!
//! * **Frequency Domain Filters**: Applied in the frequency-wavenumber (F-K) domain.
//!
//! # Filter Implementations
//!
//! Each filter implements the `Filter` trait defined in the `filter` module,
//! providing a consistent interface for configuration and application.

/// Removes the leading instrument delay from every trace.
pub mod delay_normalizer;

/// Core filter interfaces and shared components.
/// Defines the `Filter` trait and the `FilterChain` that runs filters in domain order.
pub mod filter;

/// Velocity notch filtering: masking, inversion and the complete pipeline.
pub mod fk_filter;

/// Zero-padded, centered 2-D spectrum of a gather and its axes.
pub mod fk_spectrum;

/// Velocity band from two picks and the smoothed notch mask.
pub mod velocity_mask;
