//! This module provides the `Filter` trait and related structures for running filters over a
//! trace gather. Filters are collected in a [`FilterChain`], which orders them by their
//! [`FilterDomain`] and applies them one after the other, each stage receiving a fresh gather.

use crate::config::FkConfig;
use crate::data_container::TraceGather;
use crate::error::Result;
use std::fmt::Debug;
use std::time::Instant;

/// The `Filter` trait defines the structure and behavior of a gather filter.
///
/// Filters must implement:
/// - A `new` function to initialize a filter with default parameters.
/// - A `reset` function that drops any state computed for a previous gather.
/// - A `config` function to provide metadata for the filter.
/// - A `filter` function to apply the filter to a `TraceGather`.
///
/// Filters never modify their input gather, they return a new one. Any state kept between
/// calls (e.g. the last spectrum for display) lives in the filter itself.
///
/// **Example**:
/// ```rust
/// use fk_velocity_filter::{FilterConfig, FilterDomain, Filter, FkConfig, Result, TraceGather};
///
/// #[derive(Clone, Debug)]
/// struct Identity;
///
/// impl Filter for Identity {
///     fn new() -> Self {
///         Identity
///     }
///
///     fn reset(&mut self) {}
///
///     fn config(&self) -> FilterConfig {
///         FilterConfig {
///             name: "Identity".to_string(),
///             description: "Returns the gather unchanged.".to_string(),
///             domain: FilterDomain::TimeBeforeFFT,
///         }
///     }
///
///     fn filter(&mut self, gather: &TraceGather, _config: &FkConfig) -> Result<TraceGather> {
///         Ok(gather.clone())
///     }
/// }
/// ```
pub trait Filter: Send + Sync + Debug + CloneBoxedFilter {
    /// Creates a new instance of the filter with default parameters.
    fn new() -> Self
    where
        Self: Sized;

    /// Resets the filter to its initial state. Called when a new gather is loaded.
    fn reset(&mut self);

    /// Returns the filter configuration, including name, description and domain.
    fn config(&self) -> FilterConfig;

    /// Applies the filter to `gather` and returns the filtered copy.
    fn filter(&mut self, gather: &TraceGather, config: &FkConfig) -> Result<TraceGather>;
}

/// The `FilterDomain` enum specifies the domain and execution order of filters.
///
/// # Variants
/// - `TimeBeforeFFT`: Time-domain filters that run on the raw traces before the 2-D FFT.
/// - `Frequency`: Filters that operate in the F-K domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterDomain {
    /// Time-domain filters that run before the 2-D FFT.
    TimeBeforeFFT,
    /// Filters that operate in the F-K domain.
    Frequency,
}

/// A structure representing the configuration and metadata of a filter.
///
/// # Fields
/// - `name`: A human-readable name for the filter.
/// - `description`: A description of what the filter does.
/// - `domain`: The working domain, represented as a `FilterDomain`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub name: String,
    pub description: String,
    pub domain: FilterDomain,
}

/// A trait to allow cloning of boxed filters.
/// This is necessary because `Box<dyn Filter>` cannot be cloned directly.
pub trait CloneBoxedFilter {
    fn clone_box(&self) -> Box<dyn Filter>;
}

impl<T> CloneBoxedFilter for T
where
    T: 'static + Filter + Clone,
{
    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Filter> {
    fn clone(&self) -> Box<dyn Filter> {
        self.as_ref().clone_box()
    }
}

/// An ordered list of filters applied to a gather.
///
/// Filters run sorted by [`FilterDomain`]; filters of the same domain keep their insertion
/// order. The first failing filter stops the chain and its error is returned.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        FilterChain::default()
    }

    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
        // stable, so insertion order is kept within a domain
        self.filters.sort_by_key(|f| f.config().domain);
    }

    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut [Box<dyn Filter>] {
        &mut self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Resets every filter of the chain.
    pub fn reset(&mut self) {
        self.filters.iter_mut().for_each(|f| f.reset());
    }

    /// Runs all filters on `gather` and returns the final gather.
    pub fn run(&mut self, gather: &TraceGather, config: &FkConfig) -> Result<TraceGather> {
        config.validate()?;
        let mut current = gather.clone();
        for filter in self.filters.iter_mut() {
            let name = filter.config().name;
            let start = Instant::now();
            current = filter.filter(&current, config).map_err(|err| {
                log::error!("filter {name} failed: {err}");
                err
            })?;
            log::debug!(
                "filter {name} took {:.2} ms",
                start.elapsed().as_secs_f64() * 1e3
            );
        }
        Ok(current)
    }
}
