//! Removal of the fixed leading delay (instrument and decoder propagation time) from every trace.
//!
//! The delay is stored in the trace headers in microseconds. A positive delay is converted to a
//! number of samples, `round(time_delay * 1e-6 / sample_interval)` with ties rounded to even,
//! which is cut from the start of every trace. A delay `<= 0` means no correction is available:
//! the gather is passed on unchanged and a [`DelayNotice`] is reported instead of an error.

use crate::config::FkConfig;
use crate::data_container::TraceGather;
use crate::error::{FkError, Result};
use crate::filters::filter::{Filter, FilterConfig, FilterDomain};
use ndarray::s;
use std::fmt::{Display, Formatter};

/// Microseconds to seconds.
const MICROSECONDS: f64 = 1e-6;

/// Advisory returned when a gather carries no usable delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayNotice {
    /// The delay found in the headers, in microseconds.
    pub time_delay: f64,
}

impl Display for DelayNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no valid delay to remove (time delay is {} us)",
            self.time_delay
        )
    }
}

/// Outcome of [`normalize_delay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DelayCorrection {
    /// Leading samples were removed; the returned gather has `time_delay == 0`.
    Trimmed {
        gather: TraceGather,
        samples_removed: usize,
    },
    /// Nothing to remove, the gather is an unchanged copy of the input.
    Skipped {
        gather: TraceGather,
        notice: DelayNotice,
    },
}

impl DelayCorrection {
    pub fn gather(&self) -> &TraceGather {
        match self {
            DelayCorrection::Trimmed { gather, .. } | DelayCorrection::Skipped { gather, .. } => {
                gather
            }
        }
    }

    pub fn into_gather(self) -> TraceGather {
        match self {
            DelayCorrection::Trimmed { gather, .. } | DelayCorrection::Skipped { gather, .. } => {
                gather
            }
        }
    }

    pub fn notice(&self) -> Option<DelayNotice> {
        match self {
            DelayCorrection::Trimmed { .. } => None,
            DelayCorrection::Skipped { notice, .. } => Some(*notice),
        }
    }

    /// Number of samples cut from the start of each trace.
    pub fn samples_removed(&self) -> usize {
        match self {
            DelayCorrection::Trimmed {
                samples_removed, ..
            } => *samples_removed,
            DelayCorrection::Skipped { .. } => 0,
        }
    }
}

/// Strips the leading delay from every trace of `gather`.
///
/// Returns [`FkError::Configuration`] if the delay amounts to all samples of a trace or more.
pub fn normalize_delay(gather: &TraceGather) -> Result<DelayCorrection> {
    let time_delay = gather.time_delay();
    if time_delay <= 0.0 || !time_delay.is_finite() {
        let notice = DelayNotice { time_delay };
        log::warn!("{notice}");
        return Ok(DelayCorrection::Skipped {
            gather: gather.clone(),
            notice,
        });
    }

    let n_samples = gather.n_samples();
    let trim =
        (time_delay * MICROSECONDS / gather.sample_interval()).round_ties_even() as usize;
    if trim >= n_samples {
        return Err(FkError::configuration(format!(
            "time delay of {time_delay} us removes {trim} samples, but traces only hold {n_samples}"
        )));
    }

    let data = gather.to_array();
    let trimmed = gather
        .with_samples(&data.slice(s![.., trim..]).to_owned())?
        .with_time_delay(0.0);
    log::debug!("removed {trim} leading samples ({time_delay} us) from every trace");
    Ok(DelayCorrection::Trimmed {
        gather: trimmed,
        samples_removed: trim,
    })
}

/// Delay removal as the first stage of a [`FilterChain`](crate::filters::filter::FilterChain).
///
/// The outcome of the last run is kept for display.
#[derive(Debug, Clone, Default)]
pub struct DelayNormalizer {
    pub last_notice: Option<DelayNotice>,
    pub last_samples_removed: usize,
}

impl Filter for DelayNormalizer {
    fn new() -> Self {
        DelayNormalizer::default()
    }

    fn reset(&mut self) {
        self.last_notice = None;
        self.last_samples_removed = 0;
    }

    fn config(&self) -> FilterConfig {
        FilterConfig {
            name: "Delay Normalizer".to_string(),
            description: "Removes the instrument delay stored in the trace headers from the \
                start of every trace."
                .to_string(),
            domain: FilterDomain::TimeBeforeFFT,
        }
    }

    fn filter(&mut self, gather: &TraceGather, _config: &FkConfig) -> Result<TraceGather> {
        let correction = normalize_delay(gather)?;
        self.last_notice = correction.notice();
        self.last_samples_removed = correction.samples_removed();
        Ok(correction.into_gather())
    }
}
