//! This module defines the trace gather data model: uniformly sampled time traces recorded at
//! successive scan positions, together with the spatial axis they were recorded along.

use crate::error::{FkError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Relative tolerance used when checking that the scan positions are uniformly spaced.
const SPACING_TOLERANCE: f64 = 1e-6;

/// The axis along which the traces of a gather were recorded.
///
/// Linear scans (stage steps along x) and angular scans (rotation steps) run through the exact
/// same transform; the variant only selects the label shown next to the axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpatialAxis {
    /// Linear stage position, e.g. `mm`.
    Linear { unit: String },
    /// Angular stage position, e.g. `deg`.
    Angular { unit: String },
}

impl SpatialAxis {
    /// Linear axis in millimetres.
    pub fn millimetres() -> Self {
        SpatialAxis::Linear {
            unit: "mm".to_string(),
        }
    }

    /// Angular axis in degrees.
    pub fn degrees() -> Self {
        SpatialAxis::Angular {
            unit: "deg".to_string(),
        }
    }

    /// Unit of the position values.
    pub fn unit(&self) -> &str {
        match self {
            SpatialAxis::Linear { unit } | SpatialAxis::Angular { unit } => unit,
        }
    }

    /// Axis label for display, e.g. `x [mm]` or `theta [deg]`.
    pub fn label(&self) -> String {
        match self {
            SpatialAxis::Linear { unit } => format!("x [{unit}]"),
            SpatialAxis::Angular { unit } => format!("theta [{unit}]"),
        }
    }
}

impl Default for SpatialAxis {
    fn default() -> Self {
        SpatialAxis::millimetres()
    }
}

impl Display for SpatialAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single time-sampled signal recorded at one scan position.
///
/// # Fields
/// - `samples`: The sampled signal.
/// - `sample_interval`: Seconds per sample.
/// - `time_delay`: Leading instrument/decoder delay in microseconds. A value `<= 0` means that
///   no delay correction is available.
/// - `position`: Spatial (or angular) coordinate of the trace.
/// - `calibration_unit`: Calibration label of the recording channel, only used to pick a display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub samples: Array1<f64>,
    pub sample_interval: f64,
    pub time_delay: f64,
    pub position: f64,
    pub calibration_unit: String,
}

impl Trace {
    pub fn new(
        samples: Array1<f64>,
        sample_interval: f64,
        time_delay: f64,
        position: f64,
        calibration_unit: impl Into<String>,
    ) -> Self {
        Trace {
            samples,
            sample_interval,
            time_delay,
            position,
            calibration_unit: calibration_unit.into(),
        }
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Recorded duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.sample_interval
    }

    /// Unit to display the samples in, derived from the calibration label.
    ///
    /// Vibrometer decoders report their sensitivity per volt (`mm/s/V`, `m/s/V`, `um/V`, ...),
    /// the samples are then shown in the numerator unit. Unknown labels fall back to volts.
    pub fn display_unit(&self) -> &str {
        match self.calibration_unit.trim() {
            "mm/s/V" => "mm/s",
            "m/s/V" => "m/s",
            "um/s/V" => "um/s",
            "nm/V" => "nm",
            "um/V" => "um",
            "mm/V" => "mm",
            _ => "V",
        }
    }
}

/// An ordered collection of traces recorded at uniformly spaced, monotonic positions.
///
/// A gather is immutable once built; every processing step returns a new gather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTraceGather")]
pub struct TraceGather {
    traces: Vec<Trace>,
    axis: SpatialAxis,
}

/// Unchecked form of a gather, validated on deserialization.
#[derive(Deserialize)]
struct RawTraceGather {
    traces: Vec<Trace>,
    axis: SpatialAxis,
}

impl TryFrom<RawTraceGather> for TraceGather {
    type Error = FkError;

    fn try_from(raw: RawTraceGather) -> Result<Self> {
        TraceGather::new(raw.traces, raw.axis)
    }
}

impl TraceGather {
    /// Builds a gather and checks its invariants.
    ///
    /// All traces must share `sample_interval`, `n_samples` and `time_delay`, and positions must be
    /// strictly monotonic with a constant step.
    pub fn new(traces: Vec<Trace>, axis: SpatialAxis) -> Result<Self> {
        validate(&traces)?;
        Ok(TraceGather { traces, axis })
    }

    /// Builds a gather from a `(n_positions, n_samples)` array, one row per trace.
    pub fn from_array(
        data: &Array2<f64>,
        positions: &[f64],
        sample_interval: f64,
        time_delay: f64,
        calibration_unit: &str,
        axis: SpatialAxis,
    ) -> Result<Self> {
        if data.nrows() != positions.len() {
            return Err(FkError::configuration(format!(
                "{} rows of samples but {} positions",
                data.nrows(),
                positions.len()
            )));
        }
        let traces = data
            .axis_iter(Axis(0))
            .zip(positions.iter())
            .map(|(row, &position)| {
                Trace::new(
                    row.to_owned(),
                    sample_interval,
                    time_delay,
                    position,
                    calibration_unit,
                )
            })
            .collect();
        TraceGather::new(traces, axis)
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn axis(&self) -> &SpatialAxis {
        &self.axis
    }

    pub fn n_positions(&self) -> usize {
        self.traces.len()
    }

    pub fn n_samples(&self) -> usize {
        self.traces[0].n_samples()
    }

    pub fn sample_interval(&self) -> f64 {
        self.traces[0].sample_interval
    }

    /// Leading delay in microseconds shared by all traces.
    pub fn time_delay(&self) -> f64 {
        self.traces[0].time_delay
    }

    /// Signed position step `position[i + 1] - position[i]`.
    pub fn dx(&self) -> f64 {
        self.traces[1].position - self.traces[0].position
    }

    pub fn is_ascending(&self) -> bool {
        self.dx() > 0.0
    }

    pub fn positions(&self) -> Vec<f64> {
        self.traces.iter().map(|t| t.position).collect()
    }

    /// Time axis in seconds, starting at zero.
    pub fn time_axis(&self) -> Array1<f64> {
        let dt = self.sample_interval();
        Array1::from_shape_fn(self.n_samples(), |i| i as f64 * dt)
    }

    /// Samples as a `(n_positions, n_samples)` array, rows in gather order.
    pub fn to_array(&self) -> Array2<f64> {
        let mut data = Array2::zeros((self.n_positions(), self.n_samples()));
        for (mut row, trace) in data.axis_iter_mut(Axis(0)).zip(self.traces.iter()) {
            row.assign(&trace.samples);
        }
        data
    }

    /// Returns a new gather with the same headers and the given samples, one row per trace in
    /// gather order. The number of samples per trace may differ from the current one.
    pub fn with_samples(&self, data: &Array2<f64>) -> Result<Self> {
        if data.nrows() != self.n_positions() {
            return Err(FkError::configuration(format!(
                "expected {} rows of samples, got {}",
                self.n_positions(),
                data.nrows()
            )));
        }
        let traces = self
            .traces
            .iter()
            .zip(data.axis_iter(Axis(0)))
            .map(|(trace, row)| Trace {
                samples: row.to_owned(),
                ..trace.clone()
            })
            .collect();
        TraceGather::new(traces, self.axis.clone())
    }

    /// Returns a new gather with the given delay written into every trace header.
    pub(crate) fn with_time_delay(&self, time_delay: f64) -> Self {
        let traces = self
            .traces
            .iter()
            .map(|trace| Trace {
                time_delay,
                ..trace.clone()
            })
            .collect();
        TraceGather {
            traces,
            axis: self.axis.clone(),
        }
    }
}

fn validate(traces: &[Trace]) -> Result<()> {
    if traces.len() < 2 {
        return Err(FkError::configuration(format!(
            "a gather needs at least 2 traces, got {}",
            traces.len()
        )));
    }

    let first = &traces[0];
    if !(first.sample_interval > 0.0 && first.sample_interval.is_finite()) {
        return Err(FkError::configuration(format!(
            "sample interval must be positive, got {}",
            first.sample_interval
        )));
    }
    if first.n_samples() == 0 {
        return Err(FkError::configuration("traces contain no samples"));
    }

    for (i, trace) in traces.iter().enumerate().skip(1) {
        if trace.n_samples() != first.n_samples() {
            return Err(FkError::configuration(format!(
                "trace {i} has {} samples, expected {}",
                trace.n_samples(),
                first.n_samples()
            )));
        }
        if trace.sample_interval != first.sample_interval {
            return Err(FkError::configuration(format!(
                "trace {i} has sample interval {}, expected {}",
                trace.sample_interval, first.sample_interval
            )));
        }
        if trace.time_delay != first.time_delay {
            return Err(FkError::configuration(format!(
                "trace {i} has time delay {}, expected {}",
                trace.time_delay, first.time_delay
            )));
        }
    }

    if let Some((i, trace)) = traces
        .iter()
        .enumerate()
        .find(|(_, t)| !t.position.is_finite())
    {
        return Err(FkError::configuration(format!(
            "trace {i} has non-finite position {}",
            trace.position
        )));
    }

    let dx = traces[1].position - traces[0].position;
    if dx == 0.0 || !dx.is_finite() {
        return Err(FkError::configuration(format!(
            "position spacing must be non-zero, got {dx}"
        )));
    }
    for (i, pair) in traces.windows(2).enumerate() {
        let step = pair[1].position - pair[0].position;
        if (step - dx).abs() > SPACING_TOLERANCE * dx.abs() {
            return Err(FkError::configuration(format!(
                "non-uniform position spacing between trace {i} and {}: {step} vs {dx}",
                i + 1
            )));
        }
    }
    Ok(())
}
