use crate::error::{FkError, Result};
use serde::{Deserialize, Serialize};

/// Zero-padding factor applied to both the position and the time axis before the 2-D FFT.
pub const ZERO_PADDING_FACTOR: usize = 2;

/// Default size of the triangular mask smoothing kernel.
pub const DEFAULT_SPREAD: usize = 7;

/// Default factor applied to `frequency / wavenumber` to obtain a velocity.
pub const DEFAULT_SCALE: f64 = 1e3;

/// Commands that update a [`FkConfig`], one per setting.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    SetSpread(usize),
    SetScale(f64),
    SetLogPower(bool),
}

/// Settings of the F-K filter.
///
/// # Fields
/// - `spread`: Size of the triangular smoothing kernel applied to the mask (odd, `>= 1`).
/// - `scale`: Velocity unit conversion applied to `frequency / wavenumber`.
/// - `log_power`: Report the display power spectrum in dB instead of linear power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FkConfig {
    pub spread: usize,
    pub scale: f64,
    pub log_power: bool,
}

impl Default for FkConfig {
    fn default() -> Self {
        FkConfig {
            spread: DEFAULT_SPREAD,
            scale: DEFAULT_SCALE,
            log_power: false,
        }
    }
}

impl FkConfig {
    pub fn validate(&self) -> Result<()> {
        validate_spread(self.spread)?;
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(FkError::configuration(format!(
                "velocity scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    pub fn apply(&mut self, command: ConfigCommand) {
        match command {
            ConfigCommand::SetSpread(spread) => self.spread = spread,
            ConfigCommand::SetScale(scale) => self.scale = scale,
            ConfigCommand::SetLogPower(log_power) => self.log_power = log_power,
        }
    }
}

/// Checks that a smoothing kernel size is a positive odd integer.
pub fn validate_spread(spread: usize) -> Result<()> {
    if spread < 1 {
        return Err(FkError::configuration("spread must be at least 1"));
    }
    if spread % 2 == 0 {
        return Err(FkError::configuration(format!(
            "spread must be odd, got {spread}"
        )));
    }
    Ok(())
}
