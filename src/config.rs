//! Simulator configuration.
//!
//! Configuration is read from JSON, or built with [`SimConfig::default`]
//! which reproduces the reference sizing: a 1024-entry BTB and a 10-entry
//! global history.

use std::path::Path;

use serde::{ Deserialize, Serialize };

use crate::error::{ ConfigError, Result };

mod defaults {
    /// Number of BTB slots.
    pub const BTB_SIZE: usize = 1024;

    /// Number of history positions (and weights per perceptron).
    pub const HISTORY_LENGTH: usize = 10;

    /// Coefficient used to calculate the training threshold.
    pub const THETA_COEFF: f32 = 1.93;

    /// Bias used to calculate the training threshold.
    pub const THETA_BIAS: f32 = 14.0;
}

/// What happens to a slot's weights when a different branch takes it over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// The new branch starts from the previous occupant's weights.
    #[default]
    Inherit,

    /// The weights are cleared to zero.
    Reset,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of BTB slots; must be a power of two.
    #[serde(default = "SimConfig::default_btb_size")]
    pub btb_size: usize,

    /// Length of the global history register.
    #[serde(default = "SimConfig::default_history_length")]
    pub history_length: usize,

    /// Training threshold. Defaults to `1.93 * history_length + 14`.
    ///
    /// With realistic weight sums this rarely gates anything: training
    /// happens on nearly every hit regardless.
    #[serde(default)]
    pub theta: Option<f32>,

    /// Treatment of weights when a slot is reallocated.
    #[serde(default)]
    pub weight_policy: WeightPolicy,
}

impl SimConfig {
    fn default_btb_size() -> usize { defaults::BTB_SIZE }
    fn default_history_length() -> usize { defaults::HISTORY_LENGTH }

    /// The reference threshold for a given history length.
    pub fn default_theta(history_length: usize) -> f32 {
        defaults::THETA_COEFF * (history_length as f32) + defaults::THETA_BIAS
    }

    /// The effective training threshold.
    pub fn theta(&self) -> f32 {
        self.theta.unwrap_or_else(|| Self::default_theta(self.history_length))
    }

    /// Mask applied to a program counter to select a slot.
    pub fn index_mask(&self) -> usize {
        self.btb_size - 1
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.btb_size.is_power_of_two() {
            return Err(ConfigError::BtbSizeNotPowerOfTwo(self.btb_size));
        }
        if self.history_length == 0 {
            return Err(ConfigError::ZeroHistoryLength);
        }
        let theta = self.theta();
        if !theta.is_finite() || theta < 0.0 {
            return Err(ConfigError::InvalidTheta(theta));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            btb_size: defaults::BTB_SIZE,
            history_length: defaults::HISTORY_LENGTH,
            theta: None,
            weight_policy: WeightPolicy::Inherit,
        }
    }
}
