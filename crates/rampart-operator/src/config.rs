//! Operator configuration with bounds validation.
//!
//! The configuration is an explicit, versioned object injected into the
//! operator at construction; there are no global singletons. Every invariant
//! is checked by [`OperatorConfig::validate`] so an unreachable state (for
//! example a regeneration threshold larger than its observation window) is
//! rejected before it can take effect.

use rampart_types::{ONE_HUNDRED_PERCENT, SECS_PER_DAY, SECS_PER_HOUR};
use serde::{Deserialize, Serialize};

use crate::{OperatorError, Result};

/// Minimum cushion factor and reserve factor (1%).
pub const MIN_FACTOR: u32 = 100;

/// Minimum cushion auction duration (1 day).
pub const MIN_CUSHION_DURATION: u64 = SECS_PER_DAY;

/// Maximum cushion auction duration (7 days).
pub const MAX_CUSHION_DURATION: u64 = 7 * SECS_PER_DAY;

/// Minimum cushion deposit interval (1 hour).
pub const MIN_DEPOSIT_INTERVAL: u64 = SECS_PER_HOUR;

/// Minimum cushion debt buffer (1%).
pub const MIN_DEBT_BUFFER: u32 = 100;

/// Operator control-loop parameters. All percentages are basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Fraction of remaining wall capacity offered by a cushion auction.
    #[serde(default = "default_cushion_factor")]
    pub cushion_factor: u32,
    /// Lifetime of a cushion auction in seconds.
    #[serde(default = "default_cushion_duration")]
    pub cushion_duration: u64,
    /// Debt buffer forwarded to the auction mechanism.
    #[serde(default = "default_cushion_debt_buffer")]
    pub cushion_debt_buffer: u32,
    /// Deposit interval forwarded to the auction mechanism, in seconds.
    #[serde(default = "default_cushion_deposit_interval")]
    pub cushion_deposit_interval: u64,
    /// Fraction of treasury reserves eligible as wall capacity.
    #[serde(default = "default_reserve_factor")]
    pub reserve_factor: u32,
    /// Minimum seconds between regenerations of one side.
    #[serde(default = "default_regen_wait")]
    pub regen_wait: u64,
    /// Favorable observations required for regeneration.
    #[serde(default = "default_regen_threshold")]
    pub regen_threshold: u32,
    /// Length of the regeneration observation window.
    #[serde(default = "default_regen_observe")]
    pub regen_observe: usize,
    /// Bumped on every successful admin mutation.
    #[serde(default)]
    pub version: u32,
}

fn default_cushion_factor() -> u32 {
    1_000
}

fn default_cushion_duration() -> u64 {
    2 * SECS_PER_DAY
}

fn default_cushion_debt_buffer() -> u32 {
    3_000
}

fn default_cushion_deposit_interval() -> u64 {
    4 * SECS_PER_HOUR
}

fn default_reserve_factor() -> u32 {
    1_000
}

fn default_regen_wait() -> u64 {
    SECS_PER_DAY
}

fn default_regen_threshold() -> u32 {
    5
}

fn default_regen_observe() -> usize {
    7
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            cushion_factor: default_cushion_factor(),
            cushion_duration: default_cushion_duration(),
            cushion_debt_buffer: default_cushion_debt_buffer(),
            cushion_deposit_interval: default_cushion_deposit_interval(),
            reserve_factor: default_reserve_factor(),
            regen_wait: default_regen_wait(),
            regen_threshold: default_regen_threshold(),
            regen_observe: default_regen_observe(),
            version: 0,
        }
    }
}

impl OperatorConfig {
    /// Check every configuration invariant.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidParams`] naming the violated bound
    pub fn validate(&self) -> Result<()> {
        check_factor("cushion factor", self.cushion_factor, MIN_FACTOR)?;
        check_factor("reserve factor", self.reserve_factor, MIN_FACTOR)?;
        if !(MIN_CUSHION_DURATION..=MAX_CUSHION_DURATION).contains(&self.cushion_duration) {
            return Err(OperatorError::InvalidParams(format!(
                "cushion duration {} outside [{MIN_CUSHION_DURATION}, {MAX_CUSHION_DURATION}]",
                self.cushion_duration
            )));
        }
        if self.cushion_debt_buffer < MIN_DEBT_BUFFER {
            return Err(OperatorError::InvalidParams(format!(
                "cushion debt buffer {} below {MIN_DEBT_BUFFER}",
                self.cushion_debt_buffer
            )));
        }
        if !(MIN_DEPOSIT_INTERVAL..=self.cushion_duration).contains(&self.cushion_deposit_interval)
        {
            return Err(OperatorError::InvalidParams(format!(
                "cushion deposit interval {} outside [{MIN_DEPOSIT_INTERVAL}, {}]",
                self.cushion_deposit_interval, self.cushion_duration
            )));
        }
        if self.regen_threshold == 0 || self.regen_observe == 0 {
            return Err(OperatorError::InvalidParams(
                "regen threshold and window must be nonzero".into(),
            ));
        }
        if self.regen_threshold as usize > self.regen_observe {
            return Err(OperatorError::InvalidParams(format!(
                "regen threshold {} exceeds observation window {}",
                self.regen_threshold, self.regen_observe
            )));
        }
        Ok(())
    }
}

fn check_factor(name: &str, value: u32, min: u32) -> Result<()> {
    if !(min..=ONE_HUNDRED_PERCENT).contains(&value) {
        return Err(OperatorError::InvalidParams(format!(
            "{name} {value} outside [{min}, {ONE_HUNDRED_PERCENT}]"
        )));
    }
    Ok(())
}
