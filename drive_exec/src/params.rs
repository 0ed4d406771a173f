//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable itself, the
//! drivetrain's own parameters are in [`crate::drivetrain::Params`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::sim::SimPlantParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DriveExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive cycle overruns after which the robot is made
    /// safe.
    pub max_consec_cycle_overruns: u64,

    /// Deadzone applied to both operator sticks, in [0, 1).
    pub deadzone: f64,

    /// Command run on the drivetrain when nothing else is.
    pub default_cmd: DefaultCmd,

    /// Heading targeted by the zero heading button.
    ///
    /// Units: degrees
    #[serde(default)]
    pub zero_heading_deg: f64,

    /// Simulated plant the drivetrain drives.
    pub sim: SimPlantParams,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Choice of default drivetrain command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultCmd {
    /// Rotate in place from the turn stick
    Rotate,

    /// Arcade drive from both sticks
    Drive,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveExecParams {
    /// Check the parameters, returning a description of the first problem
    /// found.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(format!(
                "cycle_period_s must be positive, found {}",
                self.cycle_period_s
            ));
        }

        if !(self.deadzone >= 0.0 && self.deadzone < 1.0) {
            return Err(format!("deadzone must be in [0, 1), found {}", self.deadzone));
        }

        if !self.zero_heading_deg.is_finite() {
            return Err(format!(
                "zero_heading_deg must be finite, found {}",
                self.zero_heading_deg
            ));
        }

        Ok(())
    }
}
