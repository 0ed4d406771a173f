//! Parameters structure for the Drivetrain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::DrivetrainError;
use crate::angular_pid::AngularPidParams;
use crate::eqpt::NeutralMode;
use crate::kinematics::DiffDriveKinematics;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drivetrain.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Distance between the centres of the left and right wheels.
    ///
    /// Units: meters
    pub track_width_m: f64,

    // ---- CAPABILITIES ----

    /// Side velocity corresponding to a normalised demand of 1.0.
    ///
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Maximum rate of turn demanded from operator input.
    ///
    /// Units: radians/second
    pub max_angular_velocity_rads: f64,

    /// Lowest normalised demand accepted by the actuator.
    pub min_output: f64,

    /// Highest normalised demand accepted by the actuator.
    pub max_output: f64,

    /// Motor behaviour when no drive is demanded.
    #[serde(default)]
    pub neutral_mode: NeutralMode,

    // ---- HEADING CONTROL ----

    /// Period of the control cycle, used by the heading controllers.
    ///
    /// The executable overwrites this with its own cycle period.
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// Heading controller used by the drivetrain's own heading hold. The
    /// controller output is a normalised differential demand per degree of
    /// error.
    pub head_ctrl: AngularPidParams,

    /// Heading hold controller used while driving manually. The controller
    /// output is a turn rate in degrees/second.
    pub drive_head_ctrl: AngularPidParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

fn default_cycle_period_s() -> f64 {
    0.02
}

impl Params {
    /// Check the parameters describe a physically sensible drivetrain.
    pub fn validate(&self) -> Result<(), DrivetrainError> {
        DiffDriveKinematics::new(self.track_width_m)?;

        if !(self.max_velocity_ms.is_finite() && self.max_velocity_ms > 0.0) {
            return Err(DrivetrainError::InvalidParams(format!(
                "max_velocity_ms must be positive, found {}",
                self.max_velocity_ms
            )));
        }

        if !(self.max_angular_velocity_rads.is_finite() && self.max_angular_velocity_rads > 0.0) {
            return Err(DrivetrainError::InvalidParams(format!(
                "max_angular_velocity_rads must be positive, found {}",
                self.max_angular_velocity_rads
            )));
        }

        if !(self.min_output < self.max_output) {
            return Err(DrivetrainError::InvalidParams(format!(
                "output range [{}, {}] is empty",
                self.min_output, self.max_output
            )));
        }

        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(DrivetrainError::InvalidParams(format!(
                "cycle_period_s must be positive, found {}",
                self.cycle_period_s
            )));
        }

        self.head_ctrl.validate()?;
        self.drive_head_ctrl.validate()?;

        Ok(())
    }
}
