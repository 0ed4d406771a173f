//! # Drivetrain control module
//!
//! Closed loop heading control of the differential drive base. Commands set
//! the drivetrain's demands (speed, turn rate, target heading and the mode
//! flags) and once per cycle `proc` reads the gyro, runs the heading
//! controller and sends the resulting side demands to the actuator.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod modes;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use modes::*;
pub use params::*;
pub use state::*;

use crate::angular_pid::AngularPidError;
use crate::kinematics::KinematicsError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during Drivetrain operation.
#[derive(Debug, thiserror::Error)]
pub enum DrivetrainError {
    #[error("The drivetrain has not been initialised")]
    NotInitialised,

    #[error("Invalid drivetrain parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid heading controller parameters: {0}")]
    InvalidHeadCtrl(#[from] AngularPidError),

    #[error("Invalid drivetrain geometry: {0}")]
    InvalidGeometry(#[from] KinematicsError),
}
