//! # Differential drive kinematics
//!
//! Converts between the motion of the robot body (linear and angular
//! velocity) and the speeds of the left and right sides of the drive base.
//!
//! Angular velocity follows the heading convention used throughout the crate
//! and is positive **clockwise**, so a positive turn rate drives the left side
//! faster than the right.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic model of a differential drive base.
#[derive(Debug, Clone, Copy)]
pub struct DiffDriveKinematics {
    /// Distance between the centres of the left and right wheels.
    ///
    /// Units: meters
    track_width_m: f64,
}

/// Velocity of the robot body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ChassisSpeeds {
    /// Forward velocity.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Rate of turn, clockwise positive.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// Speed of each side of the drive base.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct WheelSpeeds {
    /// Units: meters/second
    pub left_ms: f64,

    /// Units: meters/second
    pub right_ms: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("Track width must be a positive number of meters, found {0}")]
    InvalidTrackWidth(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDriveKinematics {
    /// Create a new model for the given track width.
    ///
    /// A zero, negative or non-finite track width is rejected here rather
    /// than producing a division by zero in `to_chassis_speeds`.
    pub fn new(track_width_m: f64) -> Result<Self, KinematicsError> {
        if !(track_width_m.is_finite() && track_width_m > 0.0) {
            return Err(KinematicsError::InvalidTrackWidth(track_width_m));
        }

        Ok(Self { track_width_m })
    }

    pub fn track_width_m(&self) -> f64 {
        self.track_width_m
    }

    /// Get the side speeds needed to achieve the given body velocity.
    pub fn to_wheel_speeds(&self, chassis: ChassisSpeeds) -> WheelSpeeds {
        let half_diff = chassis.omega_rads * self.track_width_m / 2.0;

        WheelSpeeds {
            left_ms: chassis.vx_ms + half_diff,
            right_ms: chassis.vx_ms - half_diff,
        }
    }

    /// Get the body velocity produced by the given side speeds.
    pub fn to_chassis_speeds(&self, wheels: WheelSpeeds) -> ChassisSpeeds {
        ChassisSpeeds {
            vx_ms: (wheels.left_ms + wheels.right_ms) / 2.0,
            omega_rads: (wheels.left_ms - wheels.right_ms) / self.track_width_m,
        }
    }
}

impl WheelSpeeds {
    /// Scale both sides down by the same factor so that neither exceeds
    /// `max_ms`, preserving the ratio between them.
    pub fn desaturate(self, max_ms: f64) -> Self {
        let largest = self.left_ms.abs().max(self.right_ms.abs());

        if largest > max_ms && largest > 0.0 {
            let scale = max_ms / largest;
            WheelSpeeds {
                left_ms: self.left_ms * scale,
                right_ms: self.right_ms * scale,
            }
        } else {
            self
        }
    }
}
