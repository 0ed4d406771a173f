//! # Equipment interfaces
//!
//! The drive controller talks to its hardware through two traits:
//!
//! - [`HeadingSource`] - a gyroscope providing the absolute yaw of the robot,
//! - [`DriveActuator`] - the left and right sides of the differential drive
//!   base.
//!
//! Both are expected to be fast, non-blocking calls. Any timeout on the
//! underlying bus is the implementation's responsibility.
//!
//! # Conventions
//!
//! Headings are in degrees and increase **clockwise** when viewed from above
//! (compass convention). Driving the left side faster than the right turns
//! the robot clockwise, so a positive heading rate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Simulated equipment used when no hardware is attached.
pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of absolute heading, such as a gyroscope or IMU.
pub trait HeadingSource {
    /// Read the absolute yaw of the robot in degrees.
    ///
    /// The value accumulates without wrapping, so after several turns it may
    /// lie well outside ±360. Consumers must wrap it themselves.
    fn read_yaw_deg(&mut self) -> Result<f64, EqptError>;

    /// Reset the reference frame so that the current orientation reads 0.
    ///
    /// Must be idempotent and take effect for the very next read.
    fn zero(&mut self);
}

/// The two sides of a differential drive base.
pub trait DriveActuator {
    /// Demand normalised velocities for the left and right sides.
    ///
    /// Values are in the range [-1, 1], callers are responsible for
    /// clamping.
    fn set_wheel_velocities(&mut self, left: f64, right: f64);

    /// Stop both sides.
    fn stop(&mut self) {
        self.set_wheel_velocities(0.0, 0.0);
    }

    /// Reset the integrated distance measured by the wheel encoders.
    fn zero_distance(&mut self);

    /// Set the behaviour of the motors when no drive is demanded.
    fn set_neutral_mode(&mut self, mode: NeutralMode);
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can be reported by equipment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EqptError {
    #[error("No response from the device within {0} ms")]
    Timeout(u64),

    #[error("The device reported a fault: {0}")]
    DeviceFault(String),
}

/// Behaviour of the motors when they are not being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeutralMode {
    /// Short the windings, actively resisting motion.
    Brake,
    /// Let the motors spin freely.
    Coast,
}

impl Default for NeutralMode {
    fn default() -> Self {
        NeutralMode::Brake
    }
}
