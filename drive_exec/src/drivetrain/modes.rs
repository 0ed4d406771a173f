//! Drivetrain actuation paths
//!
//! The drivetrain has no mode enum of its own. Its behaviour is the product
//! of three independent flags, which are mapped to an [`ActuationPath`] by
//! the decision table in [`ActuationPath::select`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The formula used to build the side demands on a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActuationPath {
    /// Drive at `speed` while the heading controller steers towards the
    /// target heading: `(speed + c, speed - c)`.
    HeadingHold,

    /// Drive at `speed` while turning at the manual turn rate, heading
    /// control bypassed: `(speed + t, speed - t)`.
    ManualRotation,

    /// No translation, the heading controller holds the target heading:
    /// `(c, -c)`.
    HoldInPlace,

    /// No translation, turn at the manual turn rate: `(t, -t)`.
    RotateInPlace,

    /// Side speeds were demanded directly by a command.
    Direct,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActuationPath {
    /// Select the path for the given flags.
    ///
    /// `anti_drift` never changes the path, a two-sided drive base has no
    /// strafe wheel to act on it.
    ///
    /// `position_lock` takes precedence over the forward speed: under it both
    /// `HoldInPlace` and `RotateInPlace` drop `speed` and the robot only
    /// turns, even with `rotation_lock` also set.
    pub fn select(position_lock: bool, rotation_lock: bool, anti_drift: bool) -> Self {
        match (position_lock, rotation_lock, anti_drift) {
            (false, false, false) => ActuationPath::HeadingHold,
            (false, false, true) => ActuationPath::HeadingHold,
            (false, true, false) => ActuationPath::ManualRotation,
            (false, true, true) => ActuationPath::ManualRotation,
            (true, false, false) => ActuationPath::HoldInPlace,
            (true, false, true) => ActuationPath::HoldInPlace,
            (true, true, false) => ActuationPath::RotateInPlace,
            (true, true, true) => ActuationPath::RotateInPlace,
        }
    }

    /// Build the unclamped (left, right) demands for this path.
    ///
    /// Returns `None` for `Direct`, whose demands come from the command.
    pub fn demands(self, speed: f64, correction: f64, turn_rate: f64) -> Option<(f64, f64)> {
        match self {
            ActuationPath::HeadingHold => Some((speed + correction, speed - correction)),
            ActuationPath::ManualRotation => Some((speed + turn_rate, speed - turn_rate)),
            ActuationPath::HoldInPlace => Some((correction, -correction)),
            ActuationPath::RotateInPlace => Some((turn_rate, -turn_rate)),
            ActuationPath::Direct => None,
        }
    }
}
