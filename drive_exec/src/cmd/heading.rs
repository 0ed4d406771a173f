//! Commands acting on the heading reference

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use super::{Command, DRIVETRAIN};
use crate::drivetrain::Drivetrain;
use crate::scheduler::Resource;
use util::maths::wrap_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Zeroes the gyro and encoders, then targets the new zero heading.
#[derive(Debug, Default)]
pub struct ZeroSensorsCmd;

/// Turns the robot in place to a heading and finishes once it is there.
#[derive(Debug)]
pub struct RotateToHeadingCmd {
    /// Units: degrees
    heading_deg: f64,

    finished: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ZeroSensorsCmd {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ZeroSensorsCmd {
    fn name(&self) -> &str {
        "ZeroSensors"
    }

    fn requirements(&self) -> &[Resource] {
        DRIVETRAIN
    }

    fn initialise(&mut self, dt: &mut Drivetrain) {
        dt.zero_sensors();

        // Otherwise the robot swings round to the old target
        dt.set_target_heading_deg(0.0);

        info!("Drivetrain sensors zeroed");
    }

    fn execute(&mut self, _dt: &mut Drivetrain) {}

    fn is_finished(&self) -> bool {
        true
    }
}

impl RotateToHeadingCmd {
    /// Create a command turning to `heading_deg`, which is wrapped into
    /// (-180, 180].
    pub fn new(heading_deg: f64) -> Self {
        Self {
            heading_deg: wrap_deg(heading_deg),
            finished: false,
        }
    }

    /// Units: degrees
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }
}

impl Command for RotateToHeadingCmd {
    fn name(&self) -> &str {
        "RotateToHeading"
    }

    fn requirements(&self) -> &[Resource] {
        DRIVETRAIN
    }

    fn initialise(&mut self, dt: &mut Drivetrain) {
        self.finished = false;

        dt.set_target_heading_deg(self.heading_deg);
        dt.set_rotation_lock(false);
        dt.set_position_lock(true);
        dt.set_speed(0.0);
    }

    fn execute(&mut self, dt: &mut Drivetrain) {
        self.finished = dt.at_target_heading();
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn end(&mut self, dt: &mut Drivetrain, _interrupted: bool) {
        dt.set_position_lock(false);
    }
}
