//! Rotate in place from operator input

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{Command, Supplier, DRIVETRAIN};
use crate::drivetrain::Drivetrain;
use crate::scheduler::Resource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rotates the robot in place.
///
/// While the turn input is held the robot turns at the demanded rate under
/// rotation lock. When the input is released the heading controller holds
/// whatever heading the robot had reached. Never finishes.
pub struct RotateCmd {
    turn: Supplier,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotateCmd {
    pub fn new(turn: Supplier) -> Self {
        Self { turn }
    }
}

impl Command for RotateCmd {
    fn name(&self) -> &str {
        "Rotate"
    }

    fn requirements(&self) -> &[Resource] {
        DRIVETRAIN
    }

    fn initialise(&mut self, dt: &mut Drivetrain) {
        dt.set_position_lock(true);
    }

    fn execute(&mut self, dt: &mut Drivetrain) {
        let turn = (self.turn)();

        if turn != 0.0 {
            dt.set_rotation_lock(true);
            dt.set_turn_rate(turn);

            // Track the target so that releasing the input holds here
            let heading = dt.actual_heading_deg();
            dt.set_target_heading_deg(heading);
        } else {
            dt.set_rotation_lock(false);
            dt.set_turn_rate(0.0);
        }
    }

    fn end(&mut self, dt: &mut Drivetrain, _interrupted: bool) {
        dt.set_rotation_lock(false);
        dt.set_position_lock(false);
        dt.set_turn_rate(0.0);
    }
}
