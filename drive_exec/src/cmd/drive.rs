//! # Manual drive command
//!
//! Arcade style driving from a move and a turn input. While the turn input is
//! released the command holds the heading the robot had when the input was
//! last released, using its own heading controller whose output is a turn
//! rate in degrees/second.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::{Command, Supplier, DRIVETRAIN};
use crate::angular_pid::AngularPid;
use crate::drivetrain::{Drivetrain, DrivetrainError, Params};
use crate::kinematics::{ChassisSpeeds, DiffDriveKinematics};
use crate::scheduler::Resource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the robot from operator input with heading hold. Never finishes.
pub struct DriveCmd {
    move_rate: Supplier,
    turn_rate: Supplier,

    kinematics: DiffDriveKinematics,

    /// Units: meters/second
    max_velocity_ms: f64,

    /// Units: radians/second
    max_angular_velocity_rads: f64,

    /// Heading hold controller, output in degrees/second
    head_ctrl: AngularPid,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCmd {
    /// Create a new drive command.
    ///
    /// The limits and the heading hold gains are taken from the drivetrain
    /// parameters.
    pub fn new(
        move_rate: Supplier,
        turn_rate: Supplier,
        params: &Params,
    ) -> Result<Self, DrivetrainError> {
        Ok(Self {
            move_rate,
            turn_rate,
            kinematics: DiffDriveKinematics::new(params.track_width_m)?,
            max_velocity_ms: params.max_velocity_ms,
            max_angular_velocity_rads: params.max_angular_velocity_rads,
            head_ctrl: AngularPid::new(params.drive_head_ctrl, params.cycle_period_s)?,
        })
    }

    /// Heading the command is currently holding.
    ///
    /// Units: degrees
    pub fn held_heading_deg(&self) -> f64 {
        self.head_ctrl.setpoint()
    }
}

impl Command for DriveCmd {
    fn name(&self) -> &str {
        "Drive"
    }

    fn requirements(&self) -> &[Resource] {
        DRIVETRAIN
    }

    fn initialise(&mut self, dt: &mut Drivetrain) {
        self.head_ctrl.reset();
        self.head_ctrl.set_setpoint(dt.actual_heading_deg());

        debug!("Drive holding heading {:.2} deg", self.head_ctrl.setpoint());
    }

    fn execute(&mut self, dt: &mut Drivetrain) {
        let move_rate = (self.move_rate)();
        let turn_rate = (self.turn_rate)();
        let measured_deg = dt.actual_heading_deg();

        // A deliberate turn moves the held heading along with the robot. The
        // correction is also dropped while the heading source is faulty, as
        // the measurement is stale.
        let correction_degs = if turn_rate != 0.0 || dt.report().heading_fault {
            self.head_ctrl.set_setpoint(measured_deg);
            self.head_ctrl.reset();
            0.0
        } else {
            self.head_ctrl.calculate(measured_deg)
        };

        let chassis = ChassisSpeeds {
            vx_ms: move_rate * self.max_velocity_ms,
            omega_rads: turn_rate * self.max_angular_velocity_rads
                + correction_degs.to_radians(),
        };

        let wheels = self
            .kinematics
            .to_wheel_speeds(chassis)
            .desaturate(self.max_velocity_ms);

        dt.set_wheel_speeds(wheels);

        // Keep the drivetrain's own target on the current heading so nothing
        // jumps when another command takes over.
        dt.set_target_heading_deg(measured_deg);
        dt.set_rotation_lock(false);
        dt.set_position_lock(false);
    }

    fn end(&mut self, dt: &mut Drivetrain, _interrupted: bool) {
        dt.set_speed(0.0);
        dt.set_turn_rate(0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drivetrain::{test_rig, ActuationPath};
    use std::cell::Cell;
    use std::rc::Rc;
    use util::module::State;

    fn shared(v: f64) -> (Rc<Cell<f64>>, Supplier) {
        let cell = Rc::new(Cell::new(v));
        let c = cell.clone();
        (cell, Box::new(move || c.get()))
    }

    #[test]
    fn test_straight_drive() {
        let params = test_rig::test_params();
        let (mut dt, plant) = test_rig::build(params.clone());
        dt.proc(&()).unwrap();

        let (_, mv) = shared(0.5);
        let (_, turn) = shared(0.0);
        let mut cmd = DriveCmd::new(mv, turn, &params).unwrap();

        cmd.initialise(&mut dt);
        cmd.execute(&mut dt);
        let (output, _) = dt.proc(&()).unwrap();

        assert_eq!(output.path, ActuationPath::Direct);
        assert_eq!((output.left, output.right), (0.5, 0.5));
        assert_eq!(plant.last_demand(), (0.5, 0.5));
    }

    #[test]
    fn test_turn_desaturated() {
        let params = test_rig::test_params();
        let (mut dt, _plant) = test_rig::build(params.clone());
        dt.proc(&()).unwrap();

        let (_, mv) = shared(1.0);
        let (_, turn) = shared(1.0);
        let mut cmd = DriveCmd::new(mv, turn, &params).unwrap();

        cmd.initialise(&mut dt);
        cmd.execute(&mut dt);
        let (output, _) = dt.proc(&()).unwrap();

        // 2 m/s forward, 3 rad/s on a 0.5 m track gives (2.75, 1.25), scaled
        // back so the left side is at the 2 m/s limit.
        assert!((output.left - 1.0).abs() < 1e-12);
        assert!((output.right - 1.25 / 2.75).abs() < 1e-12);
    }

    #[test]
    fn test_heading_hold() {
        let params = test_rig::test_params();
        let (mut dt, plant) = test_rig::build(params.clone());
        dt.proc(&()).unwrap();

        let (_, mv) = shared(0.2);
        let (turn_in, turn) = shared(0.0);
        let mut cmd = DriveCmd::new(mv, turn, &params).unwrap();
        cmd.initialise(&mut dt);
        assert_eq!(cmd.held_heading_deg(), 0.0);

        // Knocked clockwise, the command steers back anticlockwise
        plant.set_yaw_deg(10.0);
        dt.proc(&()).unwrap();
        cmd.execute(&mut dt);
        let (output, _) = dt.proc(&()).unwrap();
        assert!(output.left < output.right);
        assert_eq!(cmd.held_heading_deg(), 0.0);
        assert_eq!(dt.target_heading_deg(), 10.0);

        // Turning deliberately moves the held heading
        turn_in.set(0.5);
        cmd.execute(&mut dt);
        dt.proc(&()).unwrap();
        assert_eq!(cmd.held_heading_deg(), 10.0);
        assert!(!dt.is_rotation_lock());
        assert!(!dt.is_position_lock());
    }
}
