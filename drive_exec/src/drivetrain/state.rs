//! Implementations for the Drivetrain state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{ActuationPath, DrivetrainError, Params};
use crate::angular_pid::AngularPid;
use crate::eqpt::{DriveActuator, HeadingSource, NeutralMode};
use crate::kinematics::WheelSpeeds;
use crate::scheduler::{Resource, Subsystem};
use util::{
    maths::{clamp, lin_map, wrap_deg},
    module::State,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drivetrain module state
///
/// There is one drivetrain per robot. It is created once at start up and
/// passed by reference to the commands that drive it.
pub struct Drivetrain {
    heading_source: Box<dyn HeadingSource>,
    actuator: Box<dyn DriveActuator>,

    params: Option<Params>,

    /// Heading controller, `None` until initialised
    head_ctrl: Option<AngularPid>,

    // ---- DEMANDS ----

    /// Forward demand, normalised
    speed: f64,

    /// Manual rotation demand, normalised, used under rotation lock
    turn_rate: f64,

    /// Units: degrees, within (-180, 180]
    target_heading_deg: f64,

    /// Side speeds demanded directly by a command for the next cycle
    wheel_demand: Option<WheelSpeeds>,

    position_lock: bool,
    rotation_lock: bool,
    anti_drift: bool,

    // ---- FEEDBACK ----

    /// Last heading read from the heading source.
    ///
    /// Units: degrees, within (-180, 180]
    actual_heading_deg: f64,

    /// True while the heading source is faulty
    heading_fault: bool,

    pub(crate) report: StatusReport,
    pub(crate) output: Option<OutputData>,
}

/// Output demands sent to the actuator on a cycle.
#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Normalised left side demand
    pub left: f64,

    /// Normalised right side demand
    pub right: f64,

    /// The path used to build the demands
    pub path: ActuationPath,
}

/// Status report for Drivetrain processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Units: degrees
    pub actual_heading_deg: f64,

    /// Units: degrees
    pub target_heading_deg: f64,

    /// Shortest signed distance from the actual to the target heading
    ///
    /// Units: degrees
    pub head_error_deg: f64,

    /// Heading controller output
    pub correction: f64,

    /// True if the heading controller is within tolerance of the target
    pub at_target_heading: bool,

    /// The heading source could not be read this cycle, correction was zero
    pub heading_fault: bool,

    /// The left demand was clamped to the output range
    pub left_limited: bool,

    /// The right demand was clamped to the output range
    pub right_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Drivetrain {
    type InitData = Params;
    type InitError = DrivetrainError;

    type InputData = ();
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = DrivetrainError;

    /// Initialise the drivetrain.
    ///
    /// Validates the parameters, then brings the hardware to a known state:
    /// motors stopped, sensors and encoders zeroed.
    fn init(&mut self, params: Self::InitData) -> Result<(), Self::InitError> {
        params.validate()?;

        self.head_ctrl = Some(AngularPid::new(params.head_ctrl, params.cycle_period_s)?);

        self.actuator.set_neutral_mode(params.neutral_mode);
        self.params = Some(params);

        self.stop();
        self.zero_sensors();

        info!("Drivetrain initialised");

        Ok(())
    }

    /// Perform cyclic processing of the drivetrain.
    fn proc(&mut self, _input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (head_ctrl, params) = match (self.head_ctrl.as_mut(), self.params.as_ref()) {
            (Some(h), Some(p)) => (h, p),
            _ => return Err(DrivetrainError::NotInitialised),
        };

        // Clear the status report
        self.report = StatusReport::default();

        // Sample the heading. A faulty reading leaves the previous heading in
        // place and disables the correction for this cycle, manual demands
        // still reach the actuator.
        let heading_ok = match self.heading_source.read_yaw_deg() {
            Ok(yaw) if yaw.is_finite() => {
                self.actual_heading_deg = wrap_deg(yaw);
                true
            }
            Ok(yaw) => {
                if !self.heading_fault {
                    warn!("Heading source returned {}, heading control suspended", yaw);
                }
                false
            }
            Err(e) => {
                if !self.heading_fault {
                    warn!("Could not read heading source ({}), heading control suspended", e);
                }
                false
            }
        };

        if heading_ok && self.heading_fault {
            info!("Heading source recovered, heading control resumed");
        }
        self.heading_fault = !heading_ok;

        // Run the heading controller
        head_ctrl.set_setpoint(self.target_heading_deg);
        let correction = if heading_ok {
            head_ctrl.calculate(self.actual_heading_deg)
        } else {
            head_ctrl.reset();
            0.0
        };

        // Build the demands, direct side speeds from a command take priority
        // over the flag driven paths.
        let (left, right, path) = match self.wheel_demand.take() {
            Some(ws) => {
                let range = (-params.max_velocity_ms, params.max_velocity_ms);
                (
                    lin_map(range, (-1.0, 1.0), ws.left_ms),
                    lin_map(range, (-1.0, 1.0), ws.right_ms),
                    ActuationPath::Direct,
                )
            }
            None => {
                let path = ActuationPath::select(
                    self.position_lock,
                    self.rotation_lock,
                    self.anti_drift,
                );
                let (l, r) = path
                    .demands(self.speed, correction, self.turn_rate)
                    .unwrap_or((0.0, 0.0));
                (l, r, path)
            }
        };

        // Limit to the actuator's range, a non-finite demand is zeroed
        let output = OutputData {
            left: limit_output(left, params),
            right: limit_output(right, params),
            path,
        };

        self.report = StatusReport {
            actual_heading_deg: self.actual_heading_deg,
            target_heading_deg: self.target_heading_deg,
            head_error_deg: head_ctrl.error(),
            correction,
            at_target_heading: head_ctrl.at_setpoint(),
            heading_fault: !heading_ok,
            left_limited: output.left != left,
            right_limited: output.right != right,
        };

        self.actuator.set_wheel_velocities(output.left, output.right);

        trace!(
            "Drivetrain output: {:?} ({:.3}, {:.3}), heading {:.2} -> {:.2}",
            output.path,
            output.left,
            output.right,
            self.actual_heading_deg,
            self.target_heading_deg
        );

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Subsystem for Drivetrain {
    fn resource(&self) -> Resource {
        Resource::Drivetrain
    }

    fn make_safe(&mut self) {
        self.stop();
        self.rotation_lock = false;
        self.position_lock = false;
    }
}

impl Drivetrain {
    /// Create a new drivetrain from its equipment.
    ///
    /// The drivetrain must be initialised with `init` before processing.
    pub fn new(
        heading_source: Box<dyn HeadingSource>,
        actuator: Box<dyn DriveActuator>,
    ) -> Self {
        Self {
            heading_source,
            actuator,
            params: None,
            head_ctrl: None,
            speed: 0.0,
            turn_rate: 0.0,
            target_heading_deg: 0.0,
            wheel_demand: None,
            position_lock: false,
            rotation_lock: false,
            anti_drift: false,
            actual_heading_deg: 0.0,
            heading_fault: false,
            report: StatusReport::default(),
            output: None,
        }
    }

    /// Stop the drivetrain.
    ///
    /// Both sides are commanded to zero immediately and the speed and turn
    /// demands are cleared so that the next cycle does not restart motion.
    pub fn stop(&mut self) {
        self.speed = 0.0;
        self.turn_rate = 0.0;
        self.wheel_demand = None;
        self.actuator.stop();
    }

    /// Zero all drivetrain sensors, the gyro and the wheel encoders.
    pub fn zero_sensors(&mut self) {
        self.heading_source.zero();
        self.actuator.zero_distance();
        self.actual_heading_deg = 0.0;

        if let Some(ref mut h) = self.head_ctrl {
            h.reset();
        }

        debug!("Drivetrain sensors zeroed");
    }

    /// Zero the wheel encoder distance.
    pub fn zero_distance(&mut self) {
        self.actuator.zero_distance();
    }

    /// Set the motor behaviour when no drive is demanded.
    pub fn set_neutral_mode(&mut self, mode: NeutralMode) {
        self.actuator.set_neutral_mode(mode);
    }

    /// Get position lock status.
    ///
    /// The position lock holds the robot in place, suppressing the forward
    /// speed. Rotation is still allowed.
    pub fn is_position_lock(&self) -> bool {
        self.position_lock
    }

    pub fn set_position_lock(&mut self, position_lock: bool) {
        self.position_lock = position_lock;
    }

    /// Get rotation lock status.
    ///
    /// Under rotation lock the heading controller is bypassed and the robot
    /// turns at the manual turn rate.
    pub fn is_rotation_lock(&self) -> bool {
        self.rotation_lock
    }

    pub fn set_rotation_lock(&mut self, rotation_lock: bool) {
        self.rotation_lock = rotation_lock;
    }

    pub fn is_anti_drift(&self) -> bool {
        self.anti_drift
    }

    pub fn set_anti_drift(&mut self, anti_drift: bool) {
        self.anti_drift = anti_drift;
    }

    /// Units: degrees, within (-180, 180]
    pub fn target_heading_deg(&self) -> f64 {
        self.target_heading_deg
    }

    /// Set the target heading, which is wrapped into (-180, 180].
    ///
    /// Changing the target resets the heading controller so that it never
    /// reports being at a target it has not yet been run against.
    pub fn set_target_heading_deg(&mut self, target_heading_deg: f64) {
        if !target_heading_deg.is_finite() {
            warn!("Ignoring non-finite target heading {}", target_heading_deg);
            return;
        }

        let target = wrap_deg(target_heading_deg);

        if target != self.target_heading_deg {
            if let Some(ref mut h) = self.head_ctrl {
                h.reset();
            }
        }

        self.target_heading_deg = target;
    }

    /// Heading read on the last cycle.
    ///
    /// Units: degrees, within (-180, 180]
    pub fn actual_heading_deg(&self) -> f64 {
        self.actual_heading_deg
    }

    /// Returns true if the heading controller is within tolerance of the
    /// target heading.
    pub fn at_target_heading(&self) -> bool {
        match self.head_ctrl {
            Some(ref h) => h.at_setpoint(),
            None => false,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the normalised forward speed. Non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            warn!("Ignoring non-finite speed {}", speed);
            return;
        }
        self.speed = speed;
    }

    pub fn turn_rate(&self) -> f64 {
        self.turn_rate
    }

    /// Set the normalised manual turn rate, used under rotation lock.
    /// Non-finite values are ignored.
    pub fn set_turn_rate(&mut self, turn_rate: f64) {
        if !turn_rate.is_finite() {
            warn!("Ignoring non-finite turn rate {}", turn_rate);
            return;
        }
        self.turn_rate = turn_rate;
    }

    /// Demand side speeds directly for the next cycle.
    ///
    /// The demand is used once and takes priority over the flags.
    pub fn set_wheel_speeds(&mut self, wheel_speeds: WheelSpeeds) {
        self.wheel_demand = Some(wheel_speeds);
    }

    /// Parameters the drivetrain was initialised with.
    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// Output of the last cycle.
    pub fn output(&self) -> Option<OutputData> {
        self.output
    }

    /// Status report of the last cycle.
    pub fn report(&self) -> StatusReport {
        self.report
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a side demand to the output range, mapping non-finite demands to 0.
fn limit_output(demand: f64, params: &Params) -> f64 {
    if demand.is_finite() {
        clamp(&demand, &params.min_output, &params.max_output)
    } else {
        0.0
    }
}
