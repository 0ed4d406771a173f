//! # Simulated equipment
//!
//! A very simple plant model of the robot: the normalised side demands are
//! treated as ideal velocities, and the heading is integrated from the
//! resulting rate of turn. The gyro and drive base handles share the plant
//! so that commands sent to one show up in the readings of the other.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;

// Internal
use super::{DriveActuator, EqptError, HeadingSource, NeutralMode};
use crate::kinematics::{DiffDriveKinematics, KinematicsError, WheelSpeeds};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated plant.
#[derive(Debug, Clone, Deserialize)]
pub struct SimPlantParams {
    /// Side velocity produced by a demand of 1.0.
    ///
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Units: meters
    pub track_width_m: f64,

    /// Heading of the robot when the simulation starts.
    ///
    /// Units: degrees
    #[serde(default)]
    pub initial_yaw_deg: f64,
}

/// Handle to the simulated plant.
///
/// Cloning the handle gives another view of the same plant.
#[derive(Clone)]
pub struct SimPlant {
    state: Rc<RefCell<PlantState>>,
    kinematics: DiffDriveKinematics,
    max_velocity_ms: f64,
}

/// Simulated gyroscope reading from a [`SimPlant`].
pub struct SimGyro {
    state: Rc<RefCell<PlantState>>,
}

/// Simulated drive base driving a [`SimPlant`].
pub struct SimDriveBase {
    state: Rc<RefCell<PlantState>>,
}

#[derive(Debug, Default)]
struct PlantState {
    /// True accumulated heading of the robot, never wrapped.
    yaw_deg: f64,

    /// Gyro reading offset applied by zeroing.
    yaw_offset_deg: f64,

    left_demand: f64,
    right_demand: f64,

    left_distance_m: f64,
    right_distance_m: f64,

    neutral_mode: NeutralMode,

    /// Fault returned by the gyro instead of a reading, if any.
    gyro_fault: Option<EqptError>,

    /// Number of demands received by the drive base.
    num_demands: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimPlant {
    /// Create a new plant at rest.
    pub fn new(params: &SimPlantParams) -> Result<Self, KinematicsError> {
        let kinematics = DiffDriveKinematics::new(params.track_width_m)?;

        let state = PlantState {
            yaw_deg: params.initial_yaw_deg,
            ..Default::default()
        };

        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            kinematics,
            max_velocity_ms: params.max_velocity_ms,
        })
    }

    /// Get a gyro reading from this plant.
    pub fn gyro(&self) -> SimGyro {
        SimGyro {
            state: self.state.clone(),
        }
    }

    /// Get a drive base acting on this plant.
    pub fn drive_base(&self) -> SimDriveBase {
        SimDriveBase {
            state: self.state.clone(),
        }
    }

    /// Advance the plant by `dt_s` seconds using the last demands.
    pub fn step(&self, dt_s: f64) {
        let mut s = self.state.borrow_mut();

        let wheels = WheelSpeeds {
            left_ms: s.left_demand * self.max_velocity_ms,
            right_ms: s.right_demand * self.max_velocity_ms,
        };
        let chassis = self.kinematics.to_chassis_speeds(wheels);

        s.yaw_deg += chassis.omega_rads.to_degrees() * dt_s;
        s.left_distance_m += wheels.left_ms * dt_s;
        s.right_distance_m += wheels.right_ms * dt_s;

        trace!(
            "SimPlant yaw {:.3} deg, demands ({:.3}, {:.3})",
            s.yaw_deg,
            s.left_demand,
            s.right_demand
        );
    }

    /// True heading of the robot, ignoring any gyro zeroing.
    pub fn yaw_deg(&self) -> f64 {
        self.state.borrow().yaw_deg
    }

    /// Move the robot to a new true heading, as if pushed by hand.
    pub fn set_yaw_deg(&self, yaw_deg: f64) {
        self.state.borrow_mut().yaw_deg = yaw_deg;
    }

    /// The last (left, right) demand received by the drive base.
    pub fn last_demand(&self) -> (f64, f64) {
        let s = self.state.borrow();
        (s.left_demand, s.right_demand)
    }

    /// Number of demands received by the drive base.
    pub fn num_demands(&self) -> u64 {
        self.state.borrow().num_demands
    }

    /// Integrated (left, right) distance since the last zeroing.
    pub fn distance_m(&self) -> (f64, f64) {
        let s = self.state.borrow();
        (s.left_distance_m, s.right_distance_m)
    }

    pub fn neutral_mode(&self) -> NeutralMode {
        self.state.borrow().neutral_mode
    }

    /// Make the gyro return the given fault instead of readings, or clear the
    /// fault with `None`.
    pub fn set_gyro_fault(&self, fault: Option<EqptError>) {
        self.state.borrow_mut().gyro_fault = fault;
    }
}

impl HeadingSource for SimGyro {
    fn read_yaw_deg(&mut self) -> Result<f64, EqptError> {
        let s = self.state.borrow();

        match s.gyro_fault {
            Some(ref e) => Err(e.clone()),
            None => Ok(s.yaw_deg - s.yaw_offset_deg),
        }
    }

    fn zero(&mut self) {
        let mut s = self.state.borrow_mut();
        s.yaw_offset_deg = s.yaw_deg;
    }
}

impl DriveActuator for SimDriveBase {
    fn set_wheel_velocities(&mut self, left: f64, right: f64) {
        let mut s = self.state.borrow_mut();
        s.left_demand = left;
        s.right_demand = right;
        s.num_demands += 1;
    }

    fn zero_distance(&mut self) {
        let mut s = self.state.borrow_mut();
        s.left_distance_m = 0.0;
        s.right_distance_m = 0.0;
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) {
        self.state.borrow_mut().neutral_mode = mode;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::maths::wrap_deg;

    fn plant() -> SimPlant {
        SimPlant::new(&SimPlantParams {
            max_velocity_ms: 2.0,
            track_width_m: 0.5,
            initial_yaw_deg: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_plant_turns_clockwise() {
        let plant = plant();
        let mut drive = plant.drive_base();
        let mut gyro = plant.gyro();

        // Left forwards, right backwards, 1 m/s each side on a 0.5 m track
        // gives 4 rad/s clockwise.
        drive.set_wheel_velocities(0.5, -0.5);
        plant.step(0.1);

        let yaw = gyro.read_yaw_deg().unwrap();
        assert!((yaw - 0.4f64.to_degrees()).abs() < 1e-9);
        assert_eq!(plant.last_demand(), (0.5, -0.5));
        assert_eq!(plant.num_demands(), 1);
    }

    #[test]
    fn test_zero_gyro() {
        let plant = plant();
        let mut gyro = plant.gyro();

        // Several turns, well beyond ±360
        plant.set_yaw_deg(-1000.0);
        assert_eq!(gyro.read_yaw_deg().unwrap(), -1000.0);

        gyro.zero();
        assert!(wrap_deg(gyro.read_yaw_deg().unwrap()).abs() < 1e-9);

        // Idempotent
        gyro.zero();
        assert!(wrap_deg(gyro.read_yaw_deg().unwrap()).abs() < 1e-9);

        // True heading is unchanged
        assert_eq!(plant.yaw_deg(), -1000.0);
    }

    #[test]
    fn test_drive_base() {
        let plant = plant();
        let mut drive = plant.drive_base();

        drive.set_wheel_velocities(1.0, 1.0);
        plant.step(0.5);
        assert_eq!(plant.distance_m(), (1.0, 1.0));

        drive.zero_distance();
        assert_eq!(plant.distance_m(), (0.0, 0.0));

        drive.stop();
        assert_eq!(plant.last_demand(), (0.0, 0.0));

        drive.set_neutral_mode(NeutralMode::Coast);
        assert_eq!(plant.neutral_mode(), NeutralMode::Coast);
    }

    #[test]
    fn test_gyro_fault() {
        let plant = plant();
        let mut gyro = plant.gyro();

        plant.set_gyro_fault(Some(EqptError::Timeout(30)));
        assert_eq!(gyro.read_yaw_deg(), Err(EqptError::Timeout(30)));

        plant.set_gyro_fault(None);
        assert!(gyro.read_yaw_deg().is_ok());
    }
}
