//! # Drive library
//!
//! Heading hold control of a differential drive robot. This library allows
//! the executable, the integration tests and the benchmarks to access the
//! items defined inside the drive crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// PID controller over a wrapping input domain
pub mod angular_pid;

/// Commands run by the scheduler
pub mod cmd;

/// Global data store for the executable
pub mod data_store;

/// Drivetrain control module - holds heading and drives the actuator
pub mod drivetrain;

/// Equipment interfaces - the gyro and the drive base, plus simulations
pub mod eqpt;

/// Operator input shaping and button bindings
pub mod input;

/// Applies operator input events to the data store
pub mod input_processor;

/// Differential drive kinematics
pub mod kinematics;

/// Executable parameters
pub mod params;

/// Command scheduler and resource ownership
pub mod scheduler;
