//! # Data Store
//!
//! Global state of the drive executable: the drivetrain, the command
//! scheduler, the operator inputs and the safe mode status.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use crate::{
    cmd::Command,
    drivetrain::{ActuationPath, Drivetrain, DrivetrainError, OutputData, StatusReport},
    input::{Axis, Bindings},
    scheduler::CmdScheduler,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum SafeModeCause {
    /// The operator disabled the robot, or it has not been enabled yet
    DisableRequested,

    /// Too many consecutive cycles overran their period
    CycleOverrunLimit,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Time since the start of the session
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Drivetrain
    pub drivetrain: Drivetrain,
    pub drivetrain_output: Option<OutputData>,
    pub drivetrain_status_rpt: StatusReport,

    // Commands
    pub scheduler: CmdScheduler,

    // Operator input
    pub turn_axis: Axis,
    pub move_axis: Axis,
    pub bindings: Bindings,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    arch: Archiver,
}

/// One row of the drivetrain archive.
#[derive(Serialize)]
struct ArchRecord {
    time_s: f64,
    num_cycles: u64,
    safe: bool,
    path: Option<ActuationPath>,
    left: f64,
    right: f64,
    actual_heading_deg: f64,
    target_heading_deg: f64,
    head_error_deg: f64,
    correction: f64,
    at_target_heading: bool,
    heading_fault: bool,
    left_limited: bool,
    right_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Create a new data store around an initialised drivetrain.
    ///
    /// The robot starts disabled, an enable request is needed before any
    /// command runs.
    pub fn new(mut drivetrain: Drivetrain, deadzone: f64) -> Self {
        let mut scheduler = CmdScheduler::new();
        scheduler.disable(&mut drivetrain);

        Self {
            num_cycles: 0,
            sim_time_s: 0.0,
            safe: true,
            safe_cause: Some(SafeModeCause::DisableRequested),
            drivetrain,
            drivetrain_output: None,
            drivetrain_status_rpt: StatusReport::default(),
            scheduler,
            turn_axis: Axis::new(deadzone),
            move_axis: Axis::new(deadzone),
            bindings: Bindings::new(),
            num_consec_cycle_overruns: 0,
            arch: Archiver::default(),
        }
    }

    /// Start archiving each cycle into the session.
    pub fn open_archives(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.arch = Archiver::from_path(session, "drivetrain.csv")?;
        Ok(())
    }

    /// Puts the robot into safe mode with the given cause.
    ///
    /// All commands are ended and the drivetrain is stopped.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.scheduler.disable(&mut self.drivetrain);
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// To remove safe mode the provided cause must match the initial reason
    /// for safe mode being enabled, otherwise the root cause is returned as
    /// the error.
    ///
    /// If safe mode was not enabled `Ok(())` is returned.
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), SafeModeCause> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(root_cause),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                self.num_consec_cycle_overruns = 0;
                self.scheduler.enable();
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
        }
    }

    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self, sim_time_s: f64) {
        self.sim_time_s = sim_time_s;
        self.drivetrain_output = None;
    }

    /// Schedule a command on the drivetrain.
    pub fn schedule(&mut self, cmd: Box<dyn Command>) -> bool {
        self.scheduler.schedule(cmd, &mut self.drivetrain)
    }

    /// Run the commands and the drivetrain for this cycle.
    ///
    /// Commands bound to buttons pressed since the last cycle are scheduled
    /// first, then every active command runs, then the drivetrain turns the
    /// resulting demands into actuator outputs. The drivetrain is not
    /// processed in safe mode.
    pub fn proc(&mut self) -> Result<(), DrivetrainError> {
        for cmd in self.bindings.take_triggered() {
            if !self.safe {
                self.scheduler.schedule(cmd, &mut self.drivetrain);
            }
        }

        if self.safe {
            return Ok(());
        }

        self.scheduler.run(&mut self.drivetrain);

        let (output, report) = self.drivetrain.proc(&())?;
        self.drivetrain_output = Some(output);
        self.drivetrain_status_rpt = report;

        Ok(())
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (path, left, right) = match self.drivetrain_output {
            Some(o) => (Some(o.path), o.left, o.right),
            None => (None, 0.0, 0.0),
        };
        let r = &self.drivetrain_status_rpt;

        let record = ArchRecord {
            time_s: self.sim_time_s,
            num_cycles: self.num_cycles as u64,
            safe: self.safe,
            path,
            left,
            right,
            actual_heading_deg: r.actual_heading_deg,
            target_heading_deg: r.target_heading_deg,
            head_error_deg: r.head_error_deg,
            correction: r.correction,
            at_target_heading: r.at_target_heading,
            heading_fault: r.heading_fault,
            left_limited: r.left_limited,
            right_limited: r.right_limited,
        };

        self.arch.serialise(record)
    }
}
