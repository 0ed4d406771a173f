//! # Commands
//!
//! Commands are the units of behaviour run by the [`CmdScheduler`]. Each
//! command declares the resources it needs, and is handed the drivetrain on
//! every call so that only the command currently owning the drivetrain can
//! change its demands.
//!
//! [`CmdScheduler`]: crate::scheduler::CmdScheduler

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod drive;
mod heading;
mod instant;
mod rotate;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use drive::DriveCmd;
pub use heading::{RotateToHeadingCmd, ZeroSensorsCmd};
pub use instant::InstantCmd;
pub use rotate::RotateCmd;

use crate::drivetrain::Drivetrain;
use crate::scheduler::Resource;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// A source of a normalised operator demand, sampled once per cycle.
pub type Supplier = Box<dyn FnMut() -> f64>;

/// Resource list for commands driving the drivetrain.
pub(crate) const DRIVETRAIN: &[Resource] = &[Resource::Drivetrain];

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A schedulable unit of behaviour.
pub trait Command {
    /// Name of the command, used in logs.
    fn name(&self) -> &str;

    /// Resources this command needs exclusive use of while active.
    fn requirements(&self) -> &[Resource];

    /// Called once when the command is scheduled.
    fn initialise(&mut self, _dt: &mut Drivetrain) {}

    /// Called once per cycle while the command is active.
    fn execute(&mut self, dt: &mut Drivetrain);

    /// Returns true once the command has nothing left to do.
    fn is_finished(&self) -> bool {
        false
    }

    /// Called once when the command stops, either because it finished or
    /// because it was `interrupted` by another command or by disabling.
    fn end(&mut self, _dt: &mut Drivetrain, _interrupted: bool) {}
}
