//! One-shot command around a closure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Command;
use crate::drivetrain::Drivetrain;
use crate::scheduler::Resource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs an action once when scheduled and finishes straight away.
pub struct InstantCmd {
    name: String,
    requirements: Vec<Resource>,
    action: Box<dyn FnMut(&mut Drivetrain)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InstantCmd {
    pub fn new<F>(name: &str, requirements: Vec<Resource>, action: F) -> Self
    where
        F: FnMut(&mut Drivetrain) + 'static,
    {
        Self {
            name: name.to_string(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for InstantCmd {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[Resource] {
        &self.requirements
    }

    fn initialise(&mut self, dt: &mut Drivetrain) {
        (self.action)(dt);
    }

    fn execute(&mut self, _dt: &mut Drivetrain) {}

    fn is_finished(&self) -> bool {
        true
    }
}
