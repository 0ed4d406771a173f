//! # Command scheduler
//!
//! Runs the active [`Command`]s once per cycle and enforces exclusive use of
//! the robot's resources: scheduling a command interrupts any active command
//! needing one of the same resources. Each resource may have a default
//! command, which is scheduled whenever nothing else holds the resource.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal
use crate::cmd::Command;
use crate::drivetrain::Drivetrain;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Resources which commands may claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Drivetrain,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Default command {0} for {1:?} does not require exactly that resource")]
    InvalidDefault(String, Resource),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A resource-owning part of the robot.
pub trait Subsystem {
    /// The resource commands claim to drive this subsystem.
    fn resource(&self) -> Resource;

    /// Bring the subsystem to rest.
    fn make_safe(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Schedules commands and ticks them once per cycle.
pub struct CmdScheduler {
    active: Vec<Active>,

    /// Default commands not currently running, by resource
    defaults: HashMap<Resource, Box<dyn Command>>,

    enabled: bool,
}

struct Active {
    cmd: Box<dyn Command>,

    /// Set if this command is the default for the resource and must be handed
    /// back when it ends.
    default_for: Option<Resource>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CmdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdScheduler {
    /// Create a new, enabled scheduler with no commands.
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            defaults: HashMap::new(),
            enabled: true,
        }
    }

    /// Set the command to run whenever `resource` has no other holder.
    ///
    /// The command must require `resource` and nothing else. Any previous
    /// default for the resource is ended if running and replaced.
    pub fn set_default_cmd(
        &mut self,
        resource: Resource,
        cmd: Box<dyn Command>,
        dt: &mut Drivetrain,
    ) -> Result<(), SchedulerError> {
        if cmd.requirements() != [resource] {
            return Err(SchedulerError::InvalidDefault(cmd.name().to_string(), resource));
        }

        // End a running default so that its replacement takes over
        if let Some(i) = self
            .active
            .iter()
            .position(|a| a.default_for == Some(resource))
        {
            let mut old = self.active.remove(i);
            old.cmd.end(dt, true);
        }

        debug!("Default command for {:?} set to {}", resource, cmd.name());
        self.defaults.insert(resource, cmd);

        Ok(())
    }

    /// Schedule a command.
    ///
    /// Active commands sharing any resource with the new command are ended
    /// as interrupted before the new command is initialised. Commands are not
    /// scheduled while the scheduler is disabled, in which case `false` is
    /// returned.
    pub fn schedule(&mut self, cmd: Box<dyn Command>, dt: &mut Drivetrain) -> bool {
        self.start(cmd, None, dt)
    }

    /// Run one cycle.
    ///
    /// Idle resources get their default command, then every active command
    /// is executed. Commands which report finished are ended and removed.
    pub fn run(&mut self, dt: &mut Drivetrain) {
        if !self.enabled {
            return;
        }

        self.schedule_defaults(dt);

        let mut i = 0;
        while i < self.active.len() {
            let finished = {
                let a = &mut self.active[i];
                a.cmd.execute(dt);
                a.cmd.is_finished()
            };

            if finished {
                let a = self.active.remove(i);
                debug!("{} finished", a.cmd.name());
                self.retire(a, dt, false);
            } else {
                i += 1;
            }
        }
    }

    /// End every active command as interrupted.
    pub fn cancel_all(&mut self, dt: &mut Drivetrain) {
        for a in std::mem::take(&mut self.active) {
            self.retire(a, dt, true);
        }
    }

    /// Disable the scheduler, ending all commands and stopping the
    /// drivetrain.
    pub fn disable(&mut self, dt: &mut Drivetrain) {
        self.cancel_all(dt);
        self.enabled = false;
        dt.make_safe();

        info!("Command scheduler disabled");
    }

    /// Enable the scheduler, default commands start on the next run.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            info!("Command scheduler enabled");
        }
    }

    /// False while disabled, nothing is scheduled or run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the command holding `resource`, if any.
    pub fn holder(&self, resource: Resource) -> Option<&str> {
        self.active
            .iter()
            .find(|a| a.cmd.requirements().contains(&resource))
            .map(|a| a.cmd.name())
    }

    /// Returns true if a command with the given name is active.
    pub fn is_scheduled(&self, name: &str) -> bool {
        self.active.iter().any(|a| a.cmd.name() == name)
    }

    /// Number of active commands.
    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    fn schedule_defaults(&mut self, dt: &mut Drivetrain) {
        let idle: Vec<Resource> = self
            .defaults
            .keys()
            .filter(|r| self.holder(**r).is_none())
            .cloned()
            .collect();

        for r in idle {
            if let Some(cmd) = self.defaults.remove(&r) {
                self.start(cmd, Some(r), dt);
            }
        }
    }

    fn start(
        &mut self,
        mut cmd: Box<dyn Command>,
        default_for: Option<Resource>,
        dt: &mut Drivetrain,
    ) -> bool {
        if !self.enabled {
            debug!("Scheduler disabled, {} not scheduled", cmd.name());
            return false;
        }

        // Interrupt any command sharing a resource with the new one
        let mut i = 0;
        while i < self.active.len() {
            let conflicts = self.active[i]
                .cmd
                .requirements()
                .iter()
                .any(|r| cmd.requirements().contains(r));

            if conflicts {
                let a = self.active.remove(i);
                debug!("{} interrupted by {}", a.cmd.name(), cmd.name());
                self.retire(a, dt, true);
            } else {
                i += 1;
            }
        }

        cmd.initialise(dt);
        debug!("{} scheduled", cmd.name());

        self.active.push(Active { cmd, default_for });

        true
    }

    /// End a command and hand defaults back.
    fn retire(&mut self, mut a: Active, dt: &mut Drivetrain, interrupted: bool) {
        a.cmd.end(dt, interrupted);

        if let Some(r) = a.default_for {
            // A newer default set while this one ran takes precedence
            self.defaults.entry(r).or_insert(a.cmd);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd::{InstantCmd, RotateToHeadingCmd};
    use crate::drivetrain::test_rig;
    use std::cell::RefCell;
    use std::rc::Rc;
    use util::module::State;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Command recording its lifecycle calls.
    struct Probe {
        name: &'static str,
        log: Log,
        finish_after: Option<u32>,
        runs: u32,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log, finish_after: Option<u32>) -> Box<Self> {
            Box::new(Self {
                name,
                log: log.clone(),
                finish_after,
                runs: 0,
            })
        }
    }

    impl Command for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn requirements(&self) -> &[Resource] {
            &[Resource::Drivetrain]
        }

        fn initialise(&mut self, _dt: &mut Drivetrain) {
            self.log.borrow_mut().push(format!("{} init", self.name));
        }

        fn execute(&mut self, _dt: &mut Drivetrain) {
            self.runs += 1;
            self.log.borrow_mut().push(format!("{} exec", self.name));
        }

        fn is_finished(&self) -> bool {
            self.finish_after.map_or(false, |n| self.runs >= n)
        }

        fn end(&mut self, _dt: &mut Drivetrain, interrupted: bool) {
            self.log
                .borrow_mut()
                .push(format!("{} end {}", self.name, interrupted));
        }
    }

    #[test]
    fn test_exclusive_resource() {
        let (mut dt, _plant) = test_rig::build(test_rig::test_params());
        let log = Log::default();
        let mut sched = CmdScheduler::new();

        assert!(sched.schedule(Probe::new("a", &log, None), &mut dt));
        sched.run(&mut dt);
        assert!(sched.schedule(Probe::new("b", &log, None), &mut dt));
        sched.run(&mut dt);

        assert_eq!(sched.num_active(), 1);
        assert_eq!(sched.holder(Resource::Drivetrain), Some("b"));
        assert_eq!(
            *log.borrow(),
            vec!["a init", "a exec", "a end true", "b init", "b exec"]
        );
    }

    #[test]
    fn test_default_resumes() {
        let (mut dt, _plant) = test_rig::build(test_rig::test_params());
        let log = Log::default();
        let mut sched = CmdScheduler::new();

        sched
            .set_default_cmd(Resource::Drivetrain, Probe::new("def", &log, None), &mut dt)
            .unwrap();
        sched.run(&mut dt);
        assert!(sched.is_scheduled("def"));

        sched.schedule(Probe::new("once", &log, Some(1)), &mut dt);
        assert!(!sched.is_scheduled("def"));

        // Runs once and finishes, the default comes back on the next cycle
        sched.run(&mut dt);
        assert_eq!(sched.num_active(), 0);
        sched.run(&mut dt);
        assert_eq!(sched.holder(Resource::Drivetrain), Some("def"));

        assert_eq!(
            *log.borrow(),
            vec![
                "def init",
                "def exec",
                "def end true",
                "once init",
                "once exec",
                "once end false",
                "def init",
                "def exec",
            ]
        );
    }

    #[test]
    fn test_invalid_default() {
        let (mut dt, _plant) = test_rig::build(test_rig::test_params());
        let mut sched = CmdScheduler::new();

        let cmd = InstantCmd::new("nothing", vec![], |_| ());
        match sched.set_default_cmd(Resource::Drivetrain, Box::new(cmd), &mut dt) {
            Err(SchedulerError::InvalidDefault(name, _)) => assert_eq!(name, "nothing"),
            Ok(_) => panic!("Default without requirements accepted"),
        }
    }

    #[test]
    fn test_disable() {
        let (mut dt, plant) = test_rig::build(test_rig::test_params());
        let log = Log::default();
        let mut sched = CmdScheduler::new();

        sched.schedule(Box::new(RotateToHeadingCmd::new(90.0)), &mut dt);
        sched.run(&mut dt);
        dt.set_speed(0.3);
        dt.proc(&()).unwrap();
        assert!(plant.last_demand() != (0.0, 0.0));

        assert!(sched.is_enabled());
        sched.disable(&mut dt);
        assert!(!sched.is_enabled());
        assert_eq!(sched.num_active(), 0);
        assert_eq!(plant.last_demand(), (0.0, 0.0));
        assert!(!dt.is_position_lock());

        // Nothing runs while disabled
        assert!(!sched.schedule(Probe::new("p", &log, None), &mut dt));
        sched.run(&mut dt);
        assert!(log.borrow().is_empty());

        sched.enable();
        assert!(sched.is_enabled());
        assert!(sched.schedule(Probe::new("p", &log, None), &mut dt));
    }

    #[test]
    fn test_instant_cmd() {
        let (mut dt, _plant) = test_rig::build(test_rig::test_params());
        let mut sched = CmdScheduler::new();

        let cmd = InstantCmd::new("anti drift", vec![Resource::Drivetrain], |dt| {
            dt.set_anti_drift(true)
        });
        sched.schedule(Box::new(cmd), &mut dt);
        assert!(dt.is_anti_drift());

        sched.run(&mut dt);
        assert_eq!(sched.num_active(), 0);
    }
}
