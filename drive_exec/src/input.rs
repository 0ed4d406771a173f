//! # Operator input
//!
//! Shaping of the operator's analogue inputs and edge triggered bindings of
//! buttons onto commands. Inputs are written once per cycle by the input
//! source (a script in the executable) and read by commands through
//! [`Supplier`]s.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

// Internal
use crate::cmd::{Command, Supplier};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A shared analogue input.
///
/// Clones read and write the same value. The raw value is stored, the
/// deadzone is applied when the value is supplied to a command.
#[derive(Debug, Clone)]
pub struct Axis {
    raw: Rc<Cell<f64>>,
    deadzone: f64,
}

/// Factory creating the command run when a button is pressed.
pub type CmdFactory = Box<dyn FnMut() -> Box<dyn Command>>;

/// Button to command bindings, triggered on the rising edge of a press.
#[derive(Default)]
pub struct Bindings {
    on_true: HashMap<Button, CmdFactory>,

    /// Current state of each button seen so far
    pressed: HashMap<Button, bool>,

    /// Buttons pressed since the last call to `take_triggered`
    triggered: Vec<Button>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Operator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// Zero the gyro and encoders
    ZeroSensors,

    /// Turn back to heading zero
    ZeroHeading,
}

/// An operator input event.
///
/// Events are read from scripts as JSON, for example:
///
/// ```text
/// 0.0: "Enable";
/// 0.5: {"Axes": {"turn": 0.0, "move": 0.4}};
/// 2.0: {"Press": "ZeroHeading"};
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// New raw values of the operator's sticks, each in [-1, 1].
    Axes {
        turn: f64,
        #[serde(rename = "move")]
        move_rate: f64,
    },

    Press(Button),
    Release(Button),

    /// Enable the robot, commands start running
    Enable,

    /// Disable the robot, all commands end and the drivetrain stops
    Disable,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply a deadzone to a normalised input.
///
/// Values within `deadzone` of zero give zero, the remaining range is
/// stretched so that the output is continuous at the edge of the deadzone
/// and ±1 still maps to ±1. `deadzone` must be in [0, 1).
pub fn apply_deadzone(raw: f64, deadzone: f64) -> f64 {
    if raw.abs() <= deadzone {
        0.0
    } else {
        raw.signum() * (raw.abs() - deadzone) / (1.0 - deadzone)
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Axis {
    /// Create a new axis at zero with the given deadzone.
    pub fn new(deadzone: f64) -> Self {
        Self {
            raw: Rc::new(Cell::new(0.0)),
            deadzone,
        }
    }

    /// Set the raw value, which is limited to [-1, 1].
    ///
    /// Non-finite values are treated as a released stick.
    pub fn set(&self, raw: f64) {
        let raw = if raw.is_finite() { raw.max(-1.0).min(1.0) } else { 0.0 };
        self.raw.set(raw);
    }

    /// The shaped value.
    pub fn get(&self) -> f64 {
        apply_deadzone(self.raw.get(), self.deadzone)
    }

    /// A supplier of the shaped value for use by a command.
    pub fn supplier(&self) -> Supplier {
        let axis = self.clone();
        Box::new(move || axis.get())
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the command made by `factory` each time `button` is pressed.
    pub fn on_true<F, C>(&mut self, button: Button, mut factory: F)
    where
        F: FnMut() -> C + 'static,
        C: Command + 'static,
    {
        self.on_true
            .insert(button, Box::new(move || Box::new(factory()) as Box<dyn Command>));
    }

    /// Update the state of a button, recording a trigger on a rising edge.
    pub fn set_pressed(&mut self, button: Button, pressed: bool) {
        let was_pressed = self.pressed.insert(button, pressed).unwrap_or(false);

        if pressed && !was_pressed {
            debug!("{:?} pressed", button);
            self.triggered.push(button);
        }
    }

    /// Get the commands bound to buttons pressed since the last call.
    pub fn take_triggered(&mut self) -> Vec<Box<dyn Command>> {
        let mut cmds = Vec::new();

        for button in self.triggered.drain(..) {
            if let Some(factory) = self.on_true.get_mut(&button) {
                cmds.push(factory());
            }
        }

        cmds
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd::ZeroSensorsCmd;

    #[test]
    fn test_deadzone() {
        assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
        assert_eq!(apply_deadzone(-0.1, 0.1), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.1), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.1), -1.0);
        assert_eq!(apply_deadzone(0.3, 0.0), 0.3);

        // Continuous at the edge of the deadzone
        assert!(apply_deadzone(0.1 + 1e-9, 0.1).abs() < 1e-8);
        assert!((apply_deadzone(-0.55, 0.1) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_axis() {
        let axis = Axis::new(0.1);
        let mut supplier = axis.supplier();

        axis.set(0.05);
        assert_eq!(supplier(), 0.0);

        axis.set(3.0);
        assert_eq!(supplier(), 1.0);

        axis.set(std::f64::NAN);
        assert_eq!(axis.get(), 0.0);
    }

    #[test]
    fn test_rising_edge() {
        let mut bindings = Bindings::new();
        bindings.on_true(Button::ZeroSensors, ZeroSensorsCmd::new);

        bindings.set_pressed(Button::ZeroSensors, true);
        bindings.set_pressed(Button::ZeroSensors, true);
        let cmds = bindings.take_triggered();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name(), "ZeroSensors");

        // Held, no new trigger
        assert!(bindings.take_triggered().is_empty());

        bindings.set_pressed(Button::ZeroSensors, false);
        bindings.set_pressed(Button::ZeroSensors, true);
        assert_eq!(bindings.take_triggered().len(), 1);

        // Unbound buttons do nothing
        bindings.set_pressed(Button::ZeroHeading, true);
        assert!(bindings.take_triggered().is_empty());
    }

    #[test]
    fn test_event_json() {
        let e: InputEvent = serde_json::from_str(r#"{"Axes": {"turn": 0.5, "move": -1.0}}"#).unwrap();
        assert_eq!(e, InputEvent::Axes { turn: 0.5, move_rate: -1.0 });

        let e: InputEvent = serde_json::from_str(r#"{"Press": "ZeroHeading"}"#).unwrap();
        assert_eq!(e, InputEvent::Press(Button::ZeroHeading));

        let e: InputEvent = serde_json::from_str(r#""Disable""#).unwrap();
        assert_eq!(e, InputEvent::Disable);
    }
}
