//! # Input processor module
//!
//! The input processor applies operator input events, from any source, to
//! the data store.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use crate::data_store::{DataStore, SafeModeCause};
use crate::input::InputEvent;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply an input event.
///
/// Axis and button events take effect on the next call to
/// [`DataStore::proc`].
pub fn exec(ds: &mut DataStore, event: &InputEvent) {
    match event {
        InputEvent::Axes { turn, move_rate } => {
            ds.turn_axis.set(*turn);
            ds.move_axis.set(*move_rate);
        }
        InputEvent::Press(b) => ds.bindings.set_pressed(*b, true),
        InputEvent::Release(b) => ds.bindings.set_pressed(*b, false),
        InputEvent::Enable => {
            debug!("Received Enable input");
            if let Err(cause) = ds.make_unsafe(SafeModeCause::DisableRequested) {
                warn!("Cannot enable, robot was made safe due to {:?}", cause);
            }
        }
        InputEvent::Disable => {
            debug!("Received Disable input");
            ds.make_safe(SafeModeCause::DisableRequested);
        }
    }
}
