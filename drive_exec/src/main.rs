//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Operator input processing (from the input script)
//!         - Command processing (button bindings and the scheduler)
//!         - Drivetrain processing (heading control, actuator demands)
//!         - Simulated plant step
//!         - Archiving
//!
//! # Usage
//!
//! ```text
//! drive_exec <input_script>
//! ```
//!
//! The parameter files are read from `$DRIVE_SW_ROOT/params`, and the logs
//! and archives are written to `$DRIVE_SW_ROOT/sessions`.
//!
//! # Modules
//!
//! All cyclic modules (e.g. `drivetrain`) shall meet the following
//! requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use drive_lib::{
    cmd::{DriveCmd, RotateCmd, RotateToHeadingCmd, ZeroSensorsCmd},
    data_store::{DataStore, SafeModeCause},
    drivetrain::{self, Drivetrain, DrivetrainError},
    eqpt::sim::SimPlant,
    input::{Button, InputEvent},
    input_processor,
    params::{DefaultCmd, DriveExecParams},
    scheduler::Resource,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{Pending, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger, the per-cycle traces of the simulation are left out
    logger_init(
        LevelFilter::Trace,
        &[("drive_lib::eqpt::sim", LevelFilter::Info)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Heading Hold Drive Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;
    exec_params
        .validate()
        .map_err(|e| eyre!("Invalid exec params: {}", e))?;

    let mut dt_params: drivetrain::Params =
        util::params::load("drivetrain.toml").wrap_err("Could not load drivetrain params")?;

    // The heading controllers run at the executable's cycle rate
    dt_params.cycle_period_s = exec_params.cycle_period_s;

    info!("Exec parameters loaded");

    // ---- INITIALISE INPUT SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected a single argument, the path to the input script, found {}",
            args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script: ScriptInterpreter<InputEvent> =
        ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} events\n",
        script.get_duration(),
        script.get_num_entries()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let plant = SimPlant::new(&exec_params.sim).wrap_err("Failed to create the simulated plant")?;

    let mut drivetrain = Drivetrain::new(Box::new(plant.gyro()), Box::new(plant.drive_base()));
    drivetrain
        .init(dt_params.clone())
        .wrap_err("Failed to initialise the Drivetrain")?;
    info!("Drivetrain init complete");

    let mut ds = DataStore::new(drivetrain, exec_params.deadzone);
    ds.open_archives(&session)
        .map_err(|e| eyre!("Failed to open the archives: {}", e))?;

    // ---- COMMANDS ----

    let default_cmd: Box<dyn drive_lib::cmd::Command> = match exec_params.default_cmd {
        DefaultCmd::Rotate => Box::new(RotateCmd::new(ds.turn_axis.supplier())),
        DefaultCmd::Drive => Box::new(
            DriveCmd::new(ds.move_axis.supplier(), ds.turn_axis.supplier(), &dt_params)
                .wrap_err("Failed to create the drive command")?,
        ),
    };
    ds.scheduler
        .set_default_cmd(Resource::Drivetrain, default_cmd, &mut ds.drivetrain)
        .wrap_err("Failed to set the default command")?;

    let zero_heading_deg = exec_params.zero_heading_deg;
    ds.bindings.on_true(Button::ZeroSensors, ZeroSensorsCmd::new);
    ds.bindings
        .on_true(Button::ZeroHeading, move || RotateToHeadingCmd::new(zero_heading_deg));

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        ds.cycle_start(session::get_elapsed_seconds());

        // ---- INPUT PROCESSING ----

        match script.get_pending(ds.sim_time_s) {
            Pending::None => (),
            Pending::Some(events) => {
                for event in events.iter() {
                    input_processor::exec(&mut ds, event);
                }
            }
            // Exit if end of script reached
            Pending::EndOfScript => {
                info!("End of input script reached, stopping");
                break;
            }
        }

        // ---- CONTROL PROCESSING ----

        match ds.proc() {
            Ok(()) => (),
            Err(DrivetrainError::NotInitialised) => {
                raise_error!("Drivetrain processed before initialisation")
            }
            Err(e) => warn!("Error during Drivetrain processing: {}", e),
        }

        // ---- SIMULATION ----

        plant.step(exec_params.cycle_period_s);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.write() {
            warn!("Could not write archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > exec_params.max_consec_cycle_overruns {
                    if !ds.safe {
                        error!(
                            "More than {} consecutive cycle overruns",
                            exec_params.max_consec_cycle_overruns
                        );
                    }
                    ds.make_safe(SafeModeCause::CycleOverrunLimit);
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    ds.make_safe(SafeModeCause::DisableRequested);

    info!(
        "End of execution after {} cycles, final heading {:.2} deg",
        ds.num_cycles,
        ds.drivetrain.actual_heading_deg()
    );

    Ok(())
}
