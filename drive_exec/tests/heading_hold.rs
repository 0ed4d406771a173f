//! # Heading hold integration tests
//!
//! Runs the scheduler, commands and drivetrain together against the
//! simulated plant, the way the executable does.

use drive_lib::{
    angular_pid::AngularPidParams,
    cmd::{Command, DriveCmd, RotateCmd, RotateToHeadingCmd, ZeroSensorsCmd},
    data_store::{DataStore, SafeModeCause},
    drivetrain::{ActuationPath, Drivetrain, Params},
    eqpt::{
        sim::{SimPlant, SimPlantParams},
        NeutralMode,
    },
    input::{Button, InputEvent},
    input_processor,
    scheduler::Resource,
};
use util::{
    maths::get_ang_dist,
    module::State,
    script_interpreter::{Pending, ScriptInterpreter},
};

const PERIOD_S: f64 = 0.02;

fn params() -> Params {
    let head_ctrl = AngularPidParams {
        k_p: 0.02,
        k_i: 0.0,
        k_d: 0.0,
        tolerance: 2.0,
        rate_tolerance: 50.0,
        wrap_min: -180.0,
        wrap_max: 180.0,
        integral_limit: None,
    };

    Params {
        track_width_m: 0.5,
        max_velocity_ms: 2.0,
        max_angular_velocity_rads: 3.0,
        min_output: -1.0,
        max_output: 1.0,
        neutral_mode: NeutralMode::Coast,
        cycle_period_s: PERIOD_S,
        head_ctrl,
        drive_head_ctrl: AngularPidParams {
            k_p: 2.0,
            ..head_ctrl
        },
    }
}

/// Build an enabled data store driving a fresh plant.
fn rig(default_drive: bool) -> (DataStore, SimPlant) {
    let params = params();
    let plant = SimPlant::new(&SimPlantParams {
        max_velocity_ms: params.max_velocity_ms,
        track_width_m: params.track_width_m,
        initial_yaw_deg: 0.0,
    })
    .unwrap();

    let mut dt = Drivetrain::new(Box::new(plant.gyro()), Box::new(plant.drive_base()));
    dt.init(params.clone()).unwrap();

    let mut ds = DataStore::new(dt, 0.1);

    let default_cmd: Box<dyn Command> = if default_drive {
        Box::new(
            DriveCmd::new(ds.move_axis.supplier(), ds.turn_axis.supplier(), &params).unwrap(),
        )
    } else {
        Box::new(RotateCmd::new(ds.turn_axis.supplier()))
    };
    ds.scheduler
        .set_default_cmd(Resource::Drivetrain, default_cmd, &mut ds.drivetrain)
        .unwrap();

    ds.bindings.on_true(Button::ZeroSensors, ZeroSensorsCmd::new);
    ds.bindings
        .on_true(Button::ZeroHeading, || RotateToHeadingCmd::new(0.0));

    input_processor::exec(&mut ds, &InputEvent::Enable);

    (ds, plant)
}

fn cycle(ds: &mut DataStore, plant: &SimPlant, n: usize) {
    for _ in 0..n {
        ds.proc().unwrap();
        plant.step(PERIOD_S);
        ds.cycle_end();
    }
}

#[test]
fn test_hold_heading_when_knocked() {
    let (mut ds, plant) = rig(false);
    cycle(&mut ds, &plant, 5);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("Rotate"));

    // Knocked round by 30 degrees with the sticks released
    plant.set_yaw_deg(30.0);
    cycle(&mut ds, &plant, 300);

    let err = get_ang_dist(plant.yaw_deg(), 0.0, -180.0, 180.0);
    assert!(err.abs() <= 2.0, "heading error {} after recovery", err);
    assert_eq!(ds.drivetrain_output.unwrap().path, ActuationPath::HoldInPlace);
}

#[test]
fn test_rotate_across_boundary() {
    let (mut ds, plant) = rig(false);
    plant.set_yaw_deg(175.0);
    input_processor::exec(&mut ds, &InputEvent::Press(Button::ZeroSensors));
    cycle(&mut ds, &plant, 1);
    assert!(ds.drivetrain.actual_heading_deg().abs() < 1e-9);

    // Turn by hand to 170, then ask for -170, the short way is 20 degrees
    // clockwise through 180.
    ds.schedule(Box::new(RotateToHeadingCmd::new(170.0)));
    cycle(&mut ds, &plant, 300);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("Rotate"));

    let start = plant.yaw_deg();
    ds.schedule(Box::new(RotateToHeadingCmd::new(-170.0)));
    cycle(&mut ds, &plant, 1);
    assert!(ds.drivetrain_status_rpt.head_error_deg > 0.0);
    assert!(ds.drivetrain_status_rpt.head_error_deg <= 20.0 + 2.0);

    cycle(&mut ds, &plant, 300);
    let turned = plant.yaw_deg() - start;
    assert!(turned > 0.0 && turned < 30.0, "turned {} degrees", turned);
    assert!((ds.drivetrain.actual_heading_deg() + 170.0).abs() <= 2.0);
}

#[test]
fn test_button_interrupts_default() {
    let (mut ds, plant) = rig(true);
    cycle(&mut ds, &plant, 1);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("Drive"));

    plant.set_yaw_deg(90.0);
    cycle(&mut ds, &plant, 1);

    // Only one command may hold the drivetrain
    input_processor::exec(&mut ds, &InputEvent::Press(Button::ZeroHeading));
    cycle(&mut ds, &plant, 1);
    assert_eq!(ds.scheduler.num_active(), 1);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("RotateToHeading"));

    // Holding the button does not restart the command
    cycle(&mut ds, &plant, 400);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("Drive"));
    assert!(plant.yaw_deg().abs() <= 3.0);
}

#[test]
fn test_drive_straight_with_hold() {
    let (mut ds, plant) = rig(true);
    cycle(&mut ds, &plant, 1);

    input_processor::exec(
        &mut ds,
        &InputEvent::Axes {
            turn: 0.0,
            move_rate: 0.55,
        },
    );
    cycle(&mut ds, &plant, 10);
    assert_eq!(ds.drivetrain_output.unwrap().path, ActuationPath::Direct);

    let (l, r) = plant.last_demand();
    assert!((l - 0.5).abs() < 1e-9 && (r - 0.5).abs() < 1e-9);

    // A knock is corrected while driving
    plant.set_yaw_deg(-20.0);
    cycle(&mut ds, &plant, 300);
    assert!(plant.yaw_deg().abs() <= 2.0, "yaw {}", plant.yaw_deg());
}

#[test]
fn test_disable_stops() {
    let (mut ds, plant) = rig(true);

    input_processor::exec(
        &mut ds,
        &InputEvent::Axes {
            turn: 0.5,
            move_rate: 1.0,
        },
    );
    cycle(&mut ds, &plant, 5);
    assert!(plant.last_demand() != (0.0, 0.0));

    input_processor::exec(&mut ds, &InputEvent::Disable);
    assert_eq!(plant.last_demand(), (0.0, 0.0));
    assert_eq!(ds.scheduler.num_active(), 0);

    // Nothing moves while disabled
    let demands = plant.num_demands();
    cycle(&mut ds, &plant, 10);
    assert_eq!(plant.num_demands(), demands);

    // Re-enabling brings the default command back
    input_processor::exec(&mut ds, &InputEvent::Enable);
    cycle(&mut ds, &plant, 1);
    assert!(!ds.safe);
    assert_eq!(ds.scheduler.holder(Resource::Drivetrain), Some("Drive"));
}

#[test]
fn test_overrun_cause_not_cleared_by_enable() {
    let (mut ds, _plant) = rig(true);

    ds.make_safe(SafeModeCause::CycleOverrunLimit);
    input_processor::exec(&mut ds, &InputEvent::Enable);
    assert!(ds.safe);
}

#[test]
fn test_heading_fault_keeps_manual_drive() {
    let (mut ds, plant) = rig(false);
    cycle(&mut ds, &plant, 1);

    plant.set_gyro_fault(Some(drive_lib::eqpt::EqptError::DeviceFault(
        "bus off".to_string(),
    )));
    input_processor::exec(
        &mut ds,
        &InputEvent::Axes {
            turn: 0.55,
            move_rate: 0.0,
        },
    );
    cycle(&mut ds, &plant, 2);

    assert!(ds.drivetrain_status_rpt.heading_fault);
    let (l, r) = plant.last_demand();
    assert!((l - 0.5).abs() < 1e-9 && (r + 0.5).abs() < 1e-9);
}

#[test]
fn test_scripted_session() {
    let mut script: ScriptInterpreter<InputEvent> = ScriptInterpreter::from_str(
        r#"
        0.0: {"Axes": {"turn": 0.0, "move": 0.55}};
        0.5: {"Press": "ZeroHeading"};
        0.1: {"Axes": {"turn": 0.0, "move": 0.0}};
        1.0: "Disable";
        "#,
    )
    .unwrap();
    assert_eq!(script.get_num_entries(), 4);

    let (mut ds, plant) = rig(true);
    let mut time_s = 0.0;
    let mut ended = false;

    for _ in 0..100 {
        match script.get_pending(time_s) {
            Pending::None => (),
            Pending::Some(events) => {
                for e in events.iter() {
                    input_processor::exec(&mut ds, e);
                }
            }
            Pending::EndOfScript => {
                ended = true;
                break;
            }
        }

        cycle(&mut ds, &plant, 1);
        time_s += PERIOD_S;
    }

    assert!(ended);
    assert!(ds.safe);
    assert_eq!(ds.safe_cause, Some(SafeModeCause::DisableRequested));
    assert_eq!(plant.last_demand(), (0.0, 0.0));
}
