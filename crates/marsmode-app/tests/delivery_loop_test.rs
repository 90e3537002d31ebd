//! Delivery loop lifecycle tests.
//!
//! Drive [`Controller::run`] against the simulated bus and check the
//! connection lifecycle: exception budget, reconnect, give-up, cleanup on
//! every exit path, dry-run isolation and cooperative shutdown.

use std::{
    ops::ControlFlow,
    panic::{AssertUnwindSafe, catch_unwind},
    time::Duration,
};

use marsmode_app::{
    Controller, ControllerConfig, ControllerError, MAX_EXCEPTION_COUNT, RECONNECT_DELAY, RunOutcome,
};
use marsmode_core::{Environment, ModeAction};
use marsmode_harness::{SimBus, SimEnv};
use marsmode_proto::{BUS_MAIN, BUS_VEHICLE, Frame, SafetyMode, payloads::VOLUME_DOWN};
use proptest::prelude::*;

fn controller_with(setup: impl FnOnce(&mut SimBus)) -> Controller<SimBus, SimEnv> {
    let env = SimEnv::new();
    let mut bus = SimBus::new(env.clone());
    setup(&mut bus);
    Controller::new(bus, env, ControllerConfig::default())
}

/// Receive once per iteration, stop after `iterations` successful ones.
fn receive_until(
    iterations: u32,
) -> impl FnMut(&mut Controller<SimBus, SimEnv>) -> Result<ControlFlow<()>, ControllerError> {
    let mut ok = 0;
    move |controller| {
        controller.receive()?;
        ok += 1;
        Ok(if ok >= iterations { ControlFlow::Break(()) } else { ControlFlow::Continue(()) })
    }
}

#[test]
fn connect_configures_both_buses_and_safety() {
    let env = SimEnv::new();
    let bus = SimBus::new(env.clone());
    let config = ControllerConfig { can_speed_kbps: 250, safety_mode: SafetyMode::Silent, dry_run: false };
    let mut controller = Controller::new(bus, env, config);

    controller.connect().unwrap();

    assert!(controller.is_connected());
    assert_eq!(controller.generation(), 1);
    assert_eq!(controller.bus().bus_speeds(), &[(BUS_MAIN, 250), (BUS_VEHICLE, 250)]);
    assert_eq!(controller.bus().safety_history(), &[SafetyMode::Silent]);
}

#[test]
fn sixth_consecutive_failure_triggers_reconnect() {
    let mut controller = controller_with(|bus| bus.fail_receives(MAX_EXCEPTION_COUNT + 1));

    let outcome = controller.run(receive_until(1), true);

    assert_eq!(outcome, RunOutcome::Stopped);
    let bus = controller.bus();
    assert_eq!(bus.connects(), 2);
    // one for the reconnect, one for cleanup
    assert_eq!(bus.disconnects(), 2);
    assert_eq!(controller.generation(), 2);
    assert_eq!(controller.env().sleeps(), vec![RECONNECT_DELAY; 6]);
}

#[test]
fn five_failures_stay_on_the_same_connection() {
    let mut controller = controller_with(|bus| bus.fail_receives(MAX_EXCEPTION_COUNT));

    let outcome = controller.run(receive_until(1), true);

    assert_eq!(outcome, RunOutcome::Stopped);
    assert_eq!(controller.bus().connects(), 1);
    assert_eq!(controller.exception_count(), 0);
}

#[test]
fn without_retry_failures_only_pause() {
    let mut controller = controller_with(|bus| bus.fail_receives(20));

    let outcome = controller.run(receive_until(1), false);

    assert_eq!(outcome, RunOutcome::Stopped);
    assert_eq!(controller.bus().connects(), 1);
    assert_eq!(controller.env().now(), RECONNECT_DELAY * 20);
}

#[test]
fn failed_reconnect_ends_run() {
    let mut controller = controller_with(|bus| {
        bus.limit_connects(1);
        bus.fail_receives(u32::MAX);
    });

    let outcome = controller.run(receive_until(1), true);

    assert_eq!(outcome, RunOutcome::ReconnectFailed);
    let bus = controller.bus();
    assert_eq!(bus.connect_attempts(), 2);
    assert!(!bus.is_open());
    assert_eq!(bus.safety(), SafetyMode::Silent);
    assert!(!controller.is_connected());
}

#[test]
fn failed_initial_connect_never_steps() {
    let mut controller = controller_with(|bus| bus.fail_connects(1));
    let mut stepped = false;

    let outcome = controller.run(
        |_| {
            stepped = true;
            Ok(ControlFlow::Break(()))
        },
        true,
    );

    assert_eq!(outcome, RunOutcome::ConnectFailed);
    assert!(!stepped);
}

#[test]
fn failed_configuration_releases_the_device() {
    let mut controller = controller_with(|bus| bus.fail_bus_speeds(1));

    let outcome = controller.run(|_| panic!("must not step"), true);

    assert_eq!(outcome, RunOutcome::ConnectFailed);
    let bus = controller.bus();
    assert_eq!(bus.connects(), 1);
    assert!(!bus.is_open());
    assert_eq!(bus.disconnects(), 1);
    assert!(!controller.is_connected());
}

#[test]
fn normal_stop_cleans_up() {
    let mut controller = controller_with(|_| {});

    let outcome = controller.run(|_| Ok(ControlFlow::Break(())), true);

    assert_eq!(outcome, RunOutcome::Stopped);
    let bus = controller.bus();
    assert!(!bus.is_open());
    assert_eq!(bus.safety(), SafetyMode::Silent);
    assert_eq!(bus.disconnects(), 1);
}

#[test]
fn panic_in_step_still_cleans_up() {
    let mut controller = controller_with(|_| {});

    let result = catch_unwind(AssertUnwindSafe(|| {
        controller.run(|_| -> Result<ControlFlow<()>, ControllerError> { panic!("step exploded") }, true)
    }));

    assert!(result.is_err());
    let bus = controller.bus();
    assert!(!bus.is_open());
    assert_eq!(bus.safety(), SafetyMode::Silent);
}

#[test]
fn shutdown_request_prevents_next_step() {
    let mut controller = controller_with(|_| {});
    let mut steps = 0;

    let outcome = controller.run(
        |c| {
            steps += 1;
            c.request_shutdown();
            Ok(ControlFlow::Continue(()))
        },
        true,
    );

    assert_eq!(outcome, RunOutcome::ShutdownRequested);
    assert_eq!(steps, 1);
    assert!(!controller.bus().is_open());
}

#[test]
fn shutdown_before_run_skips_every_step() {
    let mut controller = controller_with(|_| {});
    controller.shutdown_handle().request();

    let outcome = controller.run(|_| panic!("must not step"), true);

    assert_eq!(outcome, RunOutcome::ShutdownRequested);
    assert_eq!(controller.bus().connects(), 1);
    assert!(!controller.bus().is_open());
}

#[test]
fn dry_run_never_touches_the_bus() {
    let env = SimEnv::new();
    let bus = SimBus::new(env.clone());
    let config = ControllerConfig { dry_run: true, ..ControllerConfig::default() };
    let mut controller = Controller::new(bus, env, config);
    let frame = Frame::steering(VOLUME_DOWN);

    let outcome = controller.run(
        |c| {
            assert!(c.receive()?.is_empty());
            c.send(&frame)?;
            c.set_safety_mode(SafetyMode::AllowOutput)?;
            Ok(ControlFlow::Break(()))
        },
        true,
    );

    assert_eq!(outcome, RunOutcome::Stopped);
    let bus = controller.bus();
    assert_eq!(bus.connect_attempts(), 0);
    assert_eq!(bus.receives(), 0);
    assert!(bus.accepted().is_empty());
    assert!(bus.safety_history().is_empty());
    assert_eq!(bus.disconnects(), 0);
}

#[test]
fn operations_require_a_connection() {
    let mut controller = controller_with(|_| {});

    assert!(matches!(controller.send(&Frame::steering(VOLUME_DOWN)), Err(ControllerError::NotConnected)));
    assert!(matches!(controller.receive(), Err(ControllerError::NotConnected)));
    assert!(matches!(controller.set_safety_mode(SafetyMode::Silent), Err(ControllerError::NotConnected)));
}

#[test]
fn execute_finishes_batch_after_send_failure() {
    let mut controller = controller_with(|bus| bus.fail_sends(1));
    controller.connect().unwrap();

    let result = controller.execute([
        ModeAction::Send(Frame::steering(VOLUME_DOWN)),
        ModeAction::Delay(Duration::from_millis(300)),
        ModeAction::Send(Frame::steering(VOLUME_DOWN)),
        ModeAction::SetSafety(SafetyMode::Silent),
    ]);

    assert!(matches!(result, Err(ControllerError::Bus(_))));
    let bus = controller.bus();
    assert_eq!(bus.accepted().len(), 1);
    assert_eq!(bus.safety(), SafetyMode::Silent);
    assert_eq!(controller.env().now(), Duration::from_millis(300));
}

#[test]
fn random_delay_stays_in_range() {
    let mut controller = controller_with(|_| {});
    controller.connect().unwrap();

    controller
        .execute([ModeAction::RandomDelay { min: Duration::from_secs(4), max: Duration::from_secs(8) }])
        .unwrap();

    let now = controller.env().now();
    assert!(now >= Duration::from_secs(4) && now < Duration::from_secs(8));
}

proptest! {
    #[test]
    fn prop_reconnects_once_per_exhausted_budget(failures in 0u32..18) {
        let mut controller = controller_with(|bus| bus.fail_receives(failures));

        let outcome = controller.run(receive_until(1), true);

        prop_assert_eq!(outcome, RunOutcome::Stopped);
        let expected_reconnects = failures / (MAX_EXCEPTION_COUNT + 1);
        prop_assert_eq!(controller.bus().connects(), 1 + expected_reconnects);
    }
}
