//! End-to-end scenarios for the advanced mode.
//!
//! Each scenario scripts clock, gear and steering traffic on virtual time,
//! runs the real runtime and delivery loop over the simulated bus, and
//! checks both the final mode state and what actually reached the bus.

use std::time::Duration;

use hex_literal::hex;
use marsmode_app::{ControllerConfig, RunOutcome};
use marsmode_core::{AdvancedConfig, AdvancedMode, ModeState, SubMode};
use marsmode_harness::Scenario;
use marsmode_proto::{
    SafetyMode,
    payloads::{VOLUME_DOWN, VOLUME_UP},
};

const PLAY_PAUSE: [u8; 8] = hex!("4955000000000000");
const LEFT_TILT: [u8; 8] = hex!("2995000000000000");

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn advanced(tickle_interval: u32) -> AdvancedMode {
    AdvancedMode::new(AdvancedConfig { tickle_interval, ..AdvancedConfig::default() })
}

#[test]
fn park_then_disable_goes_quiet() {
    Scenario::new("park then disable", advanced(4))
        .clock_ticks(secs(1.0), secs(1.0), 4)
        .gear_at(secs(7.0), 0)
        .steering_at(secs(8.0), PLAY_PAUSE)
        .steering_at(secs(8.3), PLAY_PAUSE)
        .run_for(secs(10.0))
        .oracle(Box::new(|world| {
            let state = world.mode().state();
            assert_eq!(world.outcome(), RunOutcome::ShutdownRequested);
            assert!(state.boot_initialized);
            assert!(state.parked);
            assert!(!state.enabled);

            // startup pair twice, tickle once
            assert_eq!(world.transmitted_count(VOLUME_DOWN), 3);
            assert_eq!(world.transmitted_count(VOLUME_UP), 3);

            // the disable confirmation was attempted but stayed off the bus
            assert_eq!(world.accepted_count(VOLUME_UP), 4);
            assert!(world.transmitted_since(secs(7.0)).is_empty());
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn disable_then_enable_resumes_cadence() {
    Scenario::new("disable then enable", advanced(4))
        .clock_ticks(secs(1.0), secs(1.0), 4)
        .steering_at(secs(7.0), PLAY_PAUSE)
        .steering_at(secs(7.3), PLAY_PAUSE)
        .clock_ticks(secs(9.0), secs(1.0), 4)
        .steering_at(secs(13.0), PLAY_PAUSE)
        .steering_at(secs(13.3), PLAY_PAUSE)
        .clock_ticks(secs(14.0), secs(1.0), 4)
        .run_for(secs(20.0))
        .oracle(Box::new(|world| {
            let state = world.mode().state();
            assert!(state.enabled);

            let while_disabled = world
                .bus()
                .transmitted()
                .iter()
                .filter(|(at, _)| *at >= secs(8.5) && *at < secs(13.0))
                .count();
            assert_eq!(while_disabled, 0, "nothing may reach the bus while disabled");

            let after_cadence: Vec<Vec<u8>> =
                world.transmitted_since(secs(17.0)).into_iter().map(|f| f.data.clone()).collect();
            assert_eq!(after_cadence, vec![VOLUME_DOWN.to_vec(), VOLUME_UP.to_vec()]);

            let history = world.bus().safety_history();
            let silenced = history.iter().position(|m| *m == SafetyMode::Silent).expect("disable silences output");
            let restored =
                history.iter().rposition(|m| *m == SafetyMode::AllowOutput).expect("enable restores output");
            assert!(restored > silenced);
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn parked_tickles_stay_off_the_bus() {
    Scenario::new("parked tickles", advanced(4))
        .gear_at(secs(0.5), 255)
        .clock_ticks(secs(1.0), secs(1.0), 4)
        .run_for(secs(10.0))
        .oracle(Box::new(|world| {
            let state = world.mode().state();
            assert!(state.parked);
            assert!(state.enabled);

            // startup always reaches the bus, the tickle does not
            assert_eq!(world.transmitted_count(VOLUME_DOWN), 2);
            assert_eq!(world.accepted_count(VOLUME_DOWN), 3);
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn left_tilt_while_disabled_confirms_then_silences() {
    let state = ModeState { enabled: false, boot_initialized: true, ..ModeState::default() };
    let mode = AdvancedMode::with_state(AdvancedConfig::default(), state);

    Scenario::new("tilt while disabled", mode)
        .steering_at(secs(1.0), LEFT_TILT)
        .steering_at(secs(1.3), LEFT_TILT)
        .run_for(secs(5.0))
        .oracle(Box::new(|world| {
            assert_eq!(world.mode().state().sub_mode, SubMode::Speed);
            assert_eq!(world.transmitted_count(VOLUME_DOWN), 1);
            assert_eq!(world.transmitted_count(VOLUME_UP), 1);

            // connect, on_connect, forced output, resting, cleanup
            assert_eq!(
                world.bus().safety_history(),
                &[
                    SafetyMode::AllowOutput,
                    SafetyMode::Silent,
                    SafetyMode::AllowOutput,
                    SafetyMode::Silent,
                    SafetyMode::Silent,
                ]
            );
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn reconnect_reapplies_resting_safety() {
    let state = ModeState { enabled: false, boot_initialized: true, ..ModeState::default() };
    let mode = AdvancedMode::with_state(AdvancedConfig::default(), state);

    Scenario::new("reconnect while disabled", mode)
        .setup_bus(|bus| bus.fail_receives(6))
        .run_for(secs(20.0))
        .oracle(Box::new(|world| {
            assert_eq!(world.outcome(), RunOutcome::ShutdownRequested);
            assert_eq!(world.bus().connects(), 2);

            let history = world.bus().safety_history();
            assert_eq!(
                &history[..5],
                &[
                    SafetyMode::AllowOutput,
                    SafetyMode::Silent,
                    SafetyMode::Silent,
                    SafetyMode::AllowOutput,
                    SafetyMode::Silent,
                ]
            );
            assert!(world.bus().accepted().is_empty());
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn silent_initial_safety_still_runs_startup() {
    let config = ControllerConfig { safety_mode: SafetyMode::Silent, ..ControllerConfig::default() };

    Scenario::new("silent connect", advanced(5))
        .controller_config(config)
        .clock_ticks(secs(1.0), secs(1.0), 1)
        .run_for(secs(5.0))
        .oracle(Box::new(|world| {
            assert_eq!(world.bus().safety_history()[0], SafetyMode::Silent);
            assert_eq!(world.transmitted_count(VOLUME_DOWN), 2);
            assert_eq!(world.transmitted_count(VOLUME_UP), 2);
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}
