//! NodeService loop orchestration against mock adapters.

use envnode::actuation::relay::{PinLevel, RelayState};
use envnode::app::events::AppEvent;
use envnode::app::ports::Clock;
use envnode::config::NodeConfig;
use envnode::pins::{EC_PUMP_CHANNEL, PH_PUMP_CHANNEL, RELAY_COUNT};
use envnode::telemetry::{AcReadings, EnvironmentReadings, FlowReadings};

use crate::mock_hw::Rig;

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_forces_every_relay_off() {
    let rig = Rig::new();
    // K1 active-high → LOW, K2..K8 active-low → HIGH.
    assert_eq!(rig.relays.writes.len(), RELAY_COUNT);
    assert_eq!(rig.relays.levels[0], Some(PinLevel::Low));
    assert!(rig.relays.levels[1..].iter().all(|l| *l == Some(PinLevel::High)));
    assert_eq!(rig.service.actuation().relays().snapshot().to_string(), "00000000");
}

#[test]
fn start_probes_link_and_reports_health() {
    let rig = Rig::new();
    assert_eq!(rig.link.sent, ["MEGA_TEST"]);
    assert!(rig.service.link_healthy());
    assert_eq!(
        rig.events.0,
        [AppEvent::Started, AppEvent::LinkHealthChanged { healthy: true }]
    );
}

#[test]
fn silent_controller_is_reported_unhealthy_after_bounded_wait() {
    let rig = Rig::with(NodeConfig::default(), false);
    assert!(!rig.service.link_healthy());
    assert_eq!(rig.events.0[1], AppEvent::LinkHealthChanged { healthy: false });
    // The probe never waits longer than the configured timeout.
    assert_eq!(rig.clock.now_ms(), 1_000);
}

// ── Gated tasks ───────────────────────────────────────────────

#[test]
fn sensors_follow_their_intervals() {
    let mut rig = Rig::new();
    rig.step(500);
    assert_eq!(rig.sensors.environment_reads, 0);
    assert_eq!(rig.sensors.power_reads, 0);
    rig.step(1_000);
    assert_eq!(rig.sensors.environment_reads, 1);
    assert_eq!(rig.sensors.power_reads, 1);
    rig.step(1_500);
    assert_eq!(rig.sensors.environment_reads, 1);
    // Flow is sampled on every pass.
    assert_eq!(rig.sensors.flow_samples, 3);
    assert_eq!(rig.service.iterations(), 3);
}

#[test]
fn telemetry_carries_latest_readings() {
    let mut rig = Rig::new();
    rig.sensors.environment = EnvironmentReadings {
        co2_ppm: 612,
        air_temp_c: 23.46,
        air_humidity_pct: 51.0,
        light_lux: 70_000,
        ec_us_cm: 1_210.0,
        ph: 6.1,
        water_temp_c: 20.5,
        water_detected: true,
    };
    rig.sensors.flow.push_back(FlowReadings {
        rate_lpm: [2.0, 0.0, 0.0],
        total_ml: [250.0, 0.0, 0.0],
    });
    rig.link.clear();

    rig.step(1_000);
    assert!(rig.link.telemetry().is_empty());
    rig.step(2_000);

    let frames = rig.link.telemetry();
    assert_eq!(frames.len(), 1);
    let v: serde_json::Value = serde_json::from_str(frames[0]).unwrap();
    assert_eq!(v["msgType"], "SENSOR_DATA");
    assert_eq!(v["co2"], 612);
    assert_eq!(v["light"], 70_000);
    assert_eq!(v["waterLevel"], 100);
    assert_eq!(v["flowSensor1_LPM"], 2.0);
    assert_eq!(v["flowSensor1_Liters"], 0.25);
    // Meter offline: no AC fields at all.
    assert!(v.get("acVoltage").is_none());

    assert!(matches!(rig.events.0.last(), Some(AppEvent::Telemetry(_))));
}

#[test]
fn telemetry_includes_ac_block_when_meter_online() {
    let mut rig = Rig::new();
    rig.sensors.ac = Some(AcReadings {
        voltage_v: 229.8,
        current_a: 1.2,
        power_w: 270.0,
        energy_kwh: 12.5,
        frequency_hz: 50.0,
        power_factor: 0.98,
    });
    rig.step(1_000);
    rig.step(2_000);
    let v: serde_json::Value = serde_json::from_str(rig.link.telemetry()[0]).unwrap();
    assert_eq!(v["acFrequency"], 50.0);
    assert_eq!(v["acEnergy"], 12.5);
}

#[test]
fn periodic_link_check_reports_loss_once() {
    let mut rig = Rig::new();
    rig.link.responsive = false;
    rig.step(30_000);
    assert!(!rig.service.link_healthy());
    rig.step(60_000 + 1_000);
    let changes: Vec<_> = rig
        .events
        .0
        .iter()
        .filter(|e| matches!(e, AppEvent::LinkHealthChanged { .. }))
        .collect();
    assert_eq!(
        changes,
        [
            &AppEvent::LinkHealthChanged { healthy: true },
            &AppEvent::LinkHealthChanged { healthy: false },
        ]
    );
}

// ── Commands and timers ───────────────────────────────────────

#[test]
fn one_command_per_iteration() {
    let mut rig = Rig::new();
    rig.link.clear();
    rig.link.push("RELAY:10000000");
    rig.link.push("RELAY_STATUS");
    rig.step(10);
    assert_eq!(rig.link.replies(), ["RELAY_OK"]);
    rig.step(20);
    assert_eq!(rig.link.replies(), ["RELAY_OK", "RELAY_STATUS:10000000"]);
}

#[test]
fn pump_dose_completes_with_timing_push() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("PUMP_TIMING:EC,500", 0), ["EC_PUMP_TIMING_OK"]);
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::On)
    );

    rig.link.clear();
    rig.step(499);
    assert!(rig.link.replies().is_empty());
    rig.step(500);
    assert_eq!(rig.link.replies(), ["EC_PUMP_STOPPED:500,500,100.00,0"]);
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::Off)
    );

    // Never repeated.
    rig.step(900);
    assert_eq!(rig.link.replies().len(), 1);
}

#[test]
fn cancel_in_expiry_iteration_gives_no_duplicate_completion() {
    let mut rig = Rig::new();
    rig.send("PUMP_TIMING:PH_ACID,1000", 0);

    // The cancel arrives on the very pass where the timer would expire.
    let sent = rig.send("PUMP_TIMING:PH_BASE,0", 1_000);
    let stops: Vec<_> = sent.iter().filter(|l| l.starts_with("PH_PUMP_STOPPED")).collect();
    assert_eq!(stops, ["PH_PUMP_STOPPED:0,0,100.0,0"]);
    assert_eq!(
        rig.service.actuation().relays().state(PH_PUMP_CHANNEL),
        Some(RelayState::Off)
    );
}

#[test]
fn relay_pattern_cannot_stop_a_running_pump() {
    let mut rig = Rig::new();
    rig.send("PUMP_TIMING:EC,5000", 0);
    assert_eq!(rig.send("RELAY:00000000", 10), ["RELAY_OK"]);
    assert_eq!(
        rig.service.actuation().relays().snapshot().to_string(),
        "00000010"
    );

    // Once the pump finishes the channel is free again.
    rig.step(5_000);
    rig.send("RELAY:00000010", 5_010);
    rig.send("RELAY:00000000", 5_020);
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::Off)
    );
}

#[test]
fn fan_cycle_pushes_each_transition() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("FAN_TIMING:K5,2,1", 0), ["FAN_TIMING_OK"]);
    rig.link.clear();

    rig.step(1_000);
    assert_eq!(rig.link.replies(), ["FAN_CYCLE_STATE:ON,1000,100.00"]);
    assert_eq!(rig.service.actuation().relays().state(4), Some(RelayState::On));

    rig.step(3_004);
    assert_eq!(rig.link.replies()[1], "FAN_CYCLE_STATE:OFF,2004,99.80");
    assert_eq!(rig.service.actuation().relays().state(4), Some(RelayState::Off));
}

#[test]
fn fan_start_on_pump_channel_keeps_dose_running() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("PUMP_TIMING:EC,5000", 0), ["EC_PUMP_TIMING_OK"]);
    let fan = format!("FAN_TIMING:K{},10,5", EC_PUMP_CHANNEL + 1);
    assert_eq!(rig.send(&fan, 10), ["FAN_TIMING_OK"]);
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::On)
    );

    rig.link.clear();
    rig.step(4_999);
    assert!(rig.link.replies().is_empty());
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::On)
    );

    rig.step(5_000);
    assert_eq!(rig.link.replies(), ["EC_PUMP_STOPPED:5000,5000,100.00,0"]);
    assert_eq!(
        rig.service.actuation().relays().state(EC_PUMP_CHANNEL),
        Some(RelayState::Off)
    );
}

#[test]
fn rejected_command_changes_nothing() {
    let mut rig = Rig::new();
    let before = rig.relays.writes.len();
    assert_eq!(rig.send("FAN_TIMING:K9,1,1", 0), ["FAN_TIMING_ERROR:INVALID_RELAY"]);
    assert_eq!(rig.send("RELAY:10x00000", 0), ["RELAY_ERROR:INVALID_PATTERN"]);
    assert_eq!(rig.relays.writes.len(), before);
    assert!(!rig.service.actuation().fan().is_active());
}

#[test]
fn reset_energy_always_acknowledged() {
    let mut rig = Rig::new();
    rig.sensors.meter_acks_reset = false;
    assert_eq!(rig.send("CONFIG:RESET_ENERGY", 0), ["CONFIG_OK:ENERGY_RESET"]);
    assert_eq!(rig.sensors.energy_resets, 1);
}
