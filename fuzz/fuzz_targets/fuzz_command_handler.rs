//! Fuzz target: `handle_line`
//!
//! Feeds arbitrary text lines through parse + dispatch against a live
//! actuation state.  Asserts that nothing panics, that a rejected line
//! leaves every relay untouched, and that a bulk pattern never takes a
//! running pump's channel.
//!
//! cargo fuzz run fuzz_command_handler

#![no_main]

use envnode::actuation::ActuationState;
use envnode::actuation::pump::PumpKind;
use envnode::actuation::relay::{PinLevel, RelayState};
use envnode::app::events::AppEvent;
use envnode::app::ports::{EventSink, RelayOutputPort, SensorControlPort};
use envnode::protocol::{Peripherals, Reply, handle_line};
use envnode::sensors::water::EcRange;
use libfuzzer_sys::fuzz_target;

struct Count(usize);

impl RelayOutputPort for Count {
    fn drive(&mut self, _channel: usize, _level: PinLevel) {
        self.0 += 1;
    }
}

struct Sensors;

impl SensorControlPort for Sensors {
    fn set_ec_range(&mut self, _range: EcRange) {}
    fn reset_energy(&mut self) -> bool {
        false
    }
    fn reset_flow_totals(&mut self) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let mut act = ActuationState::default();
    let mut out = Count(0);
    act.init(&mut out);
    let _ = act.start_pump(PumpKind::Ec, 60_000, 0, &mut out);

    for (now, line) in text.lines().enumerate() {
        let before = out.0;
        let reply = handle_line(
            line,
            now as u32,
            &mut act,
            Peripherals {
                relays: &mut out,
                sensors: &mut Sensors,
                events: &mut Discard,
            },
        );
        if let Some(Reply::Rejected(_)) = reply {
            assert_eq!(out.0, before, "rejected line drove a relay");
        }
        if line.trim_start().starts_with("RELAY:") && act.pump(PumpKind::Ec).is_running() {
            assert_eq!(
                act.relays().state(PumpKind::Ec.channel()),
                Some(RelayState::On),
                "running pump lost its channel"
            );
        }
        let _ = act.tick(now as u32, &mut out);
    }
});
