//! Actuation core — relay bank plus the three autonomous timers.
//!
//! [`ActuationState`] is the single owner of every relay and timer.  The
//! protocol handler and the per-loop [`ActuationState::tick`] both receive
//! it by `&mut`, so relay mutation and expiry checks can never interleave.
//!
//! ```text
//!  protocol::dispatch ──▶ ┌──────────────────────────┐
//!                         │      ActuationState      │ ──▶ RelayOutputPort
//!  NodeService::tick  ──▶ │ RelayBank · EC · PH · Fan│
//!                         └──────────────────────────┘
//! ```

pub mod clock;
pub mod fan;
pub mod pump;
pub mod relay;

use heapless::Vec;

use crate::app::ports::RelayOutputPort;
use crate::error::RelayError;
use crate::pins::RELAY_TABLE;
use fan::{FanCycleTimer, FanTransition};
use pump::{PumpKind, PumpStart, PumpStop, PumpTimer};
use relay::RelayBank;

/// Asynchronous status produced by a timer during [`ActuationState::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    Fan(FanTransition),
    PumpStopped(PumpKind, PumpStop),
}

/// At most one event per timer per tick.
pub type TimerEvents = Vec<TimerEvent, 3>;

pub struct ActuationState {
    relays: RelayBank,
    ec_pump: PumpTimer,
    ph_pump: PumpTimer,
    fan: FanCycleTimer,
}

impl Default for ActuationState {
    fn default() -> Self {
        Self::new(RelayBank::new(&RELAY_TABLE))
    }
}

impl ActuationState {
    /// All timers start idle.  Call [`init`](Self::init) before the loop.
    pub fn new(relays: RelayBank) -> Self {
        Self {
            relays,
            ec_pump: PumpTimer::new(PumpKind::Ec),
            ph_pump: PumpTimer::new(PumpKind::Ph),
            fan: FanCycleTimer::new(),
        }
    }

    pub fn init(&mut self, out: &mut impl RelayOutputPort) {
        self.relays.init(out);
    }

    pub fn relays(&self) -> &RelayBank {
        &self.relays
    }

    pub fn relays_mut(&mut self) -> &mut RelayBank {
        &mut self.relays
    }

    pub fn pump(&self, kind: PumpKind) -> &PumpTimer {
        match kind {
            PumpKind::Ec => &self.ec_pump,
            PumpKind::Ph => &self.ph_pump,
        }
    }

    pub fn fan(&self) -> &FanCycleTimer {
        &self.fan
    }

    pub fn start_pump(
        &mut self,
        kind: PumpKind,
        duration_ms: u32,
        now: u32,
        out: &mut impl RelayOutputPort,
    ) -> PumpStart {
        let pump = match kind {
            PumpKind::Ec => &mut self.ec_pump,
            PumpKind::Ph => &mut self.ph_pump,
        };
        pump.start(duration_ms, now, &mut self.relays, out)
    }

    pub fn start_fan(
        &mut self,
        on_ms: u32,
        off_ms: u32,
        channel: usize,
        now: u32,
    ) -> Result<(), RelayError> {
        self.fan.start(on_ms, off_ms, channel, now, &self.relays)
    }

    /// Poll every timer once.  Fan first, then EC, then pH.
    pub fn tick(&mut self, now: u32, out: &mut impl RelayOutputPort) -> TimerEvents {
        let mut events = TimerEvents::new();
        // Capacity 3 matches the three timers; pushes cannot fail.
        if let Some(t) = self.fan.check(now, &mut self.relays, out) {
            let _ = events.push(TimerEvent::Fan(t));
        }
        for pump in [&mut self.ec_pump, &mut self.ph_pump] {
            if let Some(stop) = pump.check(now, &mut self.relays, out) {
                let _ = events.push(TimerEvent::PumpStopped(pump.kind(), stop));
            }
        }
        events
    }
}
