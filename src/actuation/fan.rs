//! Duty-cycled fan timer.
//!
//! `Idle → OffPeriod ⇄ OnPeriod`.  Once started the cycle has no terminal
//! state; a later `start` simply re-initialises it, possibly on another
//! channel.  The previously driven channel is left as it was.  Starting
//! records the cycle only; the pin is first driven on the Off → On flip.

use log::{info, warn};

use super::clock::{TimingReport, elapsed_since};
use super::relay::{RelayBank, RelayState};
use crate::app::ports::RelayOutputPort;
use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanPhase {
    OffPeriod,
    OnPeriod,
}

impl FanPhase {
    pub const fn relay_state(self) -> RelayState {
        match self {
            Self::OnPeriod => RelayState::On,
            Self::OffPeriod => RelayState::Off,
        }
    }

    const fn flipped(self) -> Self {
        match self {
            Self::OnPeriod => Self::OffPeriod,
            Self::OffPeriod => Self::OnPeriod,
        }
    }
}

/// Emitted when the cycle enters a new phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanTransition {
    /// Phase just entered.
    pub phase: FanPhase,
    /// Measured against the phase just left.
    pub report: TimingReport,
}

#[derive(Debug, Clone, Copy)]
struct Cycle {
    channel: usize,
    on_ms: u32,
    off_ms: u32,
    phase: FanPhase,
    phase_started: u32,
}

#[derive(Default)]
pub struct FanCycleTimer {
    cycle: Option<Cycle>,
}

impl FanCycleTimer {
    pub fn new() -> Self {
        Self { cycle: None }
    }

    pub fn is_active(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn phase(&self) -> Option<FanPhase> {
        self.cycle.map(|c| c.phase)
    }

    pub fn channel(&self) -> Option<usize> {
        self.cycle.map(|c| c.channel)
    }

    /// Begin (or restart) the cycle in its Off period.  The channel keeps
    /// its current level until the first flip.
    pub fn start(
        &mut self,
        on_ms: u32,
        off_ms: u32,
        channel: usize,
        now: u32,
        relays: &RelayBank,
    ) -> Result<(), RelayError> {
        if relays.state(channel).is_none() {
            return Err(RelayError::InvalidChannel(channel));
        }
        self.cycle = Some(Cycle {
            channel,
            on_ms,
            off_ms,
            phase: FanPhase::OffPeriod,
            phase_started: now,
        });
        info!(
            "Fan cycle: K{} on={} s off={} s, starting with OFF period",
            channel + 1,
            on_ms / 1000,
            off_ms / 1000
        );
        Ok(())
    }

    /// Per-iteration phase check.
    pub fn check(
        &mut self,
        now: u32,
        relays: &mut RelayBank,
        out: &mut impl RelayOutputPort,
    ) -> Option<FanTransition> {
        let cycle = self.cycle.as_mut()?;
        let elapsed = elapsed_since(cycle.phase_started, now);
        let interval = match cycle.phase {
            FanPhase::OnPeriod => cycle.on_ms,
            FanPhase::OffPeriod => cycle.off_ms,
        };
        if elapsed < interval {
            return None;
        }

        cycle.phase = cycle.phase.flipped();
        cycle.phase_started = now;
        if let Err(e) = relays.set_channel(cycle.channel, cycle.phase.relay_state(), out) {
            warn!("Fan cycle: relay write refused: {e}");
        }

        let report = TimingReport::measure(elapsed, interval);
        info!(
            "Fan cycle: {:?} after {} ms (target {} ms, accuracy {:.2}%)",
            cycle.phase, elapsed, interval, report.accuracy_pct
        );
        Some(FanTransition {
            phase: cycle.phase,
            report,
        })
    }
}
