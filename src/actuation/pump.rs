//! One-shot dosing pump timer (EC or pH).
//!
//! `Idle → Running → Idle`.  While running the timer owns its relay channel
//! and keeps it On; expiry is polled once per loop iteration against the
//! wrap-safe elapsed time, never against a coarser tick.

use log::{info, warn};

use super::clock::{TimingReport, elapsed_since};
use super::relay::{RelayBank, RelayState};
use crate::app::ports::RelayOutputPort;
use crate::pins::{EC_PUMP_CHANNEL, PH_PUMP_CHANNEL};

/// Which dosing pump a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpKind {
    Ec,
    Ph,
}

impl PumpKind {
    /// Relay channel owned while the timer runs.
    pub const fn channel(self) -> usize {
        match self {
            Self::Ec => EC_PUMP_CHANNEL,
            Self::Ph => PH_PUMP_CHANNEL,
        }
    }

    /// Prefix used on the upstream wire (`EC_PUMP_...`, `PH_PUMP_...`).
    pub const fn wire_prefix(self) -> &'static str {
        match self {
            Self::Ec => "EC_PUMP",
            Self::Ph => "PH_PUMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Running { started_at: u32, target_ms: u32 },
}

/// How a pump run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpStop {
    /// Explicit cancel (zero duration).  Reported as a perfect zero-length run.
    Cancelled,
    /// Target duration reached.
    Completed(TimingReport),
}

impl PumpStop {
    pub fn report(&self) -> TimingReport {
        match self {
            Self::Cancelled => TimingReport::measure(0, 0),
            Self::Completed(r) => *r,
        }
    }
}

/// Result of [`PumpTimer::start`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpStart {
    Started { target_ms: u32 },
    Stopped(PumpStop),
}

pub struct PumpTimer {
    kind: PumpKind,
    running: bool,
    start_ms: u32,
    target_ms: u32,
}

impl PumpTimer {
    pub fn new(kind: PumpKind) -> Self {
        Self {
            kind,
            running: false,
            start_ms: 0,
            target_ms: 0,
        }
    }

    pub fn kind(&self) -> PumpKind {
        self.kind
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> PumpState {
        if self.running {
            PumpState::Running {
                started_at: self.start_ms,
                target_ms: self.target_ms,
            }
        } else {
            PumpState::Idle
        }
    }

    /// Start a dose of `duration_ms`.  Zero is an immediate cancel.
    ///
    /// Restarting a running pump re-arms it from `now` with the new target.
    pub fn start(
        &mut self,
        duration_ms: u32,
        now: u32,
        relays: &mut RelayBank,
        out: &mut impl RelayOutputPort,
    ) -> PumpStart {
        if duration_ms == 0 {
            return PumpStart::Stopped(self.stop(relays, out));
        }
        self.start_ms = now;
        self.target_ms = duration_ms;
        self.running = true;
        self.drive(RelayState::On, relays, out);
        info!(
            "{:?} pump: started, target {} ms at t={} (K{} ON)",
            self.kind,
            duration_ms,
            now,
            self.kind.channel() + 1
        );
        PumpStart::Started {
            target_ms: duration_ms,
        }
    }

    /// Explicit cancel.  Always reports zero elapsed, 100 % accuracy.
    pub fn stop(&mut self, relays: &mut RelayBank, out: &mut impl RelayOutputPort) -> PumpStop {
        self.running = false;
        self.start_ms = 0;
        self.target_ms = 0;
        self.drive(RelayState::Off, relays, out);
        info!("{:?} pump: stopped immediately (K{} OFF)", self.kind, self.kind.channel() + 1);
        PumpStop::Cancelled
    }

    /// Per-iteration expiry check.  Returns the completion once, on the
    /// iteration where the target is reached.
    pub fn check(
        &mut self,
        now: u32,
        relays: &mut RelayBank,
        out: &mut impl RelayOutputPort,
    ) -> Option<PumpStop> {
        if !self.running {
            return None;
        }
        let elapsed = elapsed_since(self.start_ms, now);
        if elapsed < self.target_ms {
            return None;
        }
        self.drive(RelayState::Off, relays, out);
        self.running = false;

        let report = TimingReport::measure(elapsed, self.target_ms);
        info!(
            "{:?} pump: stop after {} ms (target {} ms, error {} ms, accuracy {:.2}%)",
            self.kind, report.elapsed_ms, report.target_ms, report.error_ms, report.accuracy_pct
        );
        if report.error_ms > 10 {
            warn!("{:?} pump: timing error above 10 ms", self.kind);
        }
        Some(PumpStop::Completed(report))
    }

    fn drive(&self, state: RelayState, relays: &mut RelayBank, out: &mut impl RelayOutputPort) {
        if let Err(e) = relays.set_channel(self.kind.channel(), state, out) {
            warn!("{:?} pump: relay write refused: {e}", self.kind);
        }
    }
}
