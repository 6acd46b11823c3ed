//! Fixed-interval task gates for the cooperative main loop.
//!
//! ```text
//! ┌────────────────────────── one loop iteration ──────────────────────────┐
//! │ link check │ env poll │ flow sample │ AC poll │ telemetry │ cmd │ timers │
//! │  30 s gate │ 1 s gate │  every pass │ 1 s gate│  2 s gate │ all │  all   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Gates only decide *whether* a task runs this pass; they never block.
//! Actuation timers and command receive are deliberately ungated: they run
//! at full loop cadence for millisecond timing.

use crate::actuation::clock::elapsed_since;
use crate::config::NodeConfig;

// ═══════════════════════════════════════════════════════════════
//  Interval gate
// ═══════════════════════════════════════════════════════════════

/// Fires once every `interval_ms`, measured wrap-safe from the last fire.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    interval_ms: u32,
    last_ms: u32,
}

impl IntervalTimer {
    /// `epoch` is treated as the last fire, so the first fire comes one
    /// full interval later.
    pub const fn new(interval_ms: u32, epoch: u32) -> Self {
        Self {
            interval_ms,
            last_ms: epoch,
        }
    }

    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// `true` (and re-arm from `now`) once the interval has elapsed.
    pub fn is_due(&mut self, now: u32) -> bool {
        if elapsed_since(self.last_ms, now) >= self.interval_ms {
            self.last_ms = now;
            true
        } else {
            false
        }
    }

    /// Re-arm from `now` without firing.
    pub fn reset(&mut self, now: u32) {
        self.last_ms = now;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Loop schedule
// ═══════════════════════════════════════════════════════════════

/// Which gated tasks are due on this pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTasks {
    pub link_check: bool,
    pub environment: bool,
    pub power: bool,
    pub telemetry: bool,
}

/// The four interval gates of the main loop.
pub struct LoopSchedule {
    link_check: IntervalTimer,
    environment: IntervalTimer,
    power: IntervalTimer,
    telemetry: IntervalTimer,
}

impl LoopSchedule {
    pub fn new(config: &NodeConfig, now: u32) -> Self {
        Self {
            link_check: IntervalTimer::new(config.link_check_interval_ms, now),
            environment: IntervalTimer::new(config.sensor_read_interval_ms, now),
            power: IntervalTimer::new(config.ac_read_interval_ms, now),
            telemetry: IntervalTimer::new(config.telemetry_interval_ms, now),
        }
    }

    /// Evaluate every gate once.
    pub fn poll(&mut self, now: u32) -> DueTasks {
        DueTasks {
            link_check: self.link_check.is_due(now),
            environment: self.environment.is_due(now),
            power: self.power.is_due(now),
            telemetry: self.telemetry.is_due(now),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
