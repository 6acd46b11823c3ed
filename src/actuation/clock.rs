//! Wraparound-safe arithmetic over the free-running millisecond counter.
//!
//! The platform counter is a `u32` that wraps every 2^32 ms (~49.7 days).
//! Every timer comparison in the firmware goes through [`elapsed_since`];
//! plain subtraction would panic in debug builds once the counter wraps.

/// Ticks elapsed from `start` to `now`, correct across one wraparound.
#[inline]
pub const fn elapsed_since(start: u32, now: u32) -> u32 {
    if now >= start {
        now - start
    } else {
        (u32::MAX - start) + now + 1
    }
}

/// Accuracy / error metrics comparing an actual interval against its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingReport {
    pub elapsed_ms: u32,
    pub target_ms: u32,
    /// `|elapsed − target|`.
    pub error_ms: u32,
    /// `100 − error × 100 / target`.  Can go negative for a very late check.
    pub accuracy_pct: f32,
}

impl TimingReport {
    pub fn measure(elapsed_ms: u32, target_ms: u32) -> Self {
        let error_ms = elapsed_ms.abs_diff(target_ms);
        // A zero target can only come from a zero-length fan phase.
        let accuracy_pct = if target_ms == 0 {
            if error_ms == 0 { 100.0 } else { 0.0 }
        } else {
            100.0 - (error_ms as f32 * 100.0 / target_ms as f32)
        };
        Self {
            elapsed_ms,
            target_ms,
            error_ms,
            accuracy_pct,
        }
    }
}
