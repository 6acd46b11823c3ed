//! Hall-effect water flow meters (YF-S201 style), three channels.
//!
//! The pulse lines are sampled every loop iteration and a falling edge
//! counts as one pulse; no interrupts are involved, so the count is only
//! as good as the loop cadence.  Once a window of more than
//! `window_ms` has elapsed, rates are computed from the window's pulses
//! and added to the running volume.
//!
//! Datasheet: pulse frequency (Hz) = 7.5 × flow (L/min).

use log::info;

use crate::actuation::clock::elapsed_since;
use crate::actuation::relay::PinLevel;
use crate::pins::FLOW_SENSOR_COUNT;
use crate::telemetry::FlowReadings;

/// Pulses per second at 1 L/min.
pub const DEFAULT_PULSES_PER_LPM: f32 = 7.5;

pub struct FlowMeter {
    pulses_per_lpm: f32,
    window_ms: u32,
    window_start: u32,
    last_level: [PinLevel; FLOW_SENSOR_COUNT],
    pulses: [u32; FLOW_SENSOR_COUNT],
    readings: FlowReadings,
}

impl FlowMeter {
    /// `initial` is the pin state at boot, so a line already LOW is not
    /// counted as a pulse.
    pub fn new(
        pulses_per_lpm: f32,
        window_ms: u32,
        now: u32,
        initial: [PinLevel; FLOW_SENSOR_COUNT],
    ) -> Self {
        Self {
            pulses_per_lpm,
            window_ms,
            window_start: now,
            last_level: initial,
            pulses: [0; FLOW_SENSOR_COUNT],
            readings: FlowReadings::default(),
        }
    }

    /// Feed one sample of the pulse lines.  Returns fresh readings when a
    /// window closes.
    pub fn sample(&mut self, now: u32, levels: [PinLevel; FLOW_SENSOR_COUNT]) -> Option<FlowReadings> {
        for (i, level) in levels.into_iter().enumerate() {
            if level != self.last_level[i] && level == PinLevel::Low {
                self.pulses[i] = self.pulses[i].saturating_add(1);
            }
            self.last_level[i] = level;
        }

        if elapsed_since(self.window_start, now) <= self.window_ms {
            return None;
        }

        for i in 0..FLOW_SENSOR_COUNT {
            let rate = self.pulses[i] as f32 / self.pulses_per_lpm;
            self.readings.rate_lpm[i] = rate;
            self.readings.total_ml[i] += rate / 60.0 * 1000.0;
        }
        self.pulses = [0; FLOW_SENSOR_COUNT];
        self.window_start = now;

        let r = &self.readings.rate_lpm;
        if r.iter().any(|&v| v > 0.0) {
            info!("Flow: {:.1}, {:.1}, {:.1} L/min", r[0], r[1], r[2]);
        }
        Some(self.readings)
    }

    pub fn readings(&self) -> FlowReadings {
        self.readings
    }

    /// Zero the accumulated volumes.  Rates are left alone.
    pub fn reset_totals(&mut self) {
        self.readings.total_ml = [0.0; FLOW_SENSOR_COUNT];
        info!("Flow: totals reset");
    }
}
