//! Node configuration parameters
//!
//! All tunable timing and bus parameters for the EnvNode firmware.
//! Pin assignments and relay polarity are not here; they are compile-time
//! constants in `pins`.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sensors::water::EcRange;

/// Longest permitted bounded wait for the handshake reply.
pub const MAX_HANDSHAKE_TIMEOUT_MS: u32 = 1000;

/// Modbus slave addresses on the two buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveIds {
    pub co2: u8,
    pub light: u8,
    pub ec: u8,
    pub ph: u8,
    /// PZEM-004T general address.
    pub power_meter: u8,
}

impl Default for SlaveIds {
    fn default() -> Self {
        Self {
            co2: 1,
            light: 2,
            ec: 3,
            ph: 4,
            power_meter: 0xF8,
        }
    }
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Loop task intervals ---
    /// Field-bus probe poll interval (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// AC meter poll interval (milliseconds)
    pub ac_read_interval_ms: u32,
    /// Delay between AC meter reconnect probes (milliseconds)
    pub ac_reconnect_interval_ms: u32,
    /// `SENSOR_DATA` frame interval (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Upstream handshake re-probe interval (milliseconds)
    pub link_check_interval_ms: u32,

    // --- Handshake ---
    /// Bounded wait for the handshake reply (milliseconds, ≤ 1000)
    pub handshake_timeout_ms: u32,
    /// Sleep between handshake reads (milliseconds)
    pub handshake_poll_ms: u32,

    // --- Flow ---
    /// Flow measurement window (milliseconds)
    pub flow_window_ms: u32,
    /// Pulses per second at 1 L/min
    pub flow_pulses_per_lpm: f32,

    // --- Field bus ---
    /// EC transmitter range at boot
    pub ec_range: EcRange,
    /// Modbus response deadline (milliseconds)
    pub modbus_timeout_ms: u32,
    pub slave_ids: SlaveIds,

    // --- UART ---
    pub upstream_baud: u32,
    pub field_bus_baud: u32,
    pub power_meter_baud: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            sensor_read_interval_ms: 1000,
            ac_read_interval_ms: 1000,
            ac_reconnect_interval_ms: 10_000,
            telemetry_interval_ms: 2000,
            link_check_interval_ms: 30_000,

            handshake_timeout_ms: MAX_HANDSHAKE_TIMEOUT_MS,
            handshake_poll_ms: 10,

            flow_window_ms: 1000,
            flow_pulses_per_lpm: 7.5,

            ec_range: EcRange::Low4400,
            modbus_timeout_ms: 200,
            slave_ids: SlaveIds::default(),

            upstream_baud: 115_200,
            field_bus_baud: 9600,
            power_meter_baud: 9600,
        }
    }
}

impl NodeConfig {
    /// Reject values that would stall the loop or divide by zero.
    pub fn validate(&self) -> Result<(), Error> {
        let intervals = [
            self.sensor_read_interval_ms,
            self.ac_read_interval_ms,
            self.ac_reconnect_interval_ms,
            self.telemetry_interval_ms,
            self.link_check_interval_ms,
            self.flow_window_ms,
            self.modbus_timeout_ms,
        ];
        if intervals.contains(&0) {
            return Err(Error::Config("intervals must be non-zero"));
        }
        if self.handshake_timeout_ms == 0 || self.handshake_timeout_ms > MAX_HANDSHAKE_TIMEOUT_MS {
            return Err(Error::Config("handshake timeout must be 1..=1000 ms"));
        }
        if self.handshake_poll_ms == 0 {
            return Err(Error::Config("handshake poll step must be non-zero"));
        }
        if self.flow_pulses_per_lpm.is_nan() || self.flow_pulses_per_lpm <= 0.0 {
            return Err(Error::Config("flow calibration must be positive"));
        }
        if [self.upstream_baud, self.field_bus_baud, self.power_meter_baud].contains(&0) {
            return Err(Error::Config("baud rates must be non-zero"));
        }
        Ok(())
    }
}
