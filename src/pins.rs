//! GPIO / peripheral pin assignments for the EnvNode main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Assignments are fixed at build time; there is
//! no runtime pin reconfiguration.

use crate::actuation::relay::Polarity;

// ---------------------------------------------------------------------------
// Relay bank (K1–K8)
// ---------------------------------------------------------------------------

/// Number of relay channels on the board.
pub const RELAY_COUNT: usize = 8;

/// Static description of one relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPin {
    pub gpio: i32,
    pub polarity: Polarity,
}

/// K1 drives the grow light through an active-high SSR; K2–K8 sit on an
/// opto-isolated active-low relay board.  Index = channel = `K<n>` − 1.
#[rustfmt::skip]
pub const RELAY_TABLE: [RelayPin; RELAY_COUNT] = [
    RelayPin { gpio: 4, polarity: Polarity::ActiveHigh },  // K1 light
    RelayPin { gpio: 5, polarity: Polarity::ActiveLow },   // K2
    RelayPin { gpio: 6, polarity: Polarity::ActiveLow },   // K3
    RelayPin { gpio: 7, polarity: Polarity::ActiveLow },   // K4
    RelayPin { gpio: 15, polarity: Polarity::ActiveLow },  // K5 internal fan
    RelayPin { gpio: 16, polarity: Polarity::ActiveLow },  // K6 pH pump
    RelayPin { gpio: 17, polarity: Polarity::ActiveLow },  // K7 EC pump
    RelayPin { gpio: 18, polarity: Polarity::ActiveLow },  // K8
];

/// Channel owned by the pH dosing pump while its timer runs (K6).
pub const PH_PUMP_CHANNEL: usize = 5;
/// Channel owned by the EC dosing pump while its timer runs (K7).
pub const EC_PUMP_CHANNEL: usize = 6;

// ---------------------------------------------------------------------------
// Flow meters (YF-S201 style, polled)
// ---------------------------------------------------------------------------

pub const FLOW_SENSOR_COUNT: usize = 3;
/// Pulse inputs with internal pull-up; a pulse pulls the line LOW.
pub const FLOW_PULSE_GPIOS: [i32; FLOW_SENSOR_COUNT] = [8, 9, 10];

// ---------------------------------------------------------------------------
// Water level
// ---------------------------------------------------------------------------

/// Digital level switch.  HIGH = water detected.
pub const WATER_LEVEL_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// RS-485 field bus (MAX485 transceiver)
// ---------------------------------------------------------------------------

/// Driver-enable, HIGH while transmitting.
pub const RS485_DE_GPIO: i32 = 12;
/// Receiver-enable (active LOW), driven together with DE.
pub const RS485_RE_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// UARTs
//
// UART0 carries the upstream protocol; log output goes to the USB-Serial-JTAG
// console so the two never interleave.
// ---------------------------------------------------------------------------

pub const UPSTREAM_UART: i32 = 0;
pub const UPSTREAM_TX_GPIO: i32 = 43;
pub const UPSTREAM_RX_GPIO: i32 = 44;

pub const FIELD_BUS_UART: i32 = 1;
pub const FIELD_BUS_TX_GPIO: i32 = 39;
pub const FIELD_BUS_RX_GPIO: i32 = 40;

/// PZEM-004T v3 AC meter (TTL Modbus).
pub const POWER_METER_UART: i32 = 2;
pub const POWER_METER_TX_GPIO: i32 = 1;
pub const POWER_METER_RX_GPIO: i32 = 2;
