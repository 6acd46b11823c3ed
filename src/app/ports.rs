//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService / ActuationState (domain)
//! ```
//!
//! Driven adapters (relay pins, UART link, sensor hub, clock, event sinks)
//! implement these traits.  The domain consumes them via generics injected
//! at call sites, so the core never touches hardware directly and runs
//! unmodified against the mocks in `tests/`.

use crate::actuation::relay::PinLevel;
use crate::protocol::line::Line;
use crate::sensors::water::EcRange;
use crate::telemetry::{AcReadings, EnvironmentReadings, FlowReadings};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Free-running millisecond counter.
pub trait Clock {
    /// Milliseconds since boot, wrapping at 2^32.
    fn now_ms(&self) -> u32;

    /// Block the caller for roughly `ms` milliseconds.  Only used by
    /// bounded waits (handshake probe, Modbus response window).
    fn delay_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Relay output port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Physical relay outputs.  Called only by
/// [`RelayBank`](crate::actuation::relay::RelayBank), which decides
/// when a write is actually needed.
pub trait RelayOutputPort {
    fn drive(&mut self, channel: usize, level: PinLevel);
}

// ───────────────────────────────────────────────────────────────
// Upstream link (domain ↔ supervisory controller)
// ───────────────────────────────────────────────────────────────

/// Newline-delimited ASCII link to the upstream controller.
pub trait UpstreamLink {
    /// Next complete, trimmed line if one has arrived.  Never blocks.
    fn read_line(&mut self) -> Option<Line>;

    /// Send one line; the terminator is appended by the link.
    fn write_line(&mut self, line: &str);

    /// Drop any buffered, unread input.
    fn discard_input(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Producers of numeric readings.  The actuation core never consults these.
pub trait SensorPort {
    /// Poll every field-bus probe and the water-level switch.
    fn read_environment(&mut self) -> EnvironmentReadings;

    /// Sample flow pulse inputs.  Called every loop iteration; returns fresh
    /// rates when a measurement window closes.
    fn sample_flow(&mut self, now_ms: u32) -> Option<FlowReadings>;

    /// Read the AC meter.  `None` while the meter is disconnected; the
    /// implementation handles its own reconnect backoff.
    fn read_power(&mut self, now_ms: u32) -> Option<AcReadings>;
}

/// Configuration toggles reachable from the `CONFIG:` command.
pub trait SensorControlPort {
    fn set_ec_range(&mut self, range: EcRange);

    /// Returns `false` if the meter did not acknowledge.
    fn reset_energy(&mut self) -> bool;

    fn reset_flow_totals(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
