//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) and the protocol
//! handler emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them; on the
//! board they go to the log console.

use crate::actuation::TimerEvent;
use crate::actuation::relay::RelayPattern;
use crate::error::ProtocolError;
use crate::telemetry::SensorReadings;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service finished start-up; all relays are off.
    Started,

    /// Handshake probe result differs from the previous one.
    LinkHealthChanged { healthy: bool },

    /// An upstream line was rejected before touching any state.
    CommandRejected(ProtocolError),

    /// An upstream line matched no command and was not an echo token.
    UnknownCommand,

    /// A bulk relay pattern was applied.
    PatternApplied {
        requested: RelayPattern,
        applied: RelayPattern,
        /// Bits forced On because a running pump owns the channel.
        overridden: u8,
        /// Channels whose state actually changed.
        changed: u8,
    },

    /// A pump or fan timer produced a status push.
    Timer(TimerEvent),

    /// A `SENSOR_DATA` frame was sent.
    Telemetry(SensorReadings),
}
