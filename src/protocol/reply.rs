//! Wire rendering of replies and asynchronous status pushes.
//!
//! Every outbound protocol line is a value of [`Reply`]; its `Display`
//! impl is the only place wire text is produced.

use core::fmt;

use super::command::ConfigToggle;
use crate::actuation::TimerEvent;
use crate::actuation::fan::FanPhase;
use crate::actuation::pump::{PumpKind, PumpStop};
use crate::actuation::relay::RelayPattern;
use crate::error::ProtocolError;
use crate::sensors::water::EcRange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    /// Answer to the liveness probe.
    HandshakeOk,
    FanTimingOk,
    PumpTimingOk(PumpKind),
    /// Completion or cancel of a pump run.  Sent both as the reply to a
    /// zero-duration `PUMP_TIMING` and as an asynchronous push.
    PumpStopped(PumpKind, PumpStop),
    /// Fan entered a new phase (push only).
    FanCycleState(crate::actuation::fan::FanTransition),
    RelayOk,
    RelayStatus(RelayPattern),
    ConfigOk(ConfigToggle),
    Rejected(ProtocolError),
    UnknownCommand,
}

impl From<TimerEvent> for Reply {
    fn from(ev: TimerEvent) -> Self {
        match ev {
            TimerEvent::Fan(t) => Self::FanCycleState(t),
            TimerEvent::PumpStopped(kind, stop) => Self::PumpStopped(kind, stop),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandshakeOk => f.write_str("MEGA_OK"),
            Self::FanTimingOk => f.write_str("FAN_TIMING_OK"),
            Self::PumpTimingOk(kind) => write!(f, "{}_TIMING_OK", kind.wire_prefix()),
            Self::PumpStopped(kind, PumpStop::Cancelled) => {
                write!(f, "{}_STOPPED:0,0,100.0,0", kind.wire_prefix())
            }
            Self::PumpStopped(kind, PumpStop::Completed(r)) => write!(
                f,
                "{}_STOPPED:{},{},{:.2},{}",
                kind.wire_prefix(),
                r.elapsed_ms,
                r.target_ms,
                r.accuracy_pct,
                r.error_ms
            ),
            Self::FanCycleState(t) => write!(
                f,
                "FAN_CYCLE_STATE:{},{},{:.2}",
                match t.phase {
                    FanPhase::OnPeriod => "ON",
                    FanPhase::OffPeriod => "OFF",
                },
                t.report.elapsed_ms,
                t.report.accuracy_pct
            ),
            Self::RelayOk => f.write_str("RELAY_OK"),
            Self::RelayStatus(p) => write!(f, "RELAY_STATUS:{p}"),
            Self::ConfigOk(toggle) => f.write_str(match toggle {
                ConfigToggle::EcRange(EcRange::Low4400) => "CONFIG_OK:EC_RANGE_4400",
                ConfigToggle::EcRange(EcRange::High44000) => "CONFIG_OK:EC_RANGE_44000",
                ConfigToggle::ResetEnergy => "CONFIG_OK:ENERGY_RESET",
                ConfigToggle::ResetFlow => "CONFIG_OK:FLOW_RESET",
            }),
            Self::Rejected(e) => write!(f, "{e}"),
            Self::UnknownCommand => f.write_str("UNKNOWN_COMMAND"),
        }
    }
}
