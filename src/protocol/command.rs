//! Tokenizing parser for upstream command lines.
//!
//! Each trimmed line becomes exactly one [`Command`].  Parsing is total:
//! any input yields either a command or a [`ProtocolError`] describing the
//! rejection reply, and nothing here touches relay or timer state.

use crate::actuation::pump::PumpKind;
use crate::actuation::relay::RelayPattern;
use crate::error::{ProtocolError, RelayError, Verb};
use crate::pins::RELAY_COUNT;
use crate::sensors::water::EcRange;

/// Liveness probe sent by either side.
pub const HANDSHAKE: &str = "MEGA_TEST";

/// Response tokens the upstream side may send back to us.  Never answered
/// with `UNKNOWN_COMMAND`, otherwise the two ends echo forever.
pub const ECHO_DENYLIST: [&str; 3] = ["INVALID_FORMAT", "UNKNOWN_COMMAND", "DATA_RECEIVED"];

/// Dosing solution named in a `PUMP_TIMING` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dose {
    Ec,
    PhAcid,
    PhBase,
}

impl Dose {
    pub const fn pump(self) -> PumpKind {
        match self {
            Self::Ec => PumpKind::Ec,
            Self::PhAcid | Self::PhBase => PumpKind::Ph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigToggle {
    EcRange(EcRange),
    ResetEnergy,
    ResetFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Handshake,
    FanTiming {
        channel: usize,
        on_ms: u32,
        off_ms: u32,
    },
    PumpTiming {
        dose: Dose,
        duration_ms: u32,
    },
    RelayPattern(RelayPattern),
    RelayStatus,
    Config(ConfigToggle),
    /// Not a command.  Carries the line for logging and echo suppression.
    Unknown(&'a str),
}

/// Parse one line.  Surrounding whitespace is ignored.
pub fn parse(line: &str) -> Result<Command<'_>, ProtocolError> {
    let line = line.trim();

    if line == HANDSHAKE {
        return Ok(Command::Handshake);
    }
    if line == "RELAY_STATUS" {
        return Ok(Command::RelayStatus);
    }
    if let Some(rest) = line.strip_prefix("FAN_TIMING:") {
        return parse_fan(rest);
    }
    if let Some(rest) = line.strip_prefix("PUMP_TIMING:") {
        return parse_pump(rest);
    }
    if let Some(rest) = line.strip_prefix("RELAY:") {
        return RelayPattern::parse(rest)
            .map(Command::RelayPattern)
            .map_err(|e| match e {
                RelayError::InvalidLength(_) => ProtocolError::InvalidLength(Verb::Relay),
                _ => ProtocolError::InvalidPattern(Verb::Relay),
            });
    }
    if let Some(rest) = line.strip_prefix("CONFIG:") {
        return parse_config(rest);
    }
    Ok(Command::Unknown(line))
}

/// `K<n>,<onSec>,<offSec>`
fn parse_fan(rest: &str) -> Result<Command<'_>, ProtocolError> {
    let mut fields = rest.splitn(3, ',');
    let (Some(relay), Some(on), Some(off)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(ProtocolError::InvalidFormat(Verb::FanTiming));
    };
    let relay = relay
        .strip_prefix('K')
        .ok_or(ProtocolError::InvalidFormat(Verb::FanTiming))?;
    let k = lenient_u32(relay) as usize;
    if k == 0 || k > RELAY_COUNT {
        return Err(ProtocolError::InvalidRelay(Verb::FanTiming));
    }
    Ok(Command::FanTiming {
        channel: k - 1,
        on_ms: lenient_u32(on).saturating_mul(1000),
        off_ms: lenient_u32(off).saturating_mul(1000),
    })
}

/// `EC,<ms>` | `PH_ACID,<ms>` | `PH_BASE,<ms>`
fn parse_pump(rest: &str) -> Result<Command<'_>, ProtocolError> {
    let (name, duration) = rest
        .split_once(',')
        .ok_or(ProtocolError::InvalidFormat(Verb::PumpTiming))?;
    let dose = match name {
        "EC" => Dose::Ec,
        "PH_ACID" => Dose::PhAcid,
        "PH_BASE" => Dose::PhBase,
        _ => return Err(ProtocolError::InvalidFormat(Verb::PumpTiming)),
    };
    Ok(Command::PumpTiming {
        dose,
        duration_ms: lenient_u32(duration),
    })
}

fn parse_config(rest: &str) -> Result<Command<'_>, ProtocolError> {
    let toggle = match rest {
        "EC_RANGE:4400" => ConfigToggle::EcRange(EcRange::Low4400),
        "EC_RANGE:44000" => ConfigToggle::EcRange(EcRange::High44000),
        "RESET_ENERGY" => ConfigToggle::ResetEnergy,
        "RESET_FLOW" => ConfigToggle::ResetFlow,
        _ => return Err(ProtocolError::UnknownOption(Verb::Config)),
    };
    Ok(Command::Config(toggle))
}

/// Leading ASCII digits as a saturating `u32`; anything else reads as 0.
///
/// A non-numeric duration therefore parses to zero, which the pump
/// commands treat as an explicit cancel.  The upstream controller relies
/// on zero-means-cancel and cannot distinguish the two cases.
pub fn lenient_u32(s: &str) -> u32 {
    s.trim_start()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(u32::from(d - b'0')))
}

/// `true` for tokens that must never trigger an `UNKNOWN_COMMAND` reply.
pub fn is_echo_token(line: &str) -> bool {
    ECHO_DENYLIST.contains(&line)
}
