//! Unified error types for the EnvNode firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! entry point's error handling uniform.  All variants are `Copy` so they
//! can be passed through the control loop without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An upstream line was rejected.
    Protocol(ProtocolError),
    /// A relay operation was refused.
    Relay(RelayError),
    /// A field-bus (Modbus RTU) transaction failed.
    FieldBus(FieldBusError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Relay(e) => write!(f, "relay: {e}"),
            Self::FieldBus(e) => write!(f, "field bus: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Channel index outside `0..RELAY_COUNT`.
    InvalidChannel(usize),
    /// Bulk pattern was not exactly eight characters long.
    InvalidLength(usize),
    /// Bulk pattern contained something other than `'0'` / `'1'`.
    InvalidBit { position: usize },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(i) => write!(f, "invalid channel {i}"),
            Self::InvalidLength(n) => write!(f, "pattern length {n}, expected 8"),
            Self::InvalidBit { position } => write!(f, "invalid bit at position {position}"),
        }
    }
}

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Command verbs that can be rejected with an explicit `<VERB>_ERROR` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    FanTiming,
    PumpTiming,
    Relay,
    Config,
}

impl Verb {
    /// Upstream wire name of the verb.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::FanTiming => "FAN_TIMING",
            Self::PumpTiming => "PUMP_TIMING",
            Self::Relay => "RELAY",
            Self::Config => "CONFIG",
        }
    }
}

/// Why an upstream line was rejected.  Rejections never touch relay or
/// timer state; validation always runs before mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fields missing or in the wrong shape.
    InvalidFormat(Verb),
    /// Relay designator outside `K1..=K8`.
    InvalidRelay(Verb),
    /// Payload has the wrong length.
    InvalidLength(Verb),
    /// Payload contains characters other than `'0'` / `'1'`.
    InvalidPattern(Verb),
    /// `CONFIG:` option not recognised.
    UnknownOption(Verb),
}

impl ProtocolError {
    pub const fn verb(self) -> Verb {
        match self {
            Self::InvalidFormat(v)
            | Self::InvalidRelay(v)
            | Self::InvalidLength(v)
            | Self::InvalidPattern(v)
            | Self::UnknownOption(v) => v,
        }
    }

    /// Reason token used after `<VERB>_ERROR:` on the wire.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::InvalidRelay(_) => "INVALID_RELAY",
            Self::InvalidLength(_) => "INVALID_LENGTH",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::UnknownOption(_) => "UNKNOWN_OPTION",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_ERROR:{}", self.verb().wire_name(), self.reason())
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Field-bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBusError {
    /// No complete response before the deadline.
    Timeout,
    /// Response CRC did not match.
    Crc,
    /// Slave answered with a Modbus exception code.
    Exception(u8),
    /// Response was well-formed but not the one requested.
    UnexpectedResponse,
    /// Underlying byte transport failed.
    Transport,
}

impl fmt::Display for FieldBusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "response timeout"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::Exception(code) => write!(f, "exception 0x{code:02X}"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
            Self::Transport => write!(f, "transport failure"),
        }
    }
}

impl From<FieldBusError> for Error {
    fn from(e: FieldBusError) -> Self {
        Self::FieldBus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
