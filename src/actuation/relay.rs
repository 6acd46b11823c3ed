//! Relay bank — eight logical channels with per-channel polarity.
//!
//! The bank is the only writer of relay outputs.  Physical writes go
//! through [`RelayOutputPort`] and are issued only when a channel's logical
//! state actually changes, except in [`RelayBank::init`], which forces every
//! output to its "off" level regardless of what the pin was doing at boot.

use core::fmt;
use core::str::FromStr;

use log::{debug, info};

use crate::app::ports::RelayOutputPort;
use crate::error::RelayError;
use crate::pins::{RELAY_COUNT, RelayPin};

/// Electrical level on a GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

/// Polarity convention of a relay input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// HIGH energises the relay.
    ActiveHigh,
    /// LOW energises the relay.
    ActiveLow,
}

impl Polarity {
    /// Pin level that realises `state` under this polarity.
    pub const fn level_for(self, state: RelayState) -> PinLevel {
        match (self, state) {
            (Self::ActiveHigh, RelayState::On) | (Self::ActiveLow, RelayState::Off) => PinLevel::High,
            (Self::ActiveHigh, RelayState::Off) | (Self::ActiveLow, RelayState::On) => PinLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for RelayState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

// ---------------------------------------------------------------------------
// Bulk pattern
// ---------------------------------------------------------------------------

/// Desired state of all eight channels.
///
/// Wire form is eight `'0'`/`'1'` characters, most significant first:
/// the first character is channel 0 (K1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayPattern(u8);

impl RelayPattern {
    pub const ALL_OFF: Self = Self(0);

    const fn mask(index: usize) -> u8 {
        0x80 >> index
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// State requested for `index`.  Panics if `index >= RELAY_COUNT`.
    pub const fn get(self, index: usize) -> RelayState {
        if self.0 & Self::mask(index) != 0 { RelayState::On } else { RelayState::Off }
    }

    /// Copy of this pattern with `index` set to `state`.
    #[must_use]
    pub const fn with(self, index: usize, state: RelayState) -> Self {
        match state {
            RelayState::On => Self(self.0 | Self::mask(index)),
            RelayState::Off => Self(self.0 & !Self::mask(index)),
        }
    }

    /// Validate a wire payload.  Nothing is applied on error.
    pub fn parse(s: &str) -> Result<Self, RelayError> {
        let bytes = s.as_bytes();
        if bytes.len() != RELAY_COUNT {
            return Err(RelayError::InvalidLength(bytes.len()));
        }
        let mut pattern = Self::ALL_OFF;
        for (position, b) in bytes.iter().enumerate() {
            match b {
                b'1' => pattern = pattern.with(position, RelayState::On),
                b'0' => {}
                _ => return Err(RelayError::InvalidBit { position }),
            }
        }
        Ok(pattern)
    }
}

impl FromStr for RelayPattern {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RelayPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..RELAY_COUNT {
            f.write_str(if self.get(i).is_on() { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RelayChannel {
    pub index: usize,
    pub gpio: i32,
    pub polarity: Polarity,
    state: RelayState,
}

impl RelayChannel {
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Pin level currently driven (pure function of state and polarity).
    pub fn level(&self) -> PinLevel {
        self.polarity.level_for(self.state)
    }
}

/// Owner of all eight relay channels.
pub struct RelayBank {
    channels: [RelayChannel; RELAY_COUNT],
}

impl RelayBank {
    pub fn new(table: &[RelayPin; RELAY_COUNT]) -> Self {
        Self {
            channels: core::array::from_fn(|index| RelayChannel {
                index,
                gpio: table[index].gpio,
                polarity: table[index].polarity,
                state: RelayState::Off,
            }),
        }
    }

    /// Force every output to its off level.  Writes all channels.
    pub fn init(&mut self, out: &mut impl RelayOutputPort) {
        for ch in &mut self.channels {
            ch.state = RelayState::Off;
            out.drive(ch.index, ch.level());
            debug!("Relay K{} (GPIO {}) = OFF ({:?})", ch.index + 1, ch.gpio, ch.polarity);
        }
        info!("Relay bank initialised, all {} channels off", RELAY_COUNT);
    }

    /// Set one channel.  Returns `true` if a hardware write was issued.
    pub fn set_channel(
        &mut self,
        index: usize,
        desired: RelayState,
        out: &mut impl RelayOutputPort,
    ) -> Result<bool, RelayError> {
        let ch = self
            .channels
            .get_mut(index)
            .ok_or(RelayError::InvalidChannel(index))?;
        if ch.state == desired {
            return Ok(false);
        }
        ch.state = desired;
        out.drive(index, ch.level());
        info!(
            "Relay K{} (GPIO {}) = {} ({:?})",
            index + 1,
            ch.gpio,
            if desired.is_on() { "ON" } else { "OFF" },
            ch.polarity
        );
        Ok(true)
    }

    /// Apply a bulk pattern, touching only channels whose state differs.
    /// Returns the mask (pattern bit order) of channels that changed.
    pub fn apply_pattern(&mut self, pattern: RelayPattern, out: &mut impl RelayOutputPort) -> u8 {
        let mut changed = RelayPattern::ALL_OFF;
        for index in 0..RELAY_COUNT {
            let desired = pattern.get(index);
            if self.channels[index].state != desired {
                // Index is always in range here.
                if let Ok(true) = self.set_channel(index, desired, out) {
                    changed = changed.with(index, RelayState::On);
                }
            }
        }
        changed.bits()
    }

    /// Current logical states.
    pub fn snapshot(&self) -> RelayPattern {
        self.channels
            .iter()
            .fold(RelayPattern::ALL_OFF, |p, ch| p.with(ch.index, ch.state))
    }

    pub fn state(&self, index: usize) -> Option<RelayState> {
        self.channels.get(index).map(RelayChannel::state)
    }

    pub fn channel(&self, index: usize) -> Option<&RelayChannel> {
        self.channels.get(index)
    }
}
