//! Relay output adapter over `embedded-hal` output pins.
//!
//! [`GpioRelayOutput`] implements [`RelayOutputPort`] for any pin type that
//! implements [`OutputPin`].  On the board the pins are
//! `esp_idf_hal::gpio::PinDriver`s built from [`RELAY_TABLE`]; in host
//! tests they are plain recorders.  Polarity is already resolved by the
//! relay bank, so this adapter only maps levels to `set_high`/`set_low`.
//!
//! [`RELAY_TABLE`]: crate::pins::RELAY_TABLE

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::actuation::relay::PinLevel;
use crate::app::ports::RelayOutputPort;
use crate::pins::RELAY_COUNT;

/// One output pin per relay channel, indexed by channel.
pub struct GpioRelayOutput<P: OutputPin> {
    pins: [P; RELAY_COUNT],
    write_failures: u32,
}

impl<P: OutputPin> GpioRelayOutput<P> {
    pub fn new(pins: [P; RELAY_COUNT]) -> Self {
        Self {
            pins,
            write_failures: 0,
        }
    }

    /// Pin writes the HAL reported as failed since boot.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }
}

impl<P: OutputPin> RelayOutputPort for GpioRelayOutput<P> {
    fn drive(&mut self, channel: usize, level: PinLevel) {
        let Some(pin) = self.pins.get_mut(channel) else {
            warn!("Relay: drive on unknown channel {channel}");
            return;
        };
        let res = match level {
            PinLevel::High => pin.set_high(),
            PinLevel::Low => pin.set_low(),
        };
        if let Err(e) = res {
            self.write_failures = self.write_failures.wrapping_add(1);
            warn!("Relay: K{} write failed: {e:?}", channel + 1);
        }
    }
}
