//! GPIO digital inputs: flow pulse lines and the water-level switch.
//!
//! Polled, not interrupt driven.  The flow meter detects edges itself by
//! comparing consecutive samples, so this adapter only reports levels.

use crate::actuation::relay::PinLevel;
use crate::drivers::hw_init;
use crate::pins::{FLOW_PULSE_GPIOS, FLOW_SENSOR_COUNT, WATER_LEVEL_GPIO};
use crate::sensors::DigitalInputs;

/// Reads the pins configured by
/// [`hw_init::init_peripherals`](crate::drivers::hw_init::init_peripherals).
#[derive(Debug, Default, Clone, Copy)]
pub struct GpioInputs;

fn level(gpio: i32) -> PinLevel {
    if hw_init::gpio_read(gpio) { PinLevel::High } else { PinLevel::Low }
}

impl DigitalInputs for GpioInputs {
    fn water_level(&mut self) -> PinLevel {
        level(WATER_LEVEL_GPIO)
    }

    fn flow_levels(&mut self) -> [PinLevel; FLOW_SENSOR_COUNT] {
        FLOW_PULSE_GPIOS.map(level)
    }
}
