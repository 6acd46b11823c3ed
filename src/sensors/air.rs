//! Air-side probes: CO2 / temperature / humidity transmitter and the lux meter.

use log::{debug, warn};

use super::modbus::{FieldBus, RegisterKind};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AirReading {
    pub co2_ppm: u16,
    pub temp_c: f32,
    pub humidity_pct: f32,
}

/// Input registers 0..4: `[status, temp×10, humidity×10, co2]`.
pub fn decode_air(regs: [u16; 4]) -> AirReading {
    AirReading {
        temp_c: f32::from(regs[1]) / 10.0,
        humidity_pct: f32::from(regs[2]) / 10.0,
        co2_ppm: regs[3],
    }
}

/// Input registers 1..3: `[lux low word, lux high word]`.
pub fn decode_lux(regs: [u16; 2]) -> u32 {
    (u32::from(regs[1]) << 16) | u32::from(regs[0])
}

pub struct AirProbe {
    slave: u8,
}

impl AirProbe {
    pub fn new(slave: u8) -> Self {
        Self { slave }
    }

    /// All zeros when the transmitter does not answer.
    pub fn read(&self, bus: &mut impl FieldBus) -> AirReading {
        let mut regs = [0u16; 4];
        match bus.read_registers(self.slave, RegisterKind::Input, 0, &mut regs) {
            Ok(()) => {
                let r = decode_air(regs);
                debug!(
                    "Air: {:.1} °C, {:.1} %RH, {} ppm CO2",
                    r.temp_c, r.humidity_pct, r.co2_ppm
                );
                r
            }
            Err(e) => {
                warn!("CO2 probe (id {}): {e}", self.slave);
                AirReading::default()
            }
        }
    }
}

/// Lux meter.  Holds its last good value across bus failures.
pub struct LightProbe {
    slave: u8,
    last_lux: u32,
}

impl LightProbe {
    pub fn new(slave: u8) -> Self {
        Self { slave, last_lux: 0 }
    }

    pub fn read(&mut self, bus: &mut impl FieldBus) -> u32 {
        let mut regs = [0u16; 2];
        match bus.read_registers(self.slave, RegisterKind::Input, 1, &mut regs) {
            Ok(()) => self.last_lux = decode_lux(regs),
            Err(e) => warn!("Light probe (id {}): {e}", self.slave),
        }
        self.last_lux
    }
}
