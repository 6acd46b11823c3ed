//! Nutrient-solution probes: conductivity (EC) and pH / water temperature.
//!
//! Both sit on the RS-485 bus and expose holding registers.  Raw values
//! are tenths; tiny raw values mean "probe not immersed / no reading".

use log::{debug, warn};

use super::modbus::{FieldBus, RegisterKind};
use crate::error::FieldBusError;

/// Least-squares fit of the EC probe against reference solutions.
pub const EC_SLOPE: f32 = 15.968;
pub const EC_INTERCEPT: f32 = -53.913;
/// Output clamp for the calibrated value, µS/cm.
pub const EC_MAX_US_CM: f32 = 5000.0;

/// Measurement range jumper on the EC transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum EcRange {
    /// 0–4400 µS/cm; registers are scaled ×10.
    #[default]
    Low4400,
    /// 0–44000 µS/cm; registers are unscaled.
    High44000,
}

impl EcRange {
    const fn divisor(self) -> f32 {
        match self {
            Self::Low4400 => 10.0,
            Self::High44000 => 1.0,
        }
    }
}

/// Apply the probe calibration line, clamped to `0..=EC_MAX_US_CM`.
pub fn calibrate_ec(raw: f32) -> f32 {
    (EC_SLOPE * raw + EC_INTERCEPT).clamp(0.0, EC_MAX_US_CM)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EcReading {
    /// Transmitter's own calibration register, range-scaled.
    pub calibration: f32,
    pub ec_us_cm: f32,
}

/// Decode holding registers `[calibration, value]`.
pub fn decode_ec(regs: [u16; 2], range: EcRange) -> EcReading {
    let [cal_raw, value_raw] = regs;
    if value_raw <= 1 {
        return EcReading::default();
    }
    let div = range.divisor();
    let raw = f32::from(value_raw) / div;
    EcReading {
        calibration: f32::from(cal_raw) / div,
        ec_us_cm: calibrate_ec(raw),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhReading {
    pub ph: f32,
    pub water_temp_c: f32,
}

/// Decode holding registers `[water temp, pH, device id]`.
pub fn decode_ph(regs: [u16; 3]) -> PhReading {
    let tenths = |raw: u16| if raw > 10 { f32::from(raw) / 10.0 } else { 0.0 };
    PhReading {
        water_temp_c: tenths(regs[0]),
        ph: tenths(regs[1]),
    }
}

pub struct EcProbe {
    slave: u8,
    range: EcRange,
}

impl EcProbe {
    pub fn new(slave: u8, range: EcRange) -> Self {
        Self { slave, range }
    }

    pub fn range(&self) -> EcRange {
        self.range
    }

    pub fn set_range(&mut self, range: EcRange) {
        self.range = range;
    }

    /// Zero on any bus failure.
    pub fn read(&self, bus: &mut impl FieldBus) -> EcReading {
        let mut regs = [0u16; 2];
        match bus.read_registers(self.slave, RegisterKind::Holding, 0, &mut regs) {
            Ok(()) => {
                let r = decode_ec(regs, self.range);
                debug!("EC: raw {regs:?} ({:?}) → {:.2} µS/cm", self.range, r.ec_us_cm);
                r
            }
            Err(e) => {
                warn!("EC probe (id {}): {e}", self.slave);
                EcReading::default()
            }
        }
    }
}

pub struct PhProbe {
    slave: u8,
}

impl PhProbe {
    pub fn new(slave: u8) -> Self {
        Self { slave }
    }

    pub fn read(&self, bus: &mut impl FieldBus) -> Result<PhReading, FieldBusError> {
        let mut regs = [0u16; 3];
        bus.read_registers(self.slave, RegisterKind::Holding, 0, &mut regs)
            .map(|()| decode_ph(regs))
            .inspect_err(|e| warn!("pH probe (id {}): {e}", self.slave))
    }
}
