//! PZEM-004T v3 AC energy meter on its own Modbus link.
//!
//! Input register map (all little-word-first for 32-bit values):
//! ```text
//!  0 voltage ×0.1 V     3-4 power ×0.1 W    7 frequency ×0.1 Hz
//!  1-2 current ×1 mA    5-6 energy ×1 Wh    8 power factor ×0.01
//! ```
//! The meter is optional hardware.  While it does not answer, reads are
//! skipped and a reconnect probe runs every `reconnect_ms`.

use log::{info, warn};

use super::modbus::{FieldBus, RegisterKind};
use crate::actuation::clock::elapsed_since;
use crate::telemetry::AcReadings;

/// Vendor function: zero the energy accumulator.
const FN_RESET_ENERGY: u8 = 0x42;
const REGISTER_COUNT: usize = 10;

fn word32(lo: u16, hi: u16) -> u32 {
    (u32::from(hi) << 16) | u32::from(lo)
}

pub fn decode_pzem(regs: &[u16; REGISTER_COUNT]) -> AcReadings {
    AcReadings {
        voltage_v: f32::from(regs[0]) / 10.0,
        current_a: word32(regs[1], regs[2]) as f32 / 1000.0,
        power_w: word32(regs[3], regs[4]) as f32 / 10.0,
        energy_kwh: word32(regs[5], regs[6]) as f32 / 1000.0,
        frequency_hz: f32::from(regs[7]) / 10.0,
        power_factor: f32::from(regs[8]) / 100.0,
    }
}

pub struct Pzem004t {
    address: u8,
    reconnect_ms: u32,
    connected: bool,
    last_attempt: u32,
}

impl Pzem004t {
    pub fn new(address: u8, reconnect_ms: u32) -> Self {
        Self {
            address,
            reconnect_ms,
            connected: false,
            last_attempt: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Probe the meter once.  Also called by [`read`](Self::read) on the
    /// reconnect schedule.
    pub fn connect(&mut self, now: u32, bus: &mut impl FieldBus) -> bool {
        self.last_attempt = now;
        let mut regs = [0u16; 1];
        self.connected = bus
            .read_registers(self.address, RegisterKind::Input, 0, &mut regs)
            .is_ok();
        if self.connected {
            info!("AC meter: connected, {:.1} V", f32::from(regs[0]) / 10.0);
        } else {
            warn!("AC meter: no response from 0x{:02X}", self.address);
        }
        self.connected
    }

    /// Full measurement set, or `None` while disconnected.
    pub fn read(&mut self, now: u32, bus: &mut impl FieldBus) -> Option<AcReadings> {
        if !self.connected {
            if elapsed_since(self.last_attempt, now) >= self.reconnect_ms {
                self.connect(now, bus);
            }
            return None;
        }
        let mut regs = [0u16; REGISTER_COUNT];
        match bus.read_registers(self.address, RegisterKind::Input, 0, &mut regs) {
            Ok(()) => Some(decode_pzem(&regs)),
            Err(e) => {
                warn!("AC meter: read failed ({e}), marking disconnected");
                self.connected = false;
                self.last_attempt = now;
                None
            }
        }
    }

    pub fn reset_energy(&mut self, bus: &mut impl FieldBus) -> bool {
        match bus.command(self.address, FN_RESET_ENERGY) {
            Ok(()) => {
                info!("AC meter: energy counter reset");
                true
            }
            Err(e) => {
                warn!("AC meter: energy reset failed ({e})");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldBusError;

    /// Bus that answers with fixed registers, or not at all.
    struct FakeMeter {
        regs: Option<[u16; REGISTER_COUNT]>,
        reads: u32,
    }

    impl FieldBus for FakeMeter {
        fn read_registers(
            &mut self,
            _slave: u8,
            _kind: RegisterKind,
            start: u16,
            out: &mut [u16],
        ) -> Result<(), FieldBusError> {
            self.reads += 1;
            let regs = self.regs.ok_or(FieldBusError::Timeout)?;
            let start = start as usize;
            out.copy_from_slice(&regs[start..start + out.len()]);
            Ok(())
        }

        fn command(&mut self, _slave: u8, _function: u8) -> Result<(), FieldBusError> {
            self.regs.map(|_| ()).ok_or(FieldBusError::Timeout)
        }
    }

    const LIVE: [u16; REGISTER_COUNT] = [2301, 512, 0, 1178, 0, 0x86A0, 0x0001, 500, 98, 0];

    #[test]
    fn decodes_register_block() {
        let r = decode_pzem(&LIVE);
        assert!((r.voltage_v - 230.1).abs() < 1e-3);
        assert!((r.current_a - 0.512).abs() < 1e-6);
        assert!((r.power_w - 117.8).abs() < 1e-3);
        assert!((r.energy_kwh - 100.0).abs() < 1e-3);
        assert!((r.frequency_hz - 50.0).abs() < 1e-6);
        assert!((r.power_factor - 0.98).abs() < 1e-6);
    }

    #[test]
    fn reconnects_on_backoff_schedule() {
        let mut bus = FakeMeter { regs: None, reads: 0 };
        let mut meter = Pzem004t::new(0xF8, 10_000);
        assert!(!meter.connect(0, &mut bus));

        assert_eq!(meter.read(5_000, &mut bus), None);
        assert_eq!(bus.reads, 1, "no probe before the backoff elapses");

        bus.regs = Some(LIVE);
        assert_eq!(meter.read(10_000, &mut bus), None);
        assert!(meter.is_connected());
        assert!(meter.read(11_000, &mut bus).is_some());
    }

    #[test]
    fn read_failure_marks_disconnected() {
        let mut bus = FakeMeter { regs: Some(LIVE), reads: 0 };
        let mut meter = Pzem004t::new(0xF8, 10_000);
        assert!(meter.connect(0, &mut bus));
        bus.regs = None;
        assert_eq!(meter.read(1_000, &mut bus), None);
        assert!(!meter.is_connected());
        assert!(!meter.reset_energy(&mut bus));
    }
}
