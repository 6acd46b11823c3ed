//! Sensor hub over real Modbus RTU framing.
//!
//! A simulated RS-485 segment answers requests byte-for-byte, so these
//! tests run the whole stack: probe decoding, `ModbusMaster` framing and
//! CRC, and the hub's failure handling.

use std::collections::{HashMap, VecDeque};

use envnode::actuation::relay::PinLevel;
use envnode::app::ports::{Clock, SensorControlPort, SensorPort};
use envnode::config::NodeConfig;
use envnode::pins::FLOW_SENSOR_COUNT;
use envnode::protocol::Transport;
use envnode::sensors::modbus::{ModbusMaster, crc16};
use envnode::sensors::water::{self, EcRange};
use envnode::sensors::{DigitalInputs, SensorHub};

use crate::mock_hw::MockClock;

impl Clock for &MockClock {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms);
    }
}

// ── Simulated bus segment ─────────────────────────────────────

/// Slaves keyed by address, each with one register image shared by the
/// holding and input tables.
#[derive(Default)]
struct Segment {
    slaves: HashMap<u8, Vec<u16>>,
    tx: Vec<u8>,
    rx: VecDeque<u8>,
}

impl Segment {
    fn with(slaves: &[(u8, &[u16])]) -> Self {
        Self {
            slaves: slaves.iter().map(|(id, regs)| (*id, regs.to_vec())).collect(),
            ..Self::default()
        }
    }

    fn answer(&mut self, req: &[u8]) {
        let Some(regs) = self.slaves.get(&req[0]) else {
            return;
        };
        let mut resp = match req.len() {
            // Vendor command: echo.
            4 => req[..2].to_vec(),
            8 => {
                let start = usize::from(u16::from_be_bytes([req[2], req[3]]));
                let count = usize::from(u16::from_be_bytes([req[4], req[5]]));
                let mut r = vec![req[0], req[1], (2 * count) as u8];
                for reg in &regs[start..start + count] {
                    r.extend_from_slice(&reg.to_be_bytes());
                }
                r
            }
            _ => return,
        };
        let crc = crc16(&resp);
        resp.extend_from_slice(&crc.to_le_bytes());
        self.rx.extend(resp);
    }
}

impl Transport for Segment {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.rx.len());
        for b in buf.iter_mut().take(n) {
            *b = self.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        let req = std::mem::take(&mut self.tx);
        self.answer(&req);
        Ok(())
    }
}

struct Pins {
    water: PinLevel,
    flow: [PinLevel; FLOW_SENSOR_COUNT],
}

impl DigitalInputs for Pins {
    fn water_level(&mut self) -> PinLevel {
        self.water
    }
    fn flow_levels(&mut self) -> [PinLevel; FLOW_SENSOR_COUNT] {
        self.flow
    }
}

const CO2: (u8, &[u16]) = (1, &[0, 253, 612, 815]);
// Lux is low word first: 0x0001_1170 = 70 000.
const LIGHT: (u8, &[u16]) = (2, &[0, 0x1170, 1]);
const EC: (u8, &[u16]) = (3, &[120, 400]);
const PH: (u8, &[u16]) = (4, &[205, 61, 4]);
const PZEM: (u8, &[u16]) = (0xF8, &[2298, 1500, 0, 3450, 0, 12_500, 0, 500, 98, 0]);

type Hub<'c> = SensorHub<ModbusMaster<Segment, &'c MockClock>, ModbusMaster<Segment, &'c MockClock>, Pins>;

fn hub<'c>(clock: &'c MockClock, field: &[(u8, &[u16])], meter: &[(u8, &[u16])]) -> Hub<'c> {
    let config = NodeConfig::default();
    SensorHub::new(
        &config,
        ModbusMaster::new(Segment::with(field), clock, config.modbus_timeout_ms),
        ModbusMaster::new(Segment::with(meter), clock, config.modbus_timeout_ms),
        Pins {
            water: PinLevel::Low,
            flow: [PinLevel::High; FLOW_SENSOR_COUNT],
        },
        clock.now_ms(),
    )
}

#[test]
fn full_environment_poll() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[CO2, LIGHT, EC, PH], &[]);
    let env = h.read_environment();

    assert_eq!(env.co2_ppm, 815);
    assert!((env.air_temp_c - 25.3).abs() < 1e-4);
    assert!((env.air_humidity_pct - 61.2).abs() < 1e-4);
    assert_eq!(env.light_lux, 70_000);
    assert!((env.ec_us_cm - water::calibrate_ec(40.0)).abs() < 1e-3);
    assert!((env.ph - 6.1).abs() < 1e-4);
    assert!((env.water_temp_c - 20.5).abs() < 1e-4);
    assert!(!env.water_detected);
}

#[test]
fn missing_probes_time_out_without_stalling() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[LIGHT], &[]);
    let t0 = clock.now_ms();
    let env = h.read_environment();
    assert_eq!(env.light_lux, 70_000);
    assert_eq!((env.co2_ppm, env.ph), (0, 0.0));
    // Three silent probes, each bounded by the response timeout.
    let timeout = NodeConfig::default().modbus_timeout_ms;
    assert!(clock.now_ms() - t0 <= 3 * (timeout + 1));
}

#[test]
fn light_reads_zero_until_first_answer() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[], &[]);
    assert_eq!(h.read_environment().light_lux, 0);
}

#[test]
fn ec_range_switch_rescales() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[(3, &[0, 300])], &[]);
    let low = h.read_environment().ec_us_cm;
    h.set_ec_range(EcRange::High44000);
    let high = h.read_environment().ec_us_cm;
    assert_eq!(low, water::calibrate_ec(30.0));
    assert_eq!(high, water::calibrate_ec(300.0));
    assert!(high > low);
}

#[test]
fn meter_read_and_energy_reset() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[], &[PZEM]);
    assert!(h.meter_connected());

    let ac = h.read_power(1_000).expect("meter online");
    assert!((ac.voltage_v - 229.8).abs() < 1e-3);
    assert!((ac.current_a - 1.5).abs() < 1e-6);
    assert!((ac.power_w - 345.0).abs() < 1e-3);
    assert!((ac.energy_kwh - 12.5).abs() < 1e-6);
    assert!((ac.frequency_hz - 50.0).abs() < 1e-6);
    assert!((ac.power_factor - 0.98).abs() < 1e-6);

    assert!(h.reset_energy());
}

#[test]
fn absent_meter_is_skipped() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[], &[]);
    assert!(!h.meter_connected());
    assert_eq!(h.read_power(1_000), None);
    assert!(!h.reset_energy());
}

#[test]
fn flow_window_reports_through_hub() {
    let clock = MockClock::default();
    let mut h = hub(&clock, &[], &[]);
    assert_eq!(h.sample_flow(500), None);
    let flow = h.sample_flow(1_001).expect("window closed");
    assert_eq!(flow.rate_lpm, [0.0; FLOW_SENSOR_COUNT]);
}
