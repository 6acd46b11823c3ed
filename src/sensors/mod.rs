//! Sensor subsystem — individual probes and the aggregating [`SensorHub`].
//!
//! ```text
//!  RS-485 bus ─┬─ AirProbe   (id 1)  CO2 · temp · humidity
//!              ├─ LightProbe (id 2)  lux
//!              ├─ EcProbe    (id 3)  conductivity
//!              └─ PhProbe    (id 4)  pH · water temp
//!  Meter link ─── Pzem004t   (0xF8)  V · A · W · kWh · Hz · PF
//!  GPIO ───────── FlowMeter ×3, water-level switch
//! ```
//!
//! The hub implements [`SensorPort`] and [`SensorControlPort`], which is
//! all the application core ever sees of it.

pub mod air;
pub mod flow;
pub mod modbus;
pub mod power;
pub mod water;

use crate::actuation::relay::PinLevel;
use crate::app::ports::{SensorControlPort, SensorPort};
use crate::config::NodeConfig;
use crate::pins::FLOW_SENSOR_COUNT;
use crate::telemetry::{AcReadings, EnvironmentReadings, FlowReadings};
use air::{AirProbe, LightProbe};
use flow::FlowMeter;
use modbus::FieldBus;
use power::Pzem004t;
use water::{EcProbe, EcRange, PhProbe};

/// Plain digital inputs sampled by the hub.
pub trait DigitalInputs {
    /// Level switch; HIGH means water present.
    fn water_level(&mut self) -> PinLevel;
    fn flow_levels(&mut self) -> [PinLevel; FLOW_SENSOR_COUNT];
}

pub struct SensorHub<B: FieldBus, M: FieldBus, I: DigitalInputs> {
    field_bus: B,
    meter_bus: M,
    inputs: I,
    air: AirProbe,
    light: LightProbe,
    ec: EcProbe,
    ph: PhProbe,
    flow: FlowMeter,
    meter: Pzem004t,
}

impl<B: FieldBus, M: FieldBus, I: DigitalInputs> SensorHub<B, M, I> {
    /// Build the hub and probe the AC meter once.
    pub fn new(config: &NodeConfig, field_bus: B, meter_bus: M, mut inputs: I, now: u32) -> Self {
        let ids = &config.slave_ids;
        let initial = inputs.flow_levels();
        let mut hub = Self {
            field_bus,
            meter_bus,
            inputs,
            air: AirProbe::new(ids.co2),
            light: LightProbe::new(ids.light),
            ec: EcProbe::new(ids.ec, config.ec_range),
            ph: PhProbe::new(ids.ph),
            flow: FlowMeter::new(config.flow_pulses_per_lpm, config.flow_window_ms, now, initial),
            meter: Pzem004t::new(ids.power_meter, config.ac_reconnect_interval_ms),
        };
        hub.meter.connect(now, &mut hub.meter_bus);
        hub
    }

    pub fn ec_range(&self) -> EcRange {
        self.ec.range()
    }

    pub fn meter_connected(&self) -> bool {
        self.meter.is_connected()
    }
}

impl<B: FieldBus, M: FieldBus, I: DigitalInputs> SensorPort for SensorHub<B, M, I> {
    fn read_environment(&mut self) -> EnvironmentReadings {
        let air = self.air.read(&mut self.field_bus);
        let light_lux = self.light.read(&mut self.field_bus);
        let ec = self.ec.read(&mut self.field_bus);
        let ph = self.ph.read(&mut self.field_bus).unwrap_or_default();
        EnvironmentReadings {
            co2_ppm: air.co2_ppm,
            air_temp_c: air.temp_c,
            air_humidity_pct: air.humidity_pct,
            light_lux,
            ec_us_cm: ec.ec_us_cm,
            ph: ph.ph,
            water_temp_c: ph.water_temp_c,
            water_detected: self.inputs.water_level() == PinLevel::High,
        }
    }

    fn sample_flow(&mut self, now_ms: u32) -> Option<FlowReadings> {
        let levels = self.inputs.flow_levels();
        self.flow.sample(now_ms, levels)
    }

    fn read_power(&mut self, now_ms: u32) -> Option<AcReadings> {
        self.meter.read(now_ms, &mut self.meter_bus)
    }
}

impl<B: FieldBus, M: FieldBus, I: DigitalInputs> SensorControlPort for SensorHub<B, M, I> {
    fn set_ec_range(&mut self, range: EcRange) {
        self.ec.set_range(range);
    }

    fn reset_energy(&mut self) -> bool {
        self.meter.reset_energy(&mut self.meter_bus)
    }

    fn reset_flow_totals(&mut self) {
        self.flow.reset_totals();
    }
}
