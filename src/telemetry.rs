//! Shared sensor readings and the `SENSOR_DATA` upstream frame.
//!
//! Producers (the [`SensorPort`](crate::app::ports::SensorPort)
//! implementation) write [`SensorReadings`]; the actuation core never
//! reads it.  Once per telemetry interval the service renders a
//! [`TelemetryFrame`] as one JSON line.

use serde::Serialize;

use crate::pins::FLOW_SENSOR_COUNT;

/// Field-bus probes and the water-level switch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentReadings {
    pub co2_ppm: u16,
    pub air_temp_c: f32,
    pub air_humidity_pct: f32,
    pub light_lux: u32,
    /// Calibrated conductivity, µS/cm.
    pub ec_us_cm: f32,
    pub ph: f32,
    pub water_temp_c: f32,
    pub water_detected: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowReadings {
    /// Rate over the last measurement window, L/min.
    pub rate_lpm: [f32; FLOW_SENSOR_COUNT],
    /// Accumulated volume since boot or the last reset, mL.
    pub total_ml: [f32; FLOW_SENSOR_COUNT],
}

/// PZEM-004T measurement set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcReadings {
    pub voltage_v: f32,
    pub current_a: f32,
    pub power_w: f32,
    pub energy_kwh: f32,
    pub frequency_hz: f32,
    pub power_factor: f32,
}

/// Latest value of every reading, as last written by the poll tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReadings {
    pub environment: EnvironmentReadings,
    pub flow: FlowReadings,
    /// `None` while the AC meter is disconnected.
    pub ac: Option<AcReadings>,
}

// ───────────────────────────────────────────────────────────────
// Wire frame
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFrame {
    msg_type: &'static str,
    co2: u16,
    air_temp: f32,
    air_humidity: f32,
    light: u32,
    ec: f32,
    ph: f32,
    water_temp: f32,
    water_level: u8,
    #[serde(flatten)]
    ac: Option<AcFields>,
    #[serde(rename = "flowSensor1_LPM")]
    flow1_lpm: f32,
    #[serde(rename = "flowSensor2_LPM")]
    flow2_lpm: f32,
    #[serde(rename = "flowSensor3_LPM")]
    flow3_lpm: f32,
    #[serde(rename = "flowSensor1_Liters")]
    flow1_liters: f32,
    #[serde(rename = "flowSensor2_Liters")]
    flow2_liters: f32,
    #[serde(rename = "flowSensor3_Liters")]
    flow3_liters: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcFields {
    ac_voltage: f32,
    ac_current: f32,
    ac_power: f32,
    ac_energy: f32,
    ac_frequency: f32,
    ac_power_factor: f32,
}

/// Round half away from zero to `decimals` places.
fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

impl From<&SensorReadings> for TelemetryFrame {
    fn from(r: &SensorReadings) -> Self {
        let env = &r.environment;
        let lpm = r.flow.rate_lpm.map(|v| round_to(v, 1));
        let liters = r.flow.total_ml.map(|ml| round_to(ml / 1000.0, 2));
        Self {
            msg_type: "SENSOR_DATA",
            co2: env.co2_ppm,
            air_temp: round_to(env.air_temp_c, 1),
            air_humidity: round_to(env.air_humidity_pct, 1),
            light: env.light_lux,
            ec: round_to(env.ec_us_cm, 1),
            ph: round_to(env.ph, 1),
            water_temp: round_to(env.water_temp_c, 1),
            water_level: if env.water_detected { 100 } else { 0 },
            ac: r.ac.map(|ac| AcFields {
                ac_voltage: ac.voltage_v,
                ac_current: ac.current_a,
                ac_power: ac.power_w,
                ac_energy: ac.energy_kwh,
                ac_frequency: ac.frequency_hz,
                ac_power_factor: ac.power_factor,
            }),
            flow1_lpm: lpm[0],
            flow2_lpm: lpm[1],
            flow3_lpm: lpm[2],
            flow1_liters: liters[0],
            flow2_liters: liters[1],
            flow3_liters: liters[2],
        }
    }
}

impl TelemetryFrame {
    /// Render as a single JSON line (no terminator).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
