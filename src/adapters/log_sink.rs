//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger.  Log output is routed to the USB-Serial-JTAG
//! console, never to the upstream UART.

use log::{info, warn};

use crate::actuation::TimerEvent;
use crate::actuation::fan::{FanPhase, FanTransition};
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | all relays off"),
            AppEvent::LinkHealthChanged { healthy: true } => info!("LINK  | upstream healthy"),
            AppEvent::LinkHealthChanged { healthy: false } => warn!("LINK  | upstream not answering"),
            AppEvent::CommandRejected(e) => warn!("CMD   | rejected: {e}"),
            AppEvent::UnknownCommand => warn!("CMD   | unknown command"),
            AppEvent::PatternApplied {
                requested,
                applied,
                overridden,
                changed,
            } => {
                info!(
                    "RELAY | requested={requested} applied={applied} \
                     pump_override=0b{overridden:08b} changed=0b{changed:08b}"
                );
            }
            AppEvent::Timer(TimerEvent::PumpStopped(kind, stop)) => {
                info!("PUMP  | {kind:?} stopped: {stop:?}");
            }
            AppEvent::Timer(TimerEvent::Fan(FanTransition { phase, report })) => {
                info!(
                    "FAN   | -> {} after {} ms (target {} ms, {:.2}%)",
                    if *phase == FanPhase::OnPeriod { "ON" } else { "OFF" },
                    report.elapsed_ms,
                    report.target_ms,
                    report.accuracy_pct,
                );
            }
            AppEvent::Telemetry(r) => {
                let env = &r.environment;
                info!(
                    "TELEM | CO2={}ppm T={:.1}\u{00b0}C RH={:.1}% lux={} | EC={:.1} pH={:.1} \
                     Tw={:.1}\u{00b0}C water={} | flow={:.1}/{:.1}/{:.1} L/min | AC={}",
                    env.co2_ppm,
                    env.air_temp_c,
                    env.air_humidity_pct,
                    env.light_lux,
                    env.ec_us_cm,
                    env.ph,
                    env.water_temp_c,
                    if env.water_detected { "OK" } else { "LOW" },
                    r.flow.rate_lpm[0],
                    r.flow.rate_lpm[1],
                    r.flow.rate_lpm[2],
                    r.ac.map_or("offline", |_| "online"),
                );
            }
        }
    }
}
