//! EnvNode Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartTransport ×3   GpioRelayOutput   GpioInputs   Esp32Time   │
//! │  (LineLink/Modbus)  (RelayOutputPort) (Digital)    (Clock)     │
//! │  SensorHub (SensorPort)               LogEventSink (EventSink) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  ActuationState · LoopSchedule · LinkHealth            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::info;

use envnode::adapters::inputs::GpioInputs;
use envnode::adapters::log_sink::LogEventSink;
use envnode::adapters::relay_pins::GpioRelayOutput;
use envnode::adapters::time::Esp32TimeAdapter;
use envnode::adapters::uart::{Rs485Direction, UartTransport};
use envnode::app::ports::Clock;
use envnode::app::service::NodeService;
use envnode::config::NodeConfig;
use envnode::drivers::hw_init;
use envnode::pins::{self, RELAY_COUNT, RELAY_TABLE};
use envnode::protocol::LineLink;
use envnode::sensors::SensorHub;
use envnode::sensors::modbus::ModbusMaster;

type RelayPinDriver = PinDriver<'static, AnyOutputPin, Output>;

fn relay_pins() -> Result<[RelayPinDriver; RELAY_COUNT]> {
    let mut drivers = Vec::with_capacity(RELAY_COUNT);
    for relay in &RELAY_TABLE {
        // SAFETY: every relay GPIO appears exactly once in RELAY_TABLE and
        // is not claimed by any other driver (checked by pins tests).
        let pin = unsafe { AnyOutputPin::new(relay.gpio) };
        drivers.push(PinDriver::output(pin).with_context(|| format!("relay GPIO{}", relay.gpio))?);
    }
    drivers
        .try_into()
        .map_err(|_| anyhow!("relay table does not have {RELAY_COUNT} entries"))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvNode v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = NodeConfig::default();
    config.validate()?;

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    hw_init::init_uart(
        pins::UPSTREAM_UART,
        config.upstream_baud,
        pins::UPSTREAM_TX_GPIO,
        pins::UPSTREAM_RX_GPIO,
    )?;
    hw_init::init_uart(
        pins::FIELD_BUS_UART,
        config.field_bus_baud,
        pins::FIELD_BUS_TX_GPIO,
        pins::FIELD_BUS_RX_GPIO,
    )?;
    hw_init::init_uart(
        pins::POWER_METER_UART,
        config.power_meter_baud,
        pins::POWER_METER_TX_GPIO,
        pins::POWER_METER_RX_GPIO,
    )?;

    let clock = Esp32TimeAdapter::new();
    let mut relays = GpioRelayOutput::new(relay_pins()?);
    let mut upstream = LineLink::new(UartTransport::new(pins::UPSTREAM_UART));

    let field_bus = ModbusMaster::new(
        UartTransport::rs485(
            pins::FIELD_BUS_UART,
            Rs485Direction {
                de_gpio: pins::RS485_DE_GPIO,
                re_gpio: pins::RS485_RE_GPIO,
            },
        )?,
        clock,
        config.modbus_timeout_ms,
    );
    let meter_bus = ModbusMaster::new(
        UartTransport::new(pins::POWER_METER_UART),
        clock,
        config.modbus_timeout_ms,
    );
    let mut sensors = SensorHub::new(&config, field_bus, meter_bus, GpioInputs, clock.now_ms());
    let mut sink = LogEventSink::new();

    // ── 3. Service ────────────────────────────────────────────
    let mut service = NodeService::new(config, clock.now_ms());
    service.start(&clock, &mut upstream, &mut relays, &mut sink);

    info!("System ready. Entering main loop.");

    // ── 4. Cooperative loop ───────────────────────────────────
    loop {
        service.run_iteration(&clock, &mut upstream, &mut relays, &mut sensors, &mut sink);
        // Let the idle task run; actuation timing tolerates ~1 tick.
        FreeRtos::delay_ms(1);
    }
}
