//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to                     |
//! |--------------|-------------------|---------------------------------|
//! | `inputs`     | DigitalInputs     | Flow pulse + level-switch GPIO  |
//! | `log_sink`   | EventSink         | Serial log output               |
//! | `relay_pins` | RelayOutputPort   | `embedded-hal` output pins      |
//! | `time`       | Clock             | ESP32 system timer, FreeRTOS    |
//! | `uart`       | Transport         | ESP-IDF UART driver (± RS-485)  |
//!
//! The upstream link and the Modbus masters are built from `uart` by the
//! protocol and sensor layers (`LineLink`, `ModbusMaster`).

pub mod inputs;
pub mod log_sink;
pub mod relay_pins;
pub mod time;
pub mod uart;
