//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and installs the three UART drivers using
//! raw ESP-IDF sys calls.  Called from `main()` before the loop starts.
//! Relay outputs are not configured here; they are owned by
//! `PinDriver`s built in `main()`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    UartConfigFailed { port: i32, rc: i32 },
    UartInstallFailed { port: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UartConfigFailed { port, rc } => write!(f, "UART{} config failed (rc={})", port, rc),
            Self::UartInstallFailed { port, rc } => write!(f, "UART{} driver install failed (rc={})", port, rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("peripheral initialisation")
    }
}

/// Configure every plain digital input.
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe { init_gpio_inputs()? };
    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Flow meters are open-collector: pull-up, a pulse pulls LOW.
    for &pin in &pins::FLOW_PULSE_GPIOS {
        configure(pin, gpio_mode_t_GPIO_MODE_INPUT, true)?;
    }
    // The level switch drives both ways.
    configure(pins::WATER_LEVEL_GPIO, gpio_mode_t_GPIO_MODE_INPUT, false)?;
    Ok(())
}

#[cfg(target_os = "espidf")]
fn configure(pin: i32, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: pin numbers come from `pins`; gpio_config only touches that pin.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO Outputs ──────────────────────────────────────────────

/// Configure `pin` as a push-pull output, driven LOW.
#[cfg(target_os = "espidf")]
pub fn init_output_gpio(pin: i32) -> Result<(), HwInitError> {
    configure(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
    gpio_write(pin, false);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_output_gpio(_pin: i32) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    // Main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── UART ──────────────────────────────────────────────────────

/// RX ring buffer per port.  Holds several upstream lines or the largest
/// Modbus response many times over.
#[cfg(target_os = "espidf")]
const UART_RX_BUFFER: i32 = 512;

/// Install an 8N1 UART driver on `port` with the given pins.
#[cfg(target_os = "espidf")]
pub fn init_uart(port: i32, baud: u32, tx_gpio: i32, rx_gpio: i32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: single-threaded init; the port is not yet in use.
    unsafe {
        let rc = uart_driver_install(port, UART_RX_BUFFER, 0, 0, core::ptr::null_mut(), 0);
        if rc != ESP_OK as i32 {
            return Err(HwInitError::UartInstallFailed { port, rc });
        }
        let rc = uart_param_config(port, &cfg);
        if rc != ESP_OK as i32 {
            return Err(HwInitError::UartConfigFailed { port, rc });
        }
        // -1 = UART_PIN_NO_CHANGE for RTS / CTS.
        let rc = uart_set_pin(port, tx_gpio, rx_gpio, -1, -1);
        if rc != ESP_OK as i32 {
            return Err(HwInitError::UartConfigFailed { port, rc });
        }
    }
    info!("hw_init: UART{} at {} baud (tx={}, rx={})", port, baud, tx_gpio, rx_gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_uart(port: i32, baud: u32, _tx_gpio: i32, _rx_gpio: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): UART{} at {} baud skipped", port, baud);
    Ok(())
}
