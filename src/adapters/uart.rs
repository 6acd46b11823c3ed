//! UART byte transport.
//!
//! [`UartTransport`] implements [`Transport`] over an ESP-IDF UART driver
//! installed by [`hw_init::init_uart`](crate::drivers::hw_init::init_uart).
//! Reads never block.
//!
//! For the RS-485 field bus the transceiver's DE and /RE lines are tied to
//! one direction state: raised before the first byte of a frame is queued
//! and dropped by [`flush`](Transport::flush) once the last stop bit has
//! left the wire, so the slave's answer is never clipped.

use crate::drivers::hw_init::{self, HwInitError};
use crate::protocol::transport::Transport;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Ticks to wait for the TX FIFO to drain.  At 9600 baud an 8-byte frame
/// takes ~8 ms.
#[cfg(target_os = "espidf")]
const TX_DONE_TIMEOUT_TICKS: u32 = 100;

/// DE / /RE pin pair of a half-duplex transceiver.
#[derive(Debug, Clone, Copy)]
pub struct Rs485Direction {
    pub de_gpio: i32,
    pub re_gpio: i32,
}

pub struct UartTransport {
    port: i32,
    direction: Option<Rs485Direction>,
    transmitting: bool,
}

impl UartTransport {
    /// Full-duplex UART (upstream link, AC meter).
    pub fn new(port: i32) -> Self {
        Self {
            port,
            direction: None,
            transmitting: false,
        }
    }

    /// Half-duplex RS-485 UART.  Leaves the transceiver receiving.
    pub fn rs485(port: i32, direction: Rs485Direction) -> Result<Self, HwInitError> {
        hw_init::init_output_gpio(direction.de_gpio)?;
        hw_init::init_output_gpio(direction.re_gpio)?;
        let mut t = Self {
            port,
            direction: Some(direction),
            transmitting: true,
        };
        t.set_transmit(false);
        Ok(t)
    }

    pub fn port(&self) -> i32 {
        self.port
    }

    /// `true` while the transceiver drives the bus.
    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    fn set_transmit(&mut self, on: bool) {
        if self.transmitting == on {
            return;
        }
        if let Some(dir) = self.direction {
            hw_init::gpio_write(dir.de_gpio, on);
            hw_init::gpio_write(dir.re_gpio, on);
        }
        self.transmitting = on;
    }
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = i32;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let mut buffered: usize = 0;
        // SAFETY: driver installed by init_uart(); main-loop access only.
        let ret = unsafe { uart_get_buffered_data_len(self.port, &mut buffered) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let want = buffered.min(buf.len());
        if want == 0 {
            return Ok(0);
        }
        // SAFETY: `buf` is valid for `want` bytes; zero-tick wait never blocks.
        let n = unsafe { uart_read_bytes(self.port, buf.as_mut_ptr().cast(), want as u32, 0) };
        if n < 0 { Err(n) } else { Ok(n as usize) }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        self.set_transmit(true);
        // SAFETY: `data` is valid for its length; the driver copies it.
        let n = unsafe { uart_write_bytes(self.port, data.as_ptr().cast(), data.len()) };
        if n < 0 { Err(n) } else { Ok(n as usize) }
    }

    fn flush(&mut self) -> Result<(), i32> {
        // SAFETY: driver installed by init_uart().
        let ret = unsafe { uart_wait_tx_done(self.port, TX_DONE_TIMEOUT_TICKS) };
        self.set_transmit(false);
        if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
    }
}

/// Host build: a disconnected wire.  Writes are accepted, nothing arrives.
#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = i32;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, i32> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        self.set_transmit(true);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), i32> {
        self.set_transmit(false);
        Ok(())
    }
}
