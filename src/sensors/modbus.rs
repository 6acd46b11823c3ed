//! Minimal Modbus RTU master for the RS-485 field bus.
//!
//! Request / response framing:
//! ```text
//! request   ┌──────┬────┬──────────┬──────────┬─────────┐
//!           │ addr │ fn │ start BE │ count BE │ CRC LE  │
//!           └──────┴────┴──────────┴──────────┴─────────┘
//! response  ┌──────┬────┬────────┬──────────────┬─────────┐
//!           │ addr │ fn │ nbytes │ regs BE ...  │ CRC LE  │
//!           └──────┴────┴────────┴──────────────┴─────────┘
//! exception ┌──────┬─────────┬──────┬─────────┐
//!           │ addr │ fn|0x80 │ code │ CRC LE  │
//!           └──────┴─────────┴──────┴─────────┘
//! ```
//!
//! Transactions are synchronous and bounded by `response_timeout_ms`.

use log::debug;

use crate::actuation::clock::elapsed_since;
use crate::app::ports::Clock;
use crate::error::FieldBusError;
use crate::protocol::transport::{Transport, write_all};

/// Longest frame we ever expect (addr + fn + count + 2×MAX_REGISTERS + CRC).
const MAX_FRAME: usize = 5 + 2 * MAX_REGISTERS;
/// Largest register block any probe on this bus returns.
pub const MAX_REGISTERS: usize = 10;

/// Modbus CRC-16 (poly 0xA001 reflected, init 0xFFFF).
pub const fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    let mut i = 0;
    while i < data.len() {
        crc ^= data[i] as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
            bit += 1;
        }
        i += 1;
    }
    crc
}

/// Which register table a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Holding,
    Input,
}

impl RegisterKind {
    pub const fn function_code(self) -> u8 {
        match self {
            Self::Holding => 0x03,
            Self::Input => 0x04,
        }
    }
}

/// Register-level access to slaves on a shared bus.
pub trait FieldBus {
    /// Read `out.len()` consecutive registers from `slave` starting at `start`.
    fn read_registers(
        &mut self,
        slave: u8,
        kind: RegisterKind,
        start: u16,
        out: &mut [u16],
    ) -> Result<(), FieldBusError>;

    /// Send a parameterless vendor function and wait for its echo.
    fn command(&mut self, slave: u8, function: u8) -> Result<(), FieldBusError>;
}

pub struct ModbusMaster<T: Transport, C: Clock> {
    transport: T,
    clock: C,
    response_timeout_ms: u32,
}

impl<T: Transport, C: Clock> ModbusMaster<T, C> {
    pub fn new(transport: T, clock: C, response_timeout_ms: u32) -> Self {
        Self {
            transport,
            clock,
            response_timeout_ms,
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), FieldBusError> {
        // Drop stale bytes from a previous timed-out exchange.
        let mut scratch = [0u8; 16];
        while let Ok(n) = self.transport.read(&mut scratch) {
            if n == 0 {
                break;
            }
        }
        write_all(&mut self.transport, frame).map_err(|_| FieldBusError::Transport)?;
        self.transport.flush().map_err(|_| FieldBusError::Transport)
    }

    /// Collect a response of `expected` bytes, switching to the 5-byte
    /// exception length if the function byte has its high bit set.
    fn receive<'b>(
        &mut self,
        buf: &'b mut [u8; MAX_FRAME],
        expected: usize,
    ) -> Result<&'b [u8], FieldBusError> {
        let start = self.clock.now_ms();
        let mut len = 0;
        let mut want = expected;
        while len < want {
            let n = self
                .transport
                .read(&mut buf[len..want])
                .map_err(|_| FieldBusError::Transport)?;
            len += n;
            if len >= 2 && buf[1] & 0x80 != 0 {
                want = 5;
            }
            if n == 0 {
                if elapsed_since(start, self.clock.now_ms()) >= self.response_timeout_ms {
                    return Err(FieldBusError::Timeout);
                }
                self.clock.delay_ms(1);
            }
        }
        let frame = &buf[..want];
        let (body, crc) = frame.split_at(want - 2);
        if crc16(body) != u16::from_le_bytes([crc[0], crc[1]]) {
            return Err(FieldBusError::Crc);
        }
        if frame[1] & 0x80 != 0 {
            return Err(FieldBusError::Exception(frame[2]));
        }
        Ok(frame)
    }
}

impl<T: Transport, C: Clock> FieldBus for ModbusMaster<T, C> {
    fn read_registers(
        &mut self,
        slave: u8,
        kind: RegisterKind,
        start: u16,
        out: &mut [u16],
    ) -> Result<(), FieldBusError> {
        let count = out.len();
        if count == 0 || count > MAX_REGISTERS {
            return Err(FieldBusError::UnexpectedResponse);
        }
        let function = kind.function_code();
        let mut req = [0u8; 8];
        req[0] = slave;
        req[1] = function;
        req[2..4].copy_from_slice(&start.to_be_bytes());
        req[4..6].copy_from_slice(&(count as u16).to_be_bytes());
        let crc = crc16(&req[..6]);
        req[6..8].copy_from_slice(&crc.to_le_bytes());
        self.send(&req)?;

        let mut buf = [0u8; MAX_FRAME];
        let frame = self.receive(&mut buf, 5 + 2 * count)?;
        if frame[0] != slave || frame[1] != function || frame[2] as usize != 2 * count {
            return Err(FieldBusError::UnexpectedResponse);
        }
        for (reg, pair) in out.iter_mut().zip(frame[3..3 + 2 * count].chunks_exact(2)) {
            *reg = u16::from_be_bytes([pair[0], pair[1]]);
        }
        debug!("Modbus: slave {slave} fn 0x{function:02X} @{start} → {out:?}");
        Ok(())
    }

    fn command(&mut self, slave: u8, function: u8) -> Result<(), FieldBusError> {
        let crc = crc16(&[slave, function]);
        let [lo, hi] = crc.to_le_bytes();
        self.send(&[slave, function, lo, hi])?;

        let mut buf = [0u8; MAX_FRAME];
        let frame = self.receive(&mut buf, 4)?;
        if frame[0] != slave || frame[1] != function {
            return Err(FieldBusError::UnexpectedResponse);
        }
        Ok(())
    }
}
