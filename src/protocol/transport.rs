//! Transport abstraction — any byte-oriented serial channel.
//!
//! Concrete implementations:
//! - UART0 upstream link to the supervisory controller
//! - UART1 RS-485 field bus (direction-controlled)
//! - UART2 PZEM-004T AC meter
//!
//! The line link and the Modbus master are generic over `Transport`, so the
//! same protocol code runs against UART drivers on target and scripted
//! byte queues in host tests.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Block until all buffered output has left the wire.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Write all of `data`, retrying short writes.  A transport that accepts
/// zero bytes is treated as stalled and the remainder is dropped.
pub fn write_all<T: Transport>(t: &mut T, mut data: &[u8]) -> Result<(), T::Error> {
    while !data.is_empty() {
        let n = t.write(data)?;
        if n == 0 {
            break;
        }
        data = &data[n.min(data.len())..];
    }
    Ok(())
}
