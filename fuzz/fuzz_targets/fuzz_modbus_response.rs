//! Fuzz target: `ModbusMaster` response handling
//!
//! Plays arbitrary bytes back as the slave's answer to a register read and
//! a vendor command.  The master must never panic or index past its frame
//! buffer, and must only report success for a CRC-valid frame.
//!
//! cargo fuzz run fuzz_modbus_response

#![no_main]

use core::cell::Cell;

use envnode::app::ports::Clock;
use envnode::protocol::Transport;
use envnode::sensors::modbus::{FieldBus, ModbusMaster, RegisterKind, crc16};
use libfuzzer_sys::fuzz_target;

/// Answers with the fuzz input once the request has been flushed.
struct Replay<'a> {
    reply: &'a [u8],
    pending: &'a [u8],
}

impl Transport for Replay<'_> {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending = &self.pending[n..];
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        self.pending = self.reply;
        Ok(())
    }
}

#[derive(Default)]
struct Ticks(Cell<u32>);

impl Clock for &Ticks {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
    fn delay_ms(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&count, reply)) = data.split_first() else {
        return;
    };
    let count = usize::from(count % 12);
    let ticks = Ticks::default();
    let mut master = ModbusMaster::new(
        Replay {
            reply,
            pending: &[],
        },
        &ticks,
        50,
    );

    let mut regs = [0u16; 12];
    if master
        .read_registers(1, RegisterKind::Input, 0, &mut regs[..count])
        .is_ok()
    {
        let frame = &reply[..5 + 2 * count];
        let (body, crc) = frame.split_at(frame.len() - 2);
        assert_eq!(crc16(body).to_le_bytes(), [crc[0], crc[1]]);
    }

    let _ = master.command(0xF8, 0x42);
});
