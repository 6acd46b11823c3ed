//! Newline-delimited line framing for the upstream link.
//!
//! ```text
//!  Transport bytes ──▶ LineDecoder ──▶ trimmed Line ──▶ command::parse
//!                       (≤128 B)
//! ```
//!
//! The decoder accumulates bytes and yields one complete line per `\n`.
//! It handles partial reads: a single `Transport::read` may return part of
//! a line or several lines.  Oversized or non-UTF-8 lines are dropped
//! whole, so a truncated command can never be executed.

use heapless::String;
use log::warn;

use super::transport::{Transport, write_all};
use crate::app::ports::UpstreamLink;

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 128;

/// One received line with surrounding whitespace removed.
pub type Line = String<MAX_LINE_LEN>;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: [u8; MAX_LINE_LEN],
    len: usize,
    /// Current line exceeded `MAX_LINE_LEN`; discard up to the next `\n`.
    overflowed: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE_LEN],
            len: 0,
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a line when `byte` terminates a non-empty
    /// one.  Blank lines yield nothing.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if byte != b'\n' {
            if self.len < MAX_LINE_LEN {
                self.buf[self.len] = byte;
                self.len += 1;
            } else {
                self.overflowed = true;
            }
            return None;
        }

        let len = core::mem::take(&mut self.len);
        if core::mem::take(&mut self.overflowed) {
            warn!("Upstream: line longer than {MAX_LINE_LEN} bytes discarded");
            return None;
        }
        let Ok(text) = core::str::from_utf8(&self.buf[..len]) else {
            warn!("Upstream: non-UTF-8 line discarded");
            return None;
        };
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let mut line = Line::new();
        // Length is bounded by the buffer, so this cannot fail.
        let _ = line.push_str(text);
        Some(line)
    }

    /// Drop any partially received line.
    pub fn reset(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }
}

/// [`UpstreamLink`] over any byte [`Transport`].
pub struct LineLink<T: Transport> {
    transport: T,
    decoder: LineDecoder,
}

impl<T: Transport> LineLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
        }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> UpstreamLink for LineLink<T> {
    fn read_line(&mut self) -> Option<Line> {
        let mut byte = [0u8; 1];
        loop {
            match self.transport.read(&mut byte) {
                Ok(1) => {
                    if let Some(line) = self.decoder.push(byte[0]) {
                        return Some(line);
                    }
                }
                Ok(_) => return None,
                Err(e) => {
                    warn!("Upstream: read failed: {e:?}");
                    return None;
                }
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        let res = write_all(&mut self.transport, line.as_bytes())
            .and_then(|()| write_all(&mut self.transport, b"\n"));
        if let Err(e) = res {
            warn!("Upstream: write failed: {e:?}");
        }
    }

    fn discard_input(&mut self) {
        self.decoder.reset();
        let mut scratch = [0u8; 32];
        while let Ok(n) = self.transport.read(&mut scratch) {
            if n == 0 {
                break;
            }
        }
    }
}
