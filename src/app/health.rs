//! Upstream link liveness probe.
//!
//! Sends the handshake token and waits, bounded, for the controller to
//! answer.  This is the only blocking point in the main loop; the wait is
//! capped by `NodeConfig::handshake_timeout_ms` (≤ 1000 ms).  A failed
//! probe only flips a health flag; it is retried on the next link check.

use log::{info, warn};

use super::ports::{Clock, UpstreamLink};
use crate::actuation::clock::elapsed_since;
use crate::protocol::command::HANDSHAKE;

/// Substrings accepted as a handshake answer.
pub const HANDSHAKE_REPLIES: [&str; 2] = ["ESP32_OK", "ESP32_TEST"];

pub struct LinkHealth {
    timeout_ms: u32,
    poll_ms: u32,
    healthy: bool,
    probes: u32,
    failures: u32,
}

impl LinkHealth {
    pub fn new(timeout_ms: u32, poll_ms: u32) -> Self {
        Self {
            timeout_ms,
            poll_ms,
            healthy: false,
            probes: 0,
            failures: 0,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn probes(&self) -> u32 {
        self.probes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Run one probe.  Returns the new health if it changed.
    ///
    /// Lines that arrive during the wait and are not a handshake answer
    /// are dropped.
    pub fn check(&mut self, link: &mut impl UpstreamLink, clock: &impl Clock) -> Option<bool> {
        self.probes = self.probes.wrapping_add(1);
        link.discard_input();
        link.write_line(HANDSHAKE);

        let start = clock.now_ms();
        let mut answered = false;
        while !answered && elapsed_since(start, clock.now_ms()) < self.timeout_ms {
            while let Some(line) = link.read_line() {
                if HANDSHAKE_REPLIES.iter().any(|r| line.contains(r)) {
                    answered = true;
                    break;
                }
                info!("Link probe: ignoring '{line}'");
            }
            if !answered {
                clock.delay_ms(self.poll_ms);
            }
        }

        if answered {
            info!("Link probe: upstream answered");
        } else {
            self.failures = self.failures.wrapping_add(1);
            warn!("Link probe: no answer within {} ms", self.timeout_ms);
        }

        let changed = answered != self.healthy;
        self.healthy = answered;
        changed.then_some(answered)
    }
}
