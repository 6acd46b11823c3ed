//! Upstream protocol over a byte pipe.
//!
//! Drives the real [`LineLink`] framing and the service's dispatch with
//! raw bytes, the way the UART delivers them.

use std::collections::VecDeque;

use envnode::actuation::relay::RelayState;
use envnode::app::service::NodeService;
use envnode::config::NodeConfig;
use envnode::protocol::line::MAX_LINE_LEN;
use envnode::protocol::{LineLink, Transport};

use crate::mock_hw::{EventLog, MockClock, MockRelays, MockSensors};

/// Serial pipe to a scripted controller that answers every handshake.
#[derive(Default)]
struct Pipe {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl Pipe {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .split_terminator('\n')
            .map(str::to_owned)
            .collect()
    }
}

impl Transport for Pipe {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.rx.len());
        for b in buf.iter_mut().take(n) {
            *b = self.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.extend_from_slice(data);
        if self.tx.ends_with(b"MEGA_TEST\n") {
            self.rx.extend(b"ESP32_OK\r\n");
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

struct Node {
    clock: MockClock,
    link: LineLink<Pipe>,
    relays: MockRelays,
    sensors: MockSensors,
    events: EventLog,
    service: NodeService,
}

impl Node {
    fn new() -> Self {
        let clock = MockClock::default();
        let mut n = Self {
            service: NodeService::new(NodeConfig::default(), 0),
            clock,
            link: LineLink::new(Pipe::default()),
            relays: MockRelays::default(),
            sensors: MockSensors::default(),
            events: EventLog::default(),
        };
        n.service
            .start(&n.clock, &mut n.link, &mut n.relays, &mut n.events);
        n.link.transport_mut().tx.clear();
        n
    }

    fn feed(&mut self, bytes: &[u8]) {
        self.link.transport_mut().rx.extend(bytes);
    }

    fn step(&mut self, now: u32) {
        self.clock.set(now);
        self.service.run_iteration(
            &self.clock,
            &mut self.link,
            &mut self.relays,
            &mut self.sensors,
            &mut self.events,
        );
    }

    fn sent(&mut self) -> Vec<String> {
        self.link.transport_mut().lines()
    }
}

#[test]
fn handshake_over_bytes() {
    let mut node = Node::new();
    assert!(node.service.link_healthy());
    node.feed(b"MEGA_TEST\r\n");
    node.step(5);
    assert_eq!(node.sent(), ["MEGA_OK"]);
}

#[test]
fn line_split_across_reads_is_reassembled() {
    let mut node = Node::new();
    node.feed(b"RELAY:1000");
    node.step(5);
    assert!(node.sent().is_empty());
    node.feed(b"0001\n");
    node.step(6);
    assert_eq!(node.sent(), ["RELAY_OK"]);
    assert_eq!(node.service.actuation().relays().state(7), Some(RelayState::On));
}

#[test]
fn overlong_line_is_dropped_and_next_line_handled() {
    let mut node = Node::new();
    let mut junk = vec![b'R'; MAX_LINE_LEN + 20];
    junk.push(b'\n');
    node.feed(&junk);
    node.feed(b"RELAY_STATUS\n");
    node.step(5);
    assert_eq!(node.sent(), ["RELAY_STATUS:00000000"]);
}

#[test]
fn blank_and_echo_lines_get_no_reply() {
    let mut node = Node::new();
    node.feed(b"\r\n   \nDATA_RECEIVED\nINVALID_FORMAT\n");
    for t in 1..=4 {
        node.step(t);
    }
    assert!(node.sent().is_empty());
}

#[test]
fn unknown_verb_is_answered() {
    let mut node = Node::new();
    node.feed(b"LIGHTS_ON\n");
    node.step(5);
    assert_eq!(node.sent(), ["UNKNOWN_COMMAND"]);
}

#[test]
fn non_numeric_pump_duration_cancels() {
    let mut node = Node::new();
    node.feed(b"PUMP_TIMING:EC,3000\n");
    node.step(5);
    node.feed(b"PUMP_TIMING:EC,abc\n");
    node.step(10);
    assert_eq!(node.sent(), ["EC_PUMP_TIMING_OK", "EC_PUMP_STOPPED:0,0,100.0,0"]);
    assert!(!node.service.actuation().pump(envnode::actuation::pump::PumpKind::Ec).is_running());
}

#[test]
fn unknown_config_option_is_rejected() {
    let mut node = Node::new();
    node.feed(b"CONFIG:EC_RANGE:1234\n");
    node.step(5);
    assert_eq!(node.sent(), ["CONFIG_ERROR:UNKNOWN_OPTION"]);
    assert_eq!(node.sensors.ec_range, None);
}
