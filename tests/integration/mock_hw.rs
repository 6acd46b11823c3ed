//! Mock hardware adapters for integration tests.
//!
//! Records every relay write, upstream line, and emitted event so tests
//! can assert on the full history without touching real GPIO or UARTs.

use std::cell::Cell;
use std::collections::VecDeque;

use envnode::actuation::relay::PinLevel;
use envnode::app::events::AppEvent;
use envnode::app::ports::{
    Clock, EventSink, RelayOutputPort, SensorControlPort, SensorPort, UpstreamLink,
};
use envnode::app::service::NodeService;
use envnode::config::NodeConfig;
use envnode::pins::RELAY_COUNT;
use envnode::protocol::Line;
use envnode::sensors::water::EcRange;
use envnode::telemetry::{AcReadings, EnvironmentReadings, FlowReadings};

// ── Clock ─────────────────────────────────────────────────────

/// Manually driven clock.  `delay_ms` advances time instantly.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

// ── Upstream link ─────────────────────────────────────────────

/// Scripted controller.  Answers `MEGA_TEST` with `ESP32_OK` while
/// `responsive` is set.
pub struct MockLink {
    pub inbox: VecDeque<String>,
    pub sent: Vec<String>,
    pub responsive: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new(responsive: bool) -> Self {
        Self {
            inbox: VecDeque::new(),
            sent: Vec::new(),
            responsive,
        }
    }

    pub fn push(&mut self, line: &str) {
        self.inbox.push_back(line.to_owned());
    }

    /// Sent lines other than handshake probes and telemetry.
    pub fn replies(&self) -> Vec<&str> {
        self.sent
            .iter()
            .map(String::as_str)
            .filter(|l| *l != "MEGA_TEST" && !l.starts_with('{'))
            .collect()
    }

    pub fn telemetry(&self) -> Vec<&str> {
        self.sent
            .iter()
            .map(String::as_str)
            .filter(|l| l.starts_with('{'))
            .collect()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl UpstreamLink for MockLink {
    fn read_line(&mut self) -> Option<Line> {
        let next = self.inbox.pop_front()?;
        Line::try_from(next.as_str()).ok()
    }

    fn write_line(&mut self, line: &str) {
        self.sent.push(line.to_owned());
        if line == "MEGA_TEST" && self.responsive {
            self.push("ESP32_OK");
        }
    }

    fn discard_input(&mut self) {
        self.inbox.clear();
    }
}

// ── Relay outputs ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockRelays {
    pub writes: Vec<(usize, PinLevel)>,
    pub levels: [Option<PinLevel>; RELAY_COUNT],
}

impl RelayOutputPort for MockRelays {
    fn drive(&mut self, channel: usize, level: PinLevel) {
        self.writes.push((channel, level));
        self.levels[channel] = Some(level);
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Canned readings plus call counters.
#[derive(Default)]
pub struct MockSensors {
    pub environment: EnvironmentReadings,
    pub flow: VecDeque<FlowReadings>,
    pub ac: Option<AcReadings>,
    pub environment_reads: u32,
    pub flow_samples: u32,
    pub power_reads: u32,
    pub ec_range: Option<EcRange>,
    pub meter_acks_reset: bool,
    pub energy_resets: u32,
    pub flow_resets: u32,
}

impl SensorPort for MockSensors {
    fn read_environment(&mut self) -> EnvironmentReadings {
        self.environment_reads += 1;
        self.environment
    }

    fn sample_flow(&mut self, _now_ms: u32) -> Option<FlowReadings> {
        self.flow_samples += 1;
        self.flow.pop_front()
    }

    fn read_power(&mut self, _now_ms: u32) -> Option<AcReadings> {
        self.power_reads += 1;
        self.ac
    }
}

impl SensorControlPort for MockSensors {
    fn set_ec_range(&mut self, range: EcRange) {
        self.ec_range = Some(range);
    }

    fn reset_energy(&mut self) -> bool {
        self.energy_resets += 1;
        self.meter_acks_reset
    }

    fn reset_flow_totals(&mut self) {
        self.flow_resets += 1;
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog(pub Vec<AppEvent>);

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started [`NodeService`] wired to mocks.
pub struct Rig {
    pub clock: MockClock,
    pub link: MockLink,
    pub relays: MockRelays,
    pub sensors: MockSensors,
    pub events: EventLog,
    pub service: NodeService,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with(NodeConfig::default(), true)
    }

    pub fn with(config: NodeConfig, responsive: bool) -> Self {
        let clock = MockClock::default();
        let mut rig = Self {
            service: NodeService::new(config, clock.now_ms()),
            clock,
            link: MockLink::new(responsive),
            relays: MockRelays::default(),
            sensors: MockSensors::default(),
            events: EventLog::default(),
        };
        rig.service
            .start(&rig.clock, &mut rig.link, &mut rig.relays, &mut rig.events);
        rig
    }

    /// Run one loop pass at `now`.
    pub fn step(&mut self, now: u32) {
        self.clock.set(now);
        self.service.run_iteration(
            &self.clock,
            &mut self.link,
            &mut self.relays,
            &mut self.sensors,
            &mut self.events,
        );
    }

    /// Queue `line` and run one pass at `now`; returns what was sent.
    pub fn send(&mut self, line: &str, now: u32) -> Vec<String> {
        self.link.clear();
        self.link.push(line);
        self.step(now);
        self.link.sent.clone()
    }
}
