//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns the actuation state, the shared sensor readings,
//! the loop schedule, and the link-health flag.  All I/O flows through
//! port traits injected at call sites, making the whole loop testable with
//! mock adapters.
//!
//! ```text
//!    SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  UpstreamLink ◀──▶│       NodeService        │
//! RelayOutputPort ◀─│ Actuation · Readings ·   │
//!         Clock ──▶ │ Schedule · LinkHealth    │
//!                   └──────────────────────────┘
//! ```
//!
//! One call to [`run_iteration`](NodeService::run_iteration) is one pass
//! of the cooperative loop, in fixed order: link check, environment poll,
//! flow sample, AC poll, telemetry, command receive, actuation tick.
//! Commands are handled before the timer tick so a cancel received this
//! pass can never be followed by a duplicate completion from the same pass.

use log::{error, info};

use crate::actuation::ActuationState;
use crate::config::NodeConfig;
use crate::protocol::handler::{self, Peripherals};
use crate::protocol::reply::Reply;
use crate::scheduler::LoopSchedule;
use crate::telemetry::{SensorReadings, TelemetryFrame};

use super::events::AppEvent;
use super::health::LinkHealth;
use super::ports::{Clock, EventSink, RelayOutputPort, SensorControlPort, SensorPort, UpstreamLink};

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService {
    config: NodeConfig,
    actuation: ActuationState,
    schedule: LoopSchedule,
    health: LinkHealth,
    readings: SensorReadings,
    iterations: u64,
}

impl NodeService {
    /// Construct the service.  `now` seeds the interval gates.
    ///
    /// Does **not** touch hardware — call [`start`](Self::start) next.
    pub fn new(config: NodeConfig, now: u32) -> Self {
        let schedule = LoopSchedule::new(&config, now);
        let health = LinkHealth::new(config.handshake_timeout_ms, config.handshake_poll_ms);
        Self {
            config,
            actuation: ActuationState::default(),
            schedule,
            health,
            readings: SensorReadings::default(),
            iterations: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Force every relay off and run the first link probe.
    pub fn start(
        &mut self,
        clock: &impl Clock,
        link: &mut impl UpstreamLink,
        relays: &mut impl RelayOutputPort,
        sink: &mut impl EventSink,
    ) {
        self.actuation.init(relays);
        sink.emit(&AppEvent::Started);
        info!("NodeService started, relays {}", self.actuation.relays().snapshot());

        self.health.check(link, clock);
        sink.emit(&AppEvent::LinkHealthChanged {
            healthy: self.health.is_healthy(),
        });
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one pass of the main loop.
    ///
    /// `sensors` satisfies both [`SensorPort`] and [`SensorControlPort`];
    /// the second is needed by `CONFIG:` commands.
    pub fn run_iteration(
        &mut self,
        clock: &impl Clock,
        link: &mut impl UpstreamLink,
        relays: &mut impl RelayOutputPort,
        sensors: &mut (impl SensorPort + SensorControlPort),
        sink: &mut impl EventSink,
    ) {
        self.iterations += 1;
        let due = self.schedule.poll(clock.now_ms());

        // 1. Link health (bounded blocking wait)
        if due.link_check {
            if let Some(healthy) = self.health.check(link, clock) {
                sink.emit(&AppEvent::LinkHealthChanged { healthy });
            }
        }

        // 2. Field-bus probes + water level
        if due.environment {
            self.readings.environment = sensors.read_environment();
        }

        // 3. Flow pulses, every pass
        if let Some(flow) = sensors.sample_flow(clock.now_ms()) {
            self.readings.flow = flow;
        }

        // 4. AC meter
        if due.power {
            self.readings.ac = sensors.read_power(clock.now_ms());
        }

        // 5. Telemetry frame
        if due.telemetry {
            self.send_telemetry(link, sink);
        }

        // 6. One upstream command
        if let Some(line) = link.read_line() {
            info!("Upstream ← {line}");
            let reply = handler::handle_line(
                &line,
                clock.now_ms(),
                &mut self.actuation,
                Peripherals {
                    relays: &mut *relays,
                    sensors: &mut *sensors,
                    events: &mut *sink,
                },
            );
            if let Some(reply) = reply {
                Self::send(link, reply);
            }
        }

        // 7. Actuation timers, at full loop cadence
        for event in self.actuation.tick(clock.now_ms(), relays) {
            Self::send(link, Reply::from(event));
            sink.emit(&AppEvent::Timer(event));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn actuation(&self) -> &ActuationState {
        &self.actuation
    }

    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    pub fn link_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    /// Loop passes executed since startup.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn send(link: &mut impl UpstreamLink, reply: Reply) {
        let text = reply.to_string();
        info!("Upstream → {text}");
        link.write_line(&text);
    }

    fn send_telemetry(&self, link: &mut impl UpstreamLink, sink: &mut impl EventSink) {
        match TelemetryFrame::from(&self.readings).to_json() {
            Ok(json) => {
                link.write_line(&json);
                sink.emit(&AppEvent::Telemetry(self.readings));
            }
            Err(e) => error!("Telemetry: serialisation failed: {e}"),
        }
    }
}
