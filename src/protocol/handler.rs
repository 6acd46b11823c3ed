//! Command dispatch and relay-ownership arbitration.
//!
//! One parsed [`Command`] in, at most one [`Reply`] out.  This is the only
//! code outside `actuation` that mutates relays or timers, and it does so
//! through the [`ActuationState`] it is handed.
//!
//! Arbitration rule for bulk `RELAY:` patterns: a running pump timer owns
//! its channel, so a request to turn that channel Off is rewritten to On
//! before the pattern is applied.  The fan channel is not protected.

use log::{debug, info, warn};

use super::command::{self, Command, ConfigToggle};
use super::reply::Reply;
use crate::actuation::ActuationState;
use crate::actuation::pump::{PumpKind, PumpStart};
use crate::actuation::relay::{RelayPattern, RelayState};
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RelayOutputPort, SensorControlPort};

/// Everything a command may touch besides the actuation state.
pub struct Peripherals<'a, O, S, E> {
    pub relays: &'a mut O,
    pub sensors: &'a mut S,
    pub events: &'a mut E,
}

/// Parse and execute one received line.
pub fn handle_line<O, S, E>(
    line: &str,
    now: u32,
    act: &mut ActuationState,
    p: Peripherals<'_, O, S, E>,
) -> Option<Reply>
where
    O: RelayOutputPort,
    S: SensorControlPort,
    E: EventSink,
{
    match command::parse(line) {
        Ok(cmd) => dispatch(cmd, now, act, p),
        Err(e) => {
            warn!("Upstream: rejected '{line}': {e}");
            p.events.emit(&AppEvent::CommandRejected(e));
            Some(Reply::Rejected(e))
        }
    }
}

/// Execute an already-parsed command.
pub fn dispatch<O, S, E>(
    cmd: Command<'_>,
    now: u32,
    act: &mut ActuationState,
    p: Peripherals<'_, O, S, E>,
) -> Option<Reply>
where
    O: RelayOutputPort,
    S: SensorControlPort,
    E: EventSink,
{
    debug!("Upstream: {cmd:?}");
    match cmd {
        Command::Handshake => Some(Reply::HandshakeOk),

        Command::FanTiming {
            channel,
            on_ms,
            off_ms,
        } => match act.start_fan(on_ms, off_ms, channel, now) {
            Ok(()) => Some(Reply::FanTimingOk),
            // Parser bounds the channel, so this is unreachable in practice.
            Err(e) => {
                warn!("Fan start refused: {e}");
                Some(Reply::Rejected(crate::error::ProtocolError::InvalidRelay(
                    crate::error::Verb::FanTiming,
                )))
            }
        },

        Command::PumpTiming { dose, duration_ms } => {
            let kind = dose.pump();
            info!("{kind:?} pump requested for {duration_ms} ms ({dose:?})");
            match act.start_pump(kind, duration_ms, now, p.relays) {
                PumpStart::Started { .. } => Some(Reply::PumpTimingOk(kind)),
                PumpStart::Stopped(stop) => Some(Reply::PumpStopped(kind, stop)),
            }
        }

        Command::RelayPattern(requested) => {
            let applied = protect_pump_channels(act, requested);
            let overridden = requested.bits() ^ applied.bits();
            if overridden != 0 {
                info!("Relay pattern {requested} overridden to {applied} (pump channels in use)");
            }
            let changed = act.relays_mut().apply_pattern(applied, p.relays);
            p.events.emit(&AppEvent::PatternApplied {
                requested,
                applied,
                overridden,
                changed,
            });
            Some(Reply::RelayOk)
        }

        Command::RelayStatus => Some(Reply::RelayStatus(act.relays().snapshot())),

        Command::Config(toggle) => {
            match toggle {
                ConfigToggle::EcRange(range) => p.sensors.set_ec_range(range),
                ConfigToggle::ResetEnergy => {
                    if !p.sensors.reset_energy() {
                        warn!("AC meter did not acknowledge energy reset");
                    }
                }
                ConfigToggle::ResetFlow => p.sensors.reset_flow_totals(),
            }
            info!("Config applied: {toggle:?}");
            Some(Reply::ConfigOk(toggle))
        }

        Command::Unknown(text) => {
            if command::is_echo_token(text) {
                debug!("Upstream: ignoring echo token {text}");
                return None;
            }
            warn!("Upstream: unknown command '{text}'");
            p.events.emit(&AppEvent::UnknownCommand);
            Some(Reply::UnknownCommand)
        }
    }
}

/// Force each running pump's channel On in `pattern`.
pub fn protect_pump_channels(act: &ActuationState, pattern: RelayPattern) -> RelayPattern {
    [PumpKind::Ec, PumpKind::Ph]
        .into_iter()
        .filter(|&kind| act.pump(kind).is_running())
        .fold(pattern, |p, kind| {
            if p.get(kind.channel()).is_on() {
                p
            } else {
                p.with(kind.channel(), RelayState::On)
            }
        })
}
