// ── Session state machine ──
//
// Owns the connection lifecycle, authorization state, pending-setpoint
// state, and the retry countdown for one device. Purely synchronous and
// event-driven: the monitor (or any other host loop) feeds it heartbeat
// ticks, connect results, message results, and setpoint commands, and it
// answers with the next `Action` to perform. No I/O happens here, which is
// what makes every scheduling and authorization rule unit-testable.
//
// Scheduling is a tick countdown: -1 means idle (nothing scheduled), any
// value >= 0 counts down once per tick and the action fires exactly once
// when it reaches 0. Every reply handler reschedules by assigning a new
// countdown from the configured `RetryPolicy`.

use tracing::{debug, error, info, warn};

use atag_api::{AccStatus, PairReply, Reply, RetrieveReply, UpdateReply, decode_reply};

use crate::config::RetryPolicy;
use crate::error::CoreError;
use crate::reading::extract_readings;
use crate::sink::ReadingSink;

/// Lowest accepted target temperature (device limit).
pub const SETPOINT_MIN: f64 = 4.0;
/// Highest accepted target temperature (device limit).
pub const SETPOINT_MAX: f64 = 27.0;

/// Consecutive pairing denials before the log escalates.
const DENIAL_ESCALATION_THRESHOLD: u32 = 3;

const IDLE: i32 = -1;

// ── States ──────────────────────────────────────────────────────────

/// Connection lifecycle, as tracked by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// A connect was requested; its result has not arrived yet. While here
    /// the tick handler stays quiet so connects are never duplicated.
    Connecting,
    Connected,
}

/// Authorization state, driven solely by `acc_status` values in replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthorized,
    /// Pairing requested; the user has not yet confirmed on the device.
    Pending,
    Authorized,
    /// The device explicitly refused pairing.
    Denied,
}

/// What the host loop should send next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestKind {
    Retrieve,
    Pair,
    /// Setpoint update carrying the target temperature.
    Update(f64),
}

/// The machine's answer to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Nothing to do until a later event.
    None,
    /// Establish a connection to the device.
    Connect,
    /// Dispatch one request on the established connection.
    Send(RequestKind),
}

// ── Session ─────────────────────────────────────────────────────────

/// Event-driven session for one device.
///
/// Created once and owned by the host loop; all mutation goes through the
/// event handlers, which serializes access by construction. The sink is
/// injected at construction and receives reading batches as retrieve
/// replies decode.
#[derive(Debug)]
pub struct Session<S> {
    connection: ConnectionState,
    auth: AuthState,
    pending_setpoint: Option<f64>,
    countdown: i32,
    retry: RetryPolicy,
    denial_streak: u32,
    sink: S,
}

impl<S: ReadingSink> Session<S> {
    /// New session. The countdown starts at 0 so the first heartbeat tick
    /// connects immediately.
    pub fn new(retry: RetryPolicy, sink: S) -> Self {
        Self {
            connection: ConnectionState::default(),
            auth: AuthState::default(),
            pending_setpoint: None,
            countdown: 0,
            retry,
            denial_streak: 0,
            sink,
        }
    }

    // ── State accessors ──────────────────────────────────────────────

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn auth(&self) -> AuthState {
        self.auth
    }

    pub fn pending_setpoint(&self) -> Option<f64> {
        self.pending_setpoint
    }

    /// Ticks until the next scheduled action; -1 when idle.
    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── Event: heartbeat tick ────────────────────────────────────────

    /// Advance the countdown by one tick; at zero, decide what to do based
    /// on connection and authorization state.
    pub fn on_tick(&mut self) -> Action {
        if self.countdown < 0 {
            // Idle. In particular: a connect is mid-flight, or we are
            // waiting on a request's reply.
            return Action::None;
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            if self.countdown > 0 {
                return Action::None;
            }
        }

        // Fired: consume the schedule. The outcome of whatever we do next
        // sets the new countdown.
        self.countdown = IDLE;

        if self.connection != ConnectionState::Connected {
            return self.begin_connect();
        }
        if self.auth != AuthState::Authorized {
            return Action::Send(RequestKind::Pair);
        }
        if let Some(value) = self.pending_setpoint.take() {
            return Action::Send(RequestKind::Update(value));
        }
        Action::Send(RequestKind::Retrieve)
    }

    // ── Event: connect result ────────────────────────────────────────

    /// The transport established a connection.
    pub fn on_connect_success(&mut self) -> Action {
        debug!("device connected");
        self.connection = ConnectionState::Connected;

        if self.auth != AuthState::Authorized {
            return Action::Send(RequestKind::Pair);
        }
        // The pending flag is cleared on dispatch, before any reply.
        if let Some(value) = self.pending_setpoint.take() {
            return Action::Send(RequestKind::Update(value));
        }
        Action::Send(RequestKind::Retrieve)
    }

    /// The transport could not establish a connection. Never fatal: back
    /// off for the standard interval and let the heartbeat retry.
    pub fn on_connect_failure(&mut self, status: i32, description: &str) -> Action {
        warn!(status, description, "failed to connect to device");
        self.connection = ConnectionState::Disconnected;
        self.countdown = self.retry.standard;
        Action::None
    }

    // ── Event: message result ────────────────────────────────────────

    /// A response arrived for the outstanding request.
    pub fn on_message(&mut self, http_status: u16, body: &[u8]) -> Action {
        if http_status != 200 {
            error!(http_status, "device returned error status");
            self.countdown = self.retry.standard;
            return Action::None;
        }

        match decode_reply(body) {
            Ok(Reply::Retrieve(reply)) => self.on_retrieve_reply(&reply),
            Ok(Reply::Pair(reply)) => self.on_pair_reply(&reply),
            Ok(Reply::Update(reply)) => self.on_update_reply(&reply),
            Err(e) => {
                error!(error = %e, "undecodable device reply");
                self.countdown = self.retry.standard;
                Action::None
            }
        }
    }

    /// The outstanding request failed at the transport level (reset,
    /// timeout). Treated like a lost connection.
    pub fn on_request_failure(&mut self, description: &str) -> Action {
        warn!(description, "request failed in flight");
        self.connection = ConnectionState::Disconnected;
        self.countdown = self.retry.standard;
        Action::None
    }

    // ── Event: inbound setpoint command ──────────────────────────────

    /// Request a target-temperature change.
    ///
    /// Out-of-range values are rejected locally -- no network traffic.
    /// When no connection is up, the value is parked as the pending
    /// setpoint and dispatched on the next successful connect.
    pub fn set_target_temperature(&mut self, value: f64) -> Result<Action, CoreError> {
        if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&value) {
            error!(value, "setpoint out of range, rejecting locally");
            return Err(CoreError::setpoint_out_of_range(value));
        }

        match self.connection {
            ConnectionState::Connected => Ok(Action::Send(RequestKind::Update(value))),
            ConnectionState::Connecting => {
                // A connect is already in flight; it will pick this up.
                self.pending_setpoint = Some(value);
                Ok(Action::None)
            }
            ConnectionState::Disconnected => {
                self.pending_setpoint = Some(value);
                Ok(self.begin_connect())
            }
        }
    }

    // ── Reply handlers ───────────────────────────────────────────────

    fn on_retrieve_reply(&mut self, reply: &RetrieveReply) -> Action {
        match reply.acc_status() {
            Some(AccStatus::Authorized) => {
                self.auth = AuthState::Authorized;
                self.denial_streak = 0;
                match extract_readings(reply) {
                    Ok(readings) => {
                        for reading in &readings {
                            self.sink.upsert(reading);
                        }
                        debug!(count = readings.len(), "readings published");
                    }
                    Err(e) => error!(error = %e, "incomplete retrieve reply"),
                }
                self.countdown = self.retry.standard;
            }
            Some(AccStatus::Denied) => {
                // Authorization was revoked; retry pairing on the next tick.
                warn!("device no longer authorizes this client");
                self.auth = AuthState::Unauthorized;
                self.countdown = self.retry.immediate;
            }
            Some(AccStatus::NotReady) => {
                debug!("device not ready, backing off");
                self.countdown = self.retry.device_busy;
            }
            other => {
                warn!(acc_status = ?other, "unexpected acc_status in retrieve reply");
                self.countdown = self.retry.standard;
            }
        }
        Action::None
    }

    fn on_pair_reply(&mut self, reply: &PairReply) -> Action {
        match reply.acc_status() {
            Some(AccStatus::Authorized) => {
                info!("pairing authorized by device");
                self.auth = AuthState::Authorized;
                self.denial_streak = 0;
                self.countdown = self.retry.immediate;
            }
            Some(AccStatus::Pending) => {
                info!("pairing pending, confirm on the device display");
                self.auth = AuthState::Pending;
                self.countdown = self.retry.immediate;
            }
            Some(AccStatus::Denied) => {
                self.auth = AuthState::Denied;
                self.denial_streak += 1;
                if self.denial_streak >= DENIAL_ESCALATION_THRESHOLD {
                    warn!(
                        consecutive = self.denial_streak,
                        "pairing keeps being denied; check the device's account list"
                    );
                } else {
                    error!("pairing denied by device");
                }
                self.countdown = self.retry.standard;
            }
            other => {
                error!(acc_status = ?other, "invalid pair reply");
                self.countdown = self.retry.standard;
            }
        }
        Action::None
    }

    fn on_update_reply(&mut self, reply: &UpdateReply) -> Action {
        if reply.acknowledged() {
            debug!("setpoint update acknowledged, refreshing state");
            if self.connection == ConnectionState::Connected {
                return Action::Send(RequestKind::Retrieve);
            }
            return self.begin_connect();
        }

        // No aggressive retry for failed updates; the regular poll cadence
        // continues from whatever was already scheduled. Updates dispatched
        // straight from a fired tick left nothing scheduled, though, so an
        // idle countdown must be re-armed or polling would stop here.
        error!(acc_status = ?reply.acc_status(), "setpoint update not acknowledged");
        if self.countdown < 0 {
            self.countdown = self.retry.standard;
        }
        Action::None
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Single entry point into `Connecting`, so connect-vs-send decisions
    /// always reflect the tracked state.
    fn begin_connect(&mut self) -> Action {
        self.connection = ConnectionState::Connecting;
        Action::Connect
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reading::{Reading, SensorKey};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Sink capturing every upsert, dedupe-free.
    #[derive(Debug, Default)]
    struct RecordingSink {
        upserts: Vec<Reading>,
    }

    impl ReadingSink for RecordingSink {
        fn upsert(&mut self, reading: &Reading) -> bool {
            self.upserts.push(reading.clone());
            true
        }
    }

    fn session() -> Session<RecordingSink> {
        Session::new(RetryPolicy::default(), RecordingSink::default())
    }

    /// Drive a fresh session to Connected + Authorized.
    fn authorized_connected_session() -> Session<RecordingSink> {
        let mut s = session();
        assert_eq!(s.on_tick(), Action::Connect);
        assert_eq!(s.on_connect_success(), Action::Send(RequestKind::Pair));
        let body = json!({ "pair_reply": { "acc_status": 2, "status": {} } }).to_string();
        s.on_message(200, body.as_bytes());
        assert_eq!(s.auth(), AuthState::Authorized);
        s
    }

    fn retrieve_body(room: f64, target: f64, boiler: i64) -> String {
        json!({
            "retrieve_reply": {
                "seqnr": 1,
                "acc_status": 2,
                "status": {},
                "report": { "room_temp": room, "boiler_status": boiler },
                "control": { "ch_mode_temp": target }
            }
        })
        .to_string()
    }

    // ── Countdown mechanics ──────────────────────────────────────────

    #[test]
    fn first_tick_connects_immediately() {
        let mut s = session();
        assert_eq!(s.on_tick(), Action::Connect);
        assert_eq!(s.connection(), ConnectionState::Connecting);
    }

    #[test]
    fn countdown_fires_exactly_once_and_never_goes_below_idle() {
        let mut s = session();
        s.on_tick();
        s.on_connect_failure(7, "timeout"); // countdown = 6

        // Five quiet ticks.
        for expected in (1..=5).rev() {
            assert_eq!(s.on_tick(), Action::None);
            assert_eq!(s.countdown(), expected);
        }
        // Sixth tick fires.
        assert_eq!(s.on_tick(), Action::Connect);
        assert_eq!(s.countdown(), IDLE);

        // Further ticks while mid-connect stay idle -- no duplicate connects.
        for _ in 0..10 {
            assert_eq!(s.on_tick(), Action::None);
            assert_eq!(s.countdown(), IDLE);
        }
    }

    #[test]
    fn tick_while_connecting_is_suppressed() {
        let mut s = session();
        assert_eq!(s.on_tick(), Action::Connect);
        assert_eq!(s.connection(), ConnectionState::Connecting);
        assert_eq!(s.on_tick(), Action::None);
    }

    #[test]
    fn tick_when_connected_but_unauthorized_sends_pair() {
        let mut s = session();
        s.on_tick();
        s.on_connect_success();
        // Pair reply pending: countdown 1, auth Pending.
        let body = json!({ "pair_reply": { "acc_status": 1, "status": {} } }).to_string();
        s.on_message(200, body.as_bytes());

        assert_eq!(s.on_tick(), Action::Send(RequestKind::Pair));
    }

    #[test]
    fn tick_when_authorized_sends_retrieve() {
        let mut s = authorized_connected_session();
        assert_eq!(s.countdown(), 1); // immediate after pairing
        assert_eq!(s.on_tick(), Action::Send(RequestKind::Retrieve));
    }

    // ── Connect results ──────────────────────────────────────────────

    #[test]
    fn connect_failure_schedules_standard_backoff() {
        let mut s = session();
        s.on_tick();

        let action = s.on_connect_failure(7, "timeout");

        assert_eq!(action, Action::None);
        assert_eq!(s.countdown(), 6);
        assert_eq!(s.connection(), ConnectionState::Disconnected);
    }

    #[test]
    fn connect_success_unauthorized_sends_pair() {
        let mut s = session();
        s.on_tick();
        assert_eq!(s.on_connect_success(), Action::Send(RequestKind::Pair));
        assert_eq!(s.connection(), ConnectionState::Connected);
    }

    // ── Setpoint commands ────────────────────────────────────────────

    #[test]
    fn setpoint_below_range_rejected_without_dispatch() {
        let mut s = session();

        let err = s.set_target_temperature(3.9).unwrap_err();

        assert!(matches!(err, CoreError::SetpointOutOfRange { .. }));
        assert_eq!(s.pending_setpoint(), None);
        assert_eq!(s.connection(), ConnectionState::Disconnected);
    }

    #[test]
    fn setpoint_above_range_rejected_without_dispatch() {
        let mut s = session();
        assert!(s.set_target_temperature(27.1).is_err());
        assert_eq!(s.pending_setpoint(), None);
    }

    #[test]
    fn setpoint_bounds_are_inclusive() {
        let mut s = authorized_connected_session();
        assert_eq!(
            s.set_target_temperature(4.0).unwrap(),
            Action::Send(RequestKind::Update(4.0))
        );
        assert_eq!(
            s.set_target_temperature(27.0).unwrap(),
            Action::Send(RequestKind::Update(27.0))
        );
    }

    #[test]
    fn setpoint_while_connected_dispatches_immediately() {
        let mut s = authorized_connected_session();

        let action = s.set_target_temperature(21.5).unwrap();

        assert_eq!(action, Action::Send(RequestKind::Update(21.5)));
        assert_eq!(s.pending_setpoint(), None);
    }

    #[test]
    fn setpoint_while_disconnected_parks_and_connects() {
        let mut s = authorized_connected_session();
        s.on_request_failure("connection reset"); // back to Disconnected

        let action = s.set_target_temperature(21.5).unwrap();

        assert_eq!(action, Action::Connect);
        assert_eq!(s.pending_setpoint(), Some(21.5));

        // Connect succeeds with prior Authorized state: the update goes out
        // and the pending flag is cleared before any reply arrives.
        let next = s.on_connect_success();
        assert_eq!(next, Action::Send(RequestKind::Update(21.5)));
        assert_eq!(s.pending_setpoint(), None);
    }

    #[test]
    fn setpoint_while_connecting_parks_without_second_connect() {
        let mut s = session();
        s.on_tick(); // Connecting

        let action = s.set_target_temperature(19.0).unwrap();

        assert_eq!(action, Action::None);
        assert_eq!(s.pending_setpoint(), Some(19.0));
    }

    #[test]
    fn pending_setpoint_survives_pairing_and_fires_on_tick() {
        let mut s = session();
        s.set_target_temperature(22.0).unwrap(); // parks + Connect
        s.on_connect_success(); // unauthorized -> Pair first
        assert_eq!(s.pending_setpoint(), Some(22.0));

        let body = json!({ "pair_reply": { "acc_status": 2, "status": {} } }).to_string();
        s.on_message(200, body.as_bytes());

        // Next tick dispatches the parked update instead of a retrieve.
        assert_eq!(s.on_tick(), Action::Send(RequestKind::Update(22.0)));
        assert_eq!(s.pending_setpoint(), None);
    }

    // ── Retrieve replies ─────────────────────────────────────────────

    #[test]
    fn retrieve_reply_publishes_room_and_target_once() {
        let mut s = authorized_connected_session();

        let action = s.on_message(200, retrieve_body(19.5, 20.0, 8).as_bytes());

        assert_eq!(action, Action::None);
        assert_eq!(s.countdown(), 6);

        let upserts = &s.sink().upserts;
        let rooms: Vec<&Reading> = upserts.iter().filter(|r| r.key == SensorKey::RoomTemp).collect();
        let targets: Vec<&Reading> =
            upserts.iter().filter(|r| r.key == SensorKey::TargetTemp).collect();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].value, 19.5);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].value, 20.0);
        assert_eq!(targets[0].flame, Some(true)); // boiler_status bit 8
    }

    #[test]
    fn retrieve_reply_missing_room_temp_publishes_nothing() {
        let mut s = authorized_connected_session();
        let body = json!({
            "retrieve_reply": {
                "acc_status": 2,
                "report": { "boiler_status": 8 },
                "control": { "ch_mode_temp": 20.0 }
            }
        })
        .to_string();

        s.on_message(200, body.as_bytes());

        assert!(s.sink().upserts.is_empty());
        assert_eq!(s.countdown(), 6);
    }

    #[test]
    fn retrieve_reply_denied_marks_unauthorized_and_retries_soon() {
        let mut s = authorized_connected_session();
        let body = json!({ "retrieve_reply": { "acc_status": 3 } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.auth(), AuthState::Unauthorized);
        assert_eq!(s.countdown(), 1);
    }

    #[test]
    fn retrieve_reply_not_ready_backs_off_longer() {
        let mut s = authorized_connected_session();
        let body = json!({ "retrieve_reply": { "acc_status": 0 } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.countdown(), 12);
    }

    #[test]
    fn retrieve_reply_unknown_status_uses_standard_backoff() {
        let mut s = authorized_connected_session();
        let body = json!({ "retrieve_reply": { "acc_status": 5 } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.countdown(), 6);
    }

    // ── Pair replies ─────────────────────────────────────────────────

    #[test]
    fn pair_reply_pending_keeps_auth_pending_with_countdown_one() {
        let mut s = session();
        s.on_tick();
        s.on_connect_success();
        let body = json!({ "pair_reply": { "acc_status": 1, "status": {} } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.auth(), AuthState::Pending);
        assert_eq!(s.countdown(), 1);
    }

    #[test]
    fn pair_reply_denied_standard_backoff() {
        let mut s = session();
        s.on_tick();
        s.on_connect_success();
        let body = json!({ "pair_reply": { "acc_status": 3, "status": {} } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.auth(), AuthState::Denied);
        assert_eq!(s.countdown(), 6);
    }

    #[test]
    fn pair_reply_missing_status_is_invalid() {
        let mut s = session();
        s.on_tick();
        s.on_connect_success();
        let body = json!({ "pair_reply": { "status": {} } }).to_string();

        s.on_message(200, body.as_bytes());

        assert_eq!(s.auth(), AuthState::Unauthorized);
        assert_eq!(s.countdown(), 6);
    }

    // ── Update replies ───────────────────────────────────────────────

    #[test]
    fn update_ack_while_connected_refreshes_immediately() {
        let mut s = authorized_connected_session();
        let body = json!({ "update_reply": { "acc_status": 2, "status": {} } }).to_string();

        let action = s.on_message(200, body.as_bytes());

        assert_eq!(action, Action::Send(RequestKind::Retrieve));
    }

    #[test]
    fn update_ack_while_disconnected_reconnects_first() {
        let mut s = authorized_connected_session();
        // The reply races a drop: the machine already observed a disconnect.
        s.on_request_failure("reset");
        let countdown_before = s.countdown();
        let body = json!({ "update_reply": { "acc_status": 2, "status": {} } }).to_string();

        let action = s.on_message(200, body.as_bytes());

        assert_eq!(action, Action::Connect);
        assert_eq!(s.connection(), ConnectionState::Connecting);
        // Ack handling leaves the countdown alone.
        assert_eq!(s.countdown(), countdown_before);
    }

    #[test]
    fn unacked_update_from_tick_rearms_polling() {
        // The update goes out from a fired tick, so nothing is scheduled
        // while its reply is outstanding. An unacknowledged reply must
        // re-arm the countdown instead of leaving the session idle forever.
        let mut s = session();
        s.set_target_temperature(22.0).unwrap(); // parks + Connect
        s.on_connect_success();
        let pair = json!({ "pair_reply": { "acc_status": 2, "status": {} } }).to_string();
        s.on_message(200, pair.as_bytes());

        assert_eq!(s.on_tick(), Action::Send(RequestKind::Update(22.0)));
        assert_eq!(s.countdown(), IDLE);

        let body = json!({ "update_reply": { "acc_status": 2 } }).to_string(); // no status block
        assert_eq!(s.on_message(200, body.as_bytes()), Action::None);
        assert_eq!(s.countdown(), 6);

        // Polling resumes on the standard cadence.
        let mut fired = None;
        for tick in 1..=6 {
            if s.on_tick() != Action::None {
                fired = Some(tick);
                break;
            }
        }
        assert_eq!(fired, Some(6));
    }

    #[test]
    fn update_failure_does_not_reschedule() {
        let mut s = authorized_connected_session();
        let countdown_before = s.countdown();
        let body = json!({ "update_reply": { "acc_status": 2 } }).to_string(); // no status block

        let action = s.on_message(200, body.as_bytes());

        assert_eq!(action, Action::None);
        assert_eq!(s.countdown(), countdown_before);
    }

    // ── Message error paths ──────────────────────────────────────────

    #[test]
    fn non_200_status_standard_backoff_no_teardown() {
        let mut s = authorized_connected_session();

        let action = s.on_message(503, b"busy");

        assert_eq!(action, Action::None);
        assert_eq!(s.countdown(), 6);
        assert_eq!(s.connection(), ConnectionState::Connected);
    }

    #[test]
    fn unknown_reply_key_is_transient() {
        let mut s = authorized_connected_session();

        s.on_message(200, br#"{"mystery_reply":{}}"#);

        assert_eq!(s.countdown(), 6);
    }

    #[test]
    fn malformed_json_is_transient() {
        let mut s = authorized_connected_session();

        s.on_message(200, b"\xff\xfe not json");

        assert_eq!(s.countdown(), 6);
    }

    // ── End-to-end poll cycle ────────────────────────────────────────

    #[test]
    fn full_poll_cycle_round_trip() {
        let mut s = session();

        // Tick 1: connect.
        assert_eq!(s.on_tick(), Action::Connect);
        // Connect up, unauthorized: pair, immediately authorized.
        assert_eq!(s.on_connect_success(), Action::Send(RequestKind::Pair));
        let pair = json!({ "pair_reply": { "acc_status": 2, "status": {} } }).to_string();
        assert_eq!(s.on_message(200, pair.as_bytes()), Action::None);

        // Next tick: retrieve fires; synthetic reply publishes readings.
        assert_eq!(s.on_tick(), Action::Send(RequestKind::Retrieve));
        s.on_message(200, retrieve_body(19.5, 20.0, 8).as_bytes());

        let upserts = &s.sink().upserts;
        assert_eq!(upserts.len(), 2);
        assert_eq!(upserts[0].key, SensorKey::TargetTemp);
        assert_eq!(upserts[0].value, 20.0);
        assert_eq!(upserts[0].flame, Some(true));
        assert_eq!(upserts[1].key, SensorKey::RoomTemp);
        assert_eq!(upserts[1].value, 19.5);

        // Back on the standard cadence.
        assert_eq!(s.countdown(), 6);
    }
}
