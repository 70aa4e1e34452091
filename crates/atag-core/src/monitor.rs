// ── Monitor ──
//
// Async owner of one `Session`. A single task serializes the three event
// sources the machine cares about -- the heartbeat interval, transport
// results, and inbound setpoint commands -- so the session is never
// touched concurrently. Consumers talk to the task through a
// `MonitorHandle`: a command channel for setpoint changes, a watch channel
// for connection state, and a broadcast channel republishing readings as
// they change.

use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{MissedTickBehavior, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use atag_api::{DeviceClient, InfoFlags, Request, TransportConfig};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::reading::Reading;
use crate::session::{Action, ConnectionState, RequestKind, Session};
use crate::sink::{MemorySink, ReadingSink};

const COMMAND_CHANNEL_SIZE: usize = 16;
const READING_CHANNEL_SIZE: usize = 64;

// ── Handle ──────────────────────────────────────────────────────────

/// Consumer-side handle to a running [`Monitor`]. Cheap to clone.
#[derive(Clone)]
pub struct MonitorHandle {
    command_tx: mpsc::Sender<MonitorCommand>,
    connection_rx: watch::Receiver<ConnectionState>,
    readings_tx: broadcast::Sender<Reading>,
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Request a target-temperature change.
    ///
    /// Resolves as soon as the command is validated and accepted by the
    /// session -- dispatch to the device happens asynchronously (the value
    /// is parked as the pending setpoint if no connection is up).
    pub async fn set_target_temperature(&self, value: f64) -> Result<(), CoreError> {
        let (respond, response) = oneshot::channel();
        self.command_tx
            .send(MonitorCommand::SetTarget { value, respond })
            .await
            .map_err(|_| CoreError::MonitorStopped)?;
        response.await.map_err(|_| CoreError::MonitorStopped)?
    }

    /// Subscribe to changed readings.
    pub fn readings(&self) -> broadcast::Receiver<Reading> {
        self.readings_tx.subscribe()
    }

    /// Observe connection state changes.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection_rx.clone()
    }

    /// Stop the monitor loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

enum MonitorCommand {
    SetTarget {
        value: f64,
        respond: oneshot::Sender<Result<(), CoreError>>,
    },
}

// ── Publishing sink ─────────────────────────────────────────────────

/// Sink wrapping a [`MemorySink`] for dedupe, broadcasting every reading
/// that actually changed.
#[derive(Debug)]
struct PublishSink {
    inner: MemorySink,
    tx: broadcast::Sender<Reading>,
}

impl ReadingSink for PublishSink {
    fn upsert(&mut self, reading: &Reading) -> bool {
        let changed = self.inner.upsert(reading);
        if changed {
            // Lagging/absent subscribers are fine; readings are ephemeral.
            let _ = self.tx.send(reading.clone());
        }
        changed
    }
}

// ── Monitor ─────────────────────────────────────────────────────────

/// The polling loop driving one device session.
pub struct Monitor {
    config: MonitorConfig,
    client: DeviceClient,
    session: Session<PublishSink>,
    command_rx: mpsc::Receiver<MonitorCommand>,
    connection_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Monitor {
    /// Build a monitor and its handle. Does not poll until
    /// [`run()`](Self::run) is awaited.
    pub fn new(config: MonitorConfig) -> Result<(Self, MonitorHandle), CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        let client = DeviceClient::new(
            &config.host,
            config.port,
            config.identity.clone(),
            &transport,
        )?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::Disconnected);
        let (readings_tx, _) = broadcast::channel(READING_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let session = Session::new(
            config.retry,
            PublishSink {
                inner: MemorySink::new(),
                tx: readings_tx.clone(),
            },
        );

        let handle = MonitorHandle {
            command_tx,
            connection_rx,
            readings_tx,
            cancel: cancel.clone(),
        };

        Ok((
            Self {
                config,
                client,
                session,
                command_rx,
                connection_tx,
                cancel,
            },
            handle,
        ))
    }

    /// Run the poll loop until the handle cancels it.
    ///
    /// The interval's first tick fires immediately, and the session's
    /// initial countdown is zero, so the first connect happens right away.
    pub async fn run(mut self) {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            host = %self.config.host,
            port = self.config.port,
            "monitor started"
        );

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command).await;
                }
                _ = heartbeat.tick() => {
                    let action = self.session.on_tick();
                    self.drive(action).await;
                }
            }
            self.publish_connection_state();
        }

        info!("monitor stopped");
    }

    async fn handle_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::SetTarget { value, respond } => {
                match self.session.set_target_temperature(value) {
                    Ok(action) => {
                        let _ = respond.send(Ok(()));
                        self.drive(action).await;
                    }
                    Err(e) => {
                        let _ = respond.send(Err(e));
                    }
                }
            }
        }
    }

    /// Execute actions until the session settles back to `None`.
    ///
    /// Each transport operation produces exactly one follow-up event, so
    /// this chain is short and bounded (connect -> send -> maybe one
    /// refresh retrieve).
    async fn drive(&mut self, mut action: Action) {
        loop {
            self.publish_connection_state();
            action = match action {
                Action::None => break,
                Action::Connect => self.connect().await,
                Action::Send(kind) => self.send(kind).await,
            };
        }
    }

    /// Reachability probe standing in for the host platform's connect
    /// callback: a TCP handshake against the device port, bounded by the
    /// configured timeout so the machine always gets a result.
    async fn connect(&mut self) -> Action {
        let address = (self.config.host.clone(), self.config.port);

        match timeout(self.config.timeout, TcpStream::connect(address)).await {
            Ok(Ok(_)) => {
                debug!("device reachable");
                self.session.on_connect_success()
            }
            Ok(Err(e)) => self
                .session
                .on_connect_failure(e.raw_os_error().unwrap_or(-1), &e.to_string()),
            Err(_) => {
                let description =
                    format!("connect timed out after {:?}", self.config.timeout);
                self.session.on_connect_failure(-1, &description)
            }
        }
    }

    async fn send(&mut self, kind: RequestKind) -> Action {
        let request = self.build_request(kind);

        match self.client.send(&request).await {
            Ok((status, body)) => self.session.on_message(status, &body),
            Err(e) => {
                warn!(kind = request.kind(), error = %e, "device request failed");
                self.session.on_request_failure(&e.to_string())
            }
        }
    }

    fn build_request(&self, kind: RequestKind) -> Request {
        match kind {
            RequestKind::Retrieve => self.client.retrieve_request(InfoFlags::default()),
            RequestKind::Pair => self.client.pair_request(),
            RequestKind::Update(value) => self.client.update_request(value),
        }
    }

    fn publish_connection_state(&self) {
        let state = self.session.connection();
        self.connection_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

/// One-shot: start a monitor, run a closure against its handle, shut down.
pub async fn with_monitor<F, Fut, T>(config: MonitorConfig, f: F) -> Result<T, CoreError>
where
    F: FnOnce(MonitorHandle) -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let (monitor, handle) = Monitor::new(config)?;
    let task = tokio::spawn(monitor.run());

    let result = f(handle.clone()).await;

    handle.shutdown();
    let _ = task.await;
    result
}
