//! Session orchestration: handshake, routing, reconnect and the public
//! client handle.
//!
//! [`SessionClient`] is a thin cloneable handle; all protocol state lives
//! in a background task ([`SessionManager`]) that owns the transport, the
//! listener registry and the outbound queue, and processes commands and
//! socket events one at a time. Timers (handshake settle, ack delay,
//! disconnect grace, reconnect throttle) are spawned sleeps that feed
//! internal commands back into the same loop; a generation counter ties
//! each timer to the connection it was armed for, so a timer from a
//! superseded connection expires harmlessly.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, warn};

use crate::core::constants::{
    names, payloads, ABNORMAL_CLOSE, ACK_DELAY, DISCONNECT_DEBOUNCE, DISCONNECT_GRACE,
    NORMAL_CLOSE, RECONNECT_WINDOW, SEND_GAP, SETTLE_DELAY,
};
#[cfg(feature = "websocket")]
use crate::core::error::ClientError;
use crate::core::traits::{Cipher, Compressor};
use crate::session::listeners::{sanitize_name, ListenerFn, ListenerRegistry};
use crate::session::reconnect::ReconnectPolicy;
use crate::session::state::{PriorSessionState, SessionPhase, SessionState};
use crate::transport::queue::OutboundQueue;
use crate::transport::socket::{Connector, Transport, TransportEvent};
use crate::wire::codec::FrameCodec;
use crate::wire::frame::{
    AppFrame, DisconnectNotice, HandshakeAck, HandshakeOffer, InboundFrame, ListenerControl,
    MigrateFrame,
};

/// Session client configuration.
///
/// Only the origin is required. The delay knobs default to the reference
/// values; they shape observable latency but not protocol correctness.
#[derive(Clone)]
pub struct SessionConfig {
    /// Origin to connect to (`http(s)://…` or `ws(s)://…`); the WebSocket
    /// endpoint is derived by scheme swap plus the `/ws` path.
    pub origin: String,
    /// Whether transient closes trigger automatic reconnection.
    pub auto_reconnect: bool,
    /// Compression capability. Absent means sessions never negotiate
    /// compression.
    pub compressor: Option<Arc<dyn Compressor>>,
    /// Cipher capability. Reserved: carried but never invoked.
    pub cipher: Option<Arc<dyn Cipher>>,
    /// Delay between a handshake offer and session-state creation.
    pub settle_delay: Duration,
    /// Delay between state creation and the handshake acknowledgment.
    pub ack_delay: Duration,
    /// Trailing guard between outbound transmissions.
    pub send_gap: Duration,
    /// Grace period before the socket is forced closed on disconnect.
    pub disconnect_grace: Duration,
    /// Minimum interval between two connect attempts.
    pub reconnect_window: Duration,
    /// Minimum interval between two disconnect notifications.
    pub disconnect_debounce: Duration,
}

impl SessionConfig {
    /// Create a configuration for the given origin with default values.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            auto_reconnect: true,
            compressor: None,
            cipher: None,
            settle_delay: SETTLE_DELAY,
            ack_delay: ACK_DELAY,
            send_gap: SEND_GAP,
            disconnect_grace: DISCONNECT_GRACE,
            reconnect_window: RECONNECT_WINDOW,
            disconnect_debounce: DISCONNECT_DEBOUNCE,
        }
    }

    /// Enable or disable automatic reconnection.
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Inject a compression capability.
    #[must_use]
    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Inject a cipher capability (reserved, unused).
    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Set the handshake settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the acknowledgment delay.
    #[must_use]
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    /// Set the trailing guard between transmissions.
    #[must_use]
    pub fn with_send_gap(mut self, gap: Duration) -> Self {
        self.send_gap = gap;
        self
    }

    /// Set the disconnect grace period.
    #[must_use]
    pub fn with_disconnect_grace(mut self, grace: Duration) -> Self {
        self.disconnect_grace = grace;
        self
    }

    /// Set the reconnect throttle window.
    #[must_use]
    pub fn with_reconnect_window(mut self, window: Duration) -> Self {
        self.reconnect_window = window;
        self
    }

    /// Set the disconnect notification debounce.
    #[must_use]
    pub fn with_disconnect_debounce(mut self, debounce: Duration) -> Self {
        self.disconnect_debounce = debounce;
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("origin", &self.origin)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("compression", &self.compressor.is_some())
            .finish()
    }
}

/// Commands processed by the session loop. Public API calls and internal
/// timers both arrive through this channel, so every state transition
/// happens in one place.
enum Command {
    Reconnect,
    Subscribe {
        name: String,
        callback: Option<ListenerFn>,
    },
    Unsubscribe {
        name: String,
        keep_callbacks: bool,
    },
    Send {
        name: String,
        data: Value,
    },
    Disconnect {
        code: u16,
    },
    Reserved {
        name: &'static str,
        callback: ListenerFn,
    },
    Shutdown,
    // Timer-driven continuations, tagged with the connection generation
    // they were armed for.
    SettleElapsed {
        offer: HandshakeOffer,
        generation: u64,
    },
    AckDue {
        generation: u64,
    },
    ForceClose {
        generation: u64,
        code: u16,
    },
    RetryDue {
        generation: u64,
    },
}

/// Operation buffered while no session is ready; materialized into frames,
/// in arrival order, right after the handshake acknowledgment is queued.
enum PendingOp {
    Announce(String),
    Renounce(String),
    App { name: String, data: Value },
    Notice { code: u16 },
}

/// Cloneable handle to a running session task.
///
/// All methods are fire-and-forget: failures are absorbed by the session
/// loop (silent drop, or reconnection), never surfaced here. Listener
/// callbacks run on the session task; panics inside them are the caller's
/// responsibility and will take the task down.
#[derive(Clone)]
pub struct SessionClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    ready_rx: watch::Receiver<bool>,
}

impl SessionClient {
    /// Connect to an origin over WebSocket and spawn the session task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the origin does not start with
    /// `http(s)://` or `ws(s)://`.
    #[cfg(feature = "websocket")]
    #[cfg_attr(docsrs, doc(cfg(feature = "websocket")))]
    pub fn connect(config: SessionConfig) -> Result<Self, ClientError> {
        let url = crate::transport::socket::websocket_url(&config.origin)?;
        Ok(Self::with_connector(
            config,
            Arc::new(crate::transport::socket::WsConnector::new(url)),
        ))
    }

    /// Spawn the session task over a custom [`Connector`] (tests or
    /// alternative transports).
    pub fn with_connector(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = watch::channel(false);
        let manager = SessionManager::new(config, connector, cmd_tx.clone(), cmd_rx, ready_tx);
        drop(tokio::spawn(manager.run()));
        Self { cmd_tx, ready_rx }
    }

    /// Suspend until the session is READY (a session state exists).
    ///
    /// Wakes exactly when readiness flips; returns immediately when the
    /// session is already ready. Also returns if the session task exited.
    pub async fn ready(&self) {
        let mut rx = self.ready_rx.clone();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Whether a session is currently READY.
    pub fn is_ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Initiate or repair the connection.
    ///
    /// A no-op while a session is live; otherwise opens a fresh transport,
    /// throttled by the reconnect window.
    pub fn reconnect(&self) {
        let _ = self.cmd_tx.send(Command::Reconnect);
    }

    /// Subscribe to a named event with a callback.
    ///
    /// The name is sanitized to `[A-Za-z0-9_-]`; an empty result is a
    /// silent no-op. The subscription is announced to the server once a
    /// session is ready, and re-announced after every reconnect.
    pub fn on(&self, name: &str, callback: impl Fn(&Value) + Send + Sync + 'static) {
        let _ = self.cmd_tx.send(Command::Subscribe {
            name: name.to_string(),
            callback: Some(Arc::new(callback)),
        });
    }

    /// Subscribe to a named event without attaching a callback (announce
    /// only).
    pub fn subscribe(&self, name: &str) {
        let _ = self.cmd_tx.send(Command::Subscribe {
            name: name.to_string(),
            callback: None,
        });
    }

    /// Unsubscribe from a named event.
    ///
    /// With `keep_callbacks` the callback list survives locally and only
    /// the server-side announcement is withdrawn.
    pub fn off(&self, name: &str, keep_callbacks: bool) {
        let _ = self.cmd_tx.send(Command::Unsubscribe {
            name: name.to_string(),
            keep_callbacks,
        });
    }

    /// Queue an application frame for transmission.
    ///
    /// Buffered until a session is ready; invalid names are silent no-ops.
    pub fn send(&self, name: &str, data: Value) {
        let _ = self.cmd_tx.send(Command::Send {
            name: name.to_string(),
            data,
        });
    }

    /// Request a graceful close with the given code.
    ///
    /// Codes below 1000 are normalized by adding 1000. The server is
    /// informed first; the socket is forced closed after the grace period
    /// if the peer has not closed it by then.
    pub fn disconnect(&self, code: u16) {
        let _ = self.cmd_tx.send(Command::Disconnect { code });
    }

    /// Register a connect listener.
    ///
    /// Invoked with `true` on the initial connection (or immediately, when
    /// registered while a session is already live) and `false` after each
    /// reconnect.
    pub fn on_connected(&self, callback: impl Fn(bool) + Send + Sync + 'static) {
        let _ = self.cmd_tx.send(Command::Reserved {
            name: names::CONNECT,
            callback: Arc::new(move |v: &Value| callback(v.as_bool().unwrap_or(false))),
        });
    }

    /// Register a disconnect listener, invoked with the effective close
    /// code.
    pub fn on_disconnected(&self, callback: impl Fn(u16) + Send + Sync + 'static) {
        let _ = self.cmd_tx.send(Command::Reserved {
            name: names::DISCONNECT,
            callback: Arc::new(move |v: &Value| {
                callback(v.as_u64().unwrap_or(u64::from(NORMAL_CLOSE)) as u16);
            }),
        });
    }

    /// Register an error listener, invoked with the `@error` payload.
    pub fn on_error(&self, callback: impl Fn(&Value) + Send + Sync + 'static) {
        let _ = self.cmd_tx.send(Command::Reserved {
            name: names::ERROR,
            callback: Arc::new(callback),
        });
    }

    /// Tear down the session task. The transport is dropped without a
    /// close handshake; use [`SessionClient::disconnect`] first for a
    /// graceful exit.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// The session event loop. Owns every piece of mutable protocol state.
struct SessionManager {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    codec: FrameCodec,
    policy: ReconnectPolicy,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    ready_tx: watch::Sender<bool>,

    transport: Option<Box<dyn Transport>>,
    /// Bumped on every transport open and loss; stale timers carry an
    /// older value and are ignored.
    generation: u64,
    phase: SessionPhase,
    state: Option<SessionState>,
    prior: Option<PriorSessionState>,
    listeners: ListenerRegistry,
    queue: OutboundQueue,
    pending: VecDeque<PendingOp>,
    /// The handshake ack has been queued; ready-gated operations may now
    /// enqueue frames directly without jumping ahead of it.
    ack_enqueued: bool,
    ever_connected: bool,
    last_attempt: Option<Instant>,
    last_disconnect_notify: Option<Instant>,
    requested_close: Option<u16>,
}

impl SessionManager {
    fn new(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        cmd_tx: mpsc::UnboundedSender<Command>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        ready_tx: watch::Sender<bool>,
    ) -> Self {
        let codec = FrameCodec::new(config.compressor.clone());
        let policy = ReconnectPolicy {
            auto_reconnect: config.auto_reconnect,
            reconnect_window: config.reconnect_window,
            debounce: config.disconnect_debounce,
        };
        let queue = OutboundQueue::new(config.send_gap);
        Self {
            config,
            connector,
            codec,
            policy,
            cmd_tx,
            cmd_rx,
            ready_tx,
            transport: None,
            generation: 0,
            phase: SessionPhase::NoSession,
            state: None,
            prior: None,
            listeners: ListenerRegistry::new(),
            queue,
            pending: VecDeque::new(),
            ack_enqueued: false,
            ever_connected: false,
            last_attempt: None,
            last_disconnect_notify: None,
            requested_close: None,
        }
    }

    async fn run(mut self) {
        self.open_transport().await;

        loop {
            let deadline = if self.transport.is_some() {
                self.queue.next_deadline()
            } else {
                None
            };

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd).await {
                                break;
                            }
                        }
                        // Every client handle dropped.
                        None => break,
                    }
                }
                event = recv_event(self.transport.as_mut()), if self.transport.is_some() => {
                    self.handle_transport_event(event);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_one().await;
                }
            }
        }

        debug!("session task exited");
    }

    // ── Connection lifecycle ────────────────────────────────────────

    async fn open_transport(&mut self) {
        self.phase = SessionPhase::NoSession;
        // The retry throttle is anchored on attempts, successful or not,
        // so a string of refused connections paces itself by the window.
        self.last_attempt = Some(Instant::now());
        match self.connector.connect().await {
            Ok(transport) => {
                self.generation = self.generation.wrapping_add(1);
                self.transport = Some(transport);
                debug!(generation = self.generation, "transport open");
            }
            Err(err) => {
                warn!("connect failed: {err}");
                self.on_transport_lost(Some(ABNORMAL_CLOSE));
            }
        }
    }

    fn handle_transport_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Message(text)) => self.on_message(&text),
            Some(TransportEvent::Closed(code)) => {
                debug!(?code, "transport closed");
                self.on_transport_lost(code);
            }
            Some(TransportEvent::Error(err)) => {
                // The transport does not reliably distinguish errors from
                // closes; both take the disconnect path.
                warn!("transport error: {err}");
                self.on_transport_lost(Some(ABNORMAL_CLOSE));
            }
            None => {
                debug!("transport stream ended without close frame");
                self.on_transport_lost(Some(ABNORMAL_CLOSE));
            }
        }
    }

    fn on_transport_lost(&mut self, reported: Option<u16>) {
        self.transport = None;
        self.generation = self.generation.wrapping_add(1);
        self.ack_enqueued = false;
        self.queue.clear();
        self.ready_tx.send_replace(false);

        // Snapshot the live session for migration. A loss with no session
        // (a failed reconnect attempt) leaves the existing snapshot alone
        // so a later successful attempt can still migrate it.
        if let Some(state) = self.state.take() {
            self.prior = Some(state);
        }

        let requested = self.requested_close.take();
        let code = ReconnectPolicy::effective_code(reported, requested);
        self.phase = if requested.is_some() {
            SessionPhase::Closed
        } else {
            SessionPhase::NoSession
        };

        // The debounce gates the notification only; teardown above and
        // the reconnect decision below run on every loss.
        let now = Instant::now();
        if self.policy.should_notify(self.last_disconnect_notify, now) {
            self.last_disconnect_notify = Some(now);
            debug!(code, "disconnected");
            self.listeners.dispatch(names::DISCONNECT, &Value::from(code));
        } else {
            debug!("disconnect within debounce window, notification suppressed");
        }

        if self.policy.should_reconnect(code) {
            debug!(code, "scheduling reconnect");
            self.phase = SessionPhase::NoSession;
            self.schedule_retry();
        }
    }

    fn schedule_retry(&self) {
        let delay = self.policy.retry_delay(self.last_attempt, Instant::now());
        let generation = self.generation;
        let tx = self.cmd_tx.clone();
        drop(tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let _ = tx.send(Command::RetryDue { generation });
        }));
    }

    fn spawn_timer(&self, delay: Duration, cmd: Command) {
        let tx = self.cmd_tx.clone();
        drop(tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(cmd);
        }));
    }

    // ── Inbound routing ─────────────────────────────────────────────

    fn on_message(&mut self, text: &str) {
        let compress = self.state.as_ref().is_some_and(|s| s.compress);
        let decoded = self.codec.decode(text, compress);
        let Some(frame) = InboundFrame::parse(&decoded) else {
            debug!("dropping malformed frame");
            return;
        };

        if frame.name == names::CONNECTION {
            if frame.is_handshake_offer() && self.state.is_none() && self.phase.accepts_offer() {
                debug!("handshake offer received");
                self.phase = SessionPhase::AwaitingAck;
                self.spawn_timer(
                    self.config.settle_delay,
                    Command::SettleElapsed {
                        offer: frame.handshake_offer(),
                        generation: self.generation,
                    },
                );
            }
            return;
        }

        // Authorization boundary: every non-handshake frame must echo the
        // session's server key.
        let server_key = match &self.state {
            Some(state) => state.server_key.clone(),
            None => {
                debug!(name = %frame.name, "frame before session, dropped");
                return;
            }
        };
        if frame.token.as_deref() != Some(server_key.as_str()) {
            debug!(name = %frame.name, "token mismatch, frame dropped");
            return;
        }

        if frame.name == names::ERROR {
            self.listeners.dispatch(names::ERROR, &frame.data);
            if frame.data.as_str() == Some(payloads::MIGRATE) {
                debug!("server requested subscription replay");
                self.replay_subscriptions();
            }
            return;
        }

        self.listeners.dispatch(&frame.name, &frame.data);
    }

    // ── Command handling ────────────────────────────────────────────

    /// Process one command; `true` means shut the loop down.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Reconnect => {
                if self.state.is_none() && self.transport.is_none() {
                    self.schedule_retry();
                }
            }
            Command::Subscribe { name, callback } => {
                if let Some(clean) = self.listeners.subscribe(&name, callback) {
                    match self.ready_snapshot() {
                        Some(state) => {
                            self.push_json(&ListenerControl::subscribe(&clean, &state.token));
                        }
                        None => self.pending.push_back(PendingOp::Announce(clean)),
                    }
                }
            }
            Command::Unsubscribe {
                name,
                keep_callbacks,
            } => {
                if let Some(clean) = self.listeners.unsubscribe(&name, keep_callbacks) {
                    match self.ready_snapshot() {
                        Some(state) => {
                            self.push_json(&ListenerControl::unsubscribe(&clean, &state.token));
                        }
                        None => self.pending.push_back(PendingOp::Renounce(clean)),
                    }
                }
            }
            Command::Send { name, data } => {
                let clean = sanitize_name(&name);
                if clean.is_empty() {
                    return false;
                }
                match self.ready_snapshot() {
                    Some(state) => self.push_app_frame(&clean, &data, &state),
                    None => self.pending.push_back(PendingOp::App { name: clean, data }),
                }
            }
            Command::Disconnect { code } => {
                let code = ReconnectPolicy::normalize_code(code);
                self.requested_close = Some(code);
                match self.ready_snapshot() {
                    Some(state) => self.push_disconnect_notice(&state, code),
                    None => self.pending.push_back(PendingOp::Notice { code }),
                }
            }
            Command::Reserved { name, callback } => {
                if name == names::CONNECT && self.state.is_some() {
                    callback(&Value::Bool(true));
                }
                self.listeners.register_reserved(name, callback);
            }
            Command::Shutdown => return true,
            Command::SettleElapsed { offer, generation } => {
                if generation == self.generation
                    && self.state.is_none()
                    && self.transport.is_some()
                {
                    let compress = self.codec.compression_available();
                    self.state = Some(offer.into_state(compress));
                    self.phase = SessionPhase::Ready;
                    self.ready_tx.send_replace(true);
                    debug!(compress, "session state created");
                    self.spawn_timer(
                        self.config.ack_delay,
                        Command::AckDue {
                            generation: self.generation,
                        },
                    );
                }
            }
            Command::AckDue { generation } => {
                if generation == self.generation {
                    self.complete_handshake();
                }
            }
            Command::ForceClose { generation, code } => {
                if generation == self.generation {
                    if let Some(transport) = self.transport.as_mut() {
                        debug!(code, "forcing socket closed");
                        if transport.close(code).await.is_err() {
                            self.on_transport_lost(Some(code));
                        }
                    }
                }
            }
            Command::RetryDue { generation } => {
                if generation == self.generation
                    && self.transport.is_none()
                    && self.state.is_none()
                {
                    self.open_transport().await;
                }
            }
        }
        false
    }

    /// Queue the handshake acknowledgment plus everything that must follow
    /// it: the one-shot migration frame, the subscription replay, buffered
    /// operations, and finally the connect notifications.
    fn complete_handshake(&mut self) {
        let Some(state) = self.state.clone() else {
            return;
        };

        self.push_json(&HandshakeAck::new(&state.token, state.compress));

        if let Some(prior) = self.prior.take() {
            debug!(old_client = %prior.client_id, "migrating prior session");
            self.push_json(&MigrateFrame::new(&state.token, &prior));
        }

        let initial = !self.ever_connected;
        self.ever_connected = true;
        let replayed = if initial {
            Vec::new()
        } else {
            self.replay_subscriptions()
        };

        self.ack_enqueued = true;
        let buffered: Vec<PendingOp> = self.pending.drain(..).collect();
        for op in buffered {
            match op {
                // Names subscribed while disconnected are in the active
                // set, so the replay above already announced them.
                PendingOp::Announce(name) => {
                    if !replayed.contains(&name) {
                        self.push_json(&ListenerControl::subscribe(&name, &state.token));
                    }
                }
                PendingOp::Renounce(name) => {
                    self.push_json(&ListenerControl::unsubscribe(&name, &state.token));
                }
                PendingOp::App { name, data } => self.push_app_frame(&name, &data, &state),
                PendingOp::Notice { code } => self.push_disconnect_notice(&state, code),
            }
        }

        self.listeners.dispatch(names::CONNECT, &Value::Bool(initial));
    }

    /// Re-announce every active, non-reserved listener name. Returns the
    /// names announced so callers can avoid announcing them again.
    fn replay_subscriptions(&mut self) -> Vec<String> {
        let Some(token) = self.state.as_ref().map(|s| s.token.clone()) else {
            return Vec::new();
        };
        let active = self.listeners.replayable();
        for name in &active {
            self.push_json(&ListenerControl::subscribe(name, &token));
        }
        active
    }

    // ── Outbound helpers ────────────────────────────────────────────

    /// Session snapshot usable for direct enqueueing: only once the ack
    /// frame is ahead of everything else in the queue.
    fn ready_snapshot(&self) -> Option<SessionState> {
        if self.ack_enqueued { self.state.clone() } else { None }
    }

    fn push_json<T: Serialize>(&mut self, frame: &T) {
        match serde_json::to_string(frame) {
            Ok(text) => self.queue.push(text),
            Err(err) => warn!("failed to encode control frame: {err}"),
        }
    }

    fn push_app_frame(&mut self, name: &str, data: &Value, state: &SessionState) {
        let frame = AppFrame {
            name,
            data,
            token: &state.token,
        };
        match serde_json::to_string(&frame) {
            Ok(text) => {
                let encoded = self.codec.encode(&text, state.compress);
                self.queue.push(encoded);
            }
            Err(err) => warn!("failed to encode application frame: {err}"),
        }
    }

    fn push_disconnect_notice(&mut self, state: &SessionState, code: u16) {
        self.push_json(&DisconnectNotice::new(&state.token, code));
        self.phase = SessionPhase::Closing;
        self.spawn_timer(
            self.config.disconnect_grace,
            Command::ForceClose {
                generation: self.generation,
                code,
            },
        );
    }

    async fn flush_one(&mut self) {
        let Some(frame) = self.queue.pop_ready(Instant::now()) else {
            return;
        };
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if let Err(err) = transport.send(frame).await {
            warn!("send failed: {err}");
            self.on_transport_lost(Some(ABNORMAL_CLOSE));
        }
    }
}

/// Await the next transport event, or park forever when disconnected (the
/// select arm is disabled then anyway).
async fn recv_event(transport: Option<&mut Box<dyn Transport>>) -> Option<TransportEvent> {
    match transport {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}
