//! Protocol constants for the wsession wire contract.
//!
//! Delays carry the reference defaults; all of them are tunable through
//! [`SessionConfig`](crate::session::SessionConfig). The reserved names,
//! payload literals and the transient close-code set are fixed by the
//! protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// TIMING DEFAULTS
// =============================================================================

/// Settle delay between a handshake offer and session-state creation.
///
/// Absorbs rapid-fire duplicate offers from the server.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Delay between session-state creation and the handshake acknowledgment.
///
/// Decouples state construction from transmission so the outbound queue
/// always sees a fully built session.
pub const ACK_DELAY: Duration = Duration::from_millis(100);

/// Trailing guard after each transmission before the next frame may go out.
pub const SEND_GAP: Duration = Duration::from_millis(100);

/// Minimum interval between two `@disconnect` notifications.
pub const DISCONNECT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Grace period between the disconnect notice and forcing the socket closed.
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Minimum interval between two connect attempts.
pub const RECONNECT_WINDOW: Duration = Duration::from_secs(10);

// =============================================================================
// CLOSE CODES
// =============================================================================

/// Normal closure; never triggers automatic reconnection.
pub const NORMAL_CLOSE: u16 = 1000;

/// Abnormal closure; assumed when the transport fails without a close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

/// Close codes that indicate a transient failure worth reconnecting over:
/// abnormal closure, message too big, internal error, service restart,
/// try again later, bad gateway, and TLS failure.
pub const TRANSIENT_CLOSE_CODES: [u16; 7] = [1006, 1009, 1011, 1012, 1013, 1014, 1015];

// =============================================================================
// WIRE NAMES
// =============================================================================

/// Path appended to the scheme-swapped origin.
pub const WS_PATH: &str = "/ws";

/// Reserved frame and listener names.
pub mod names {
    /// Handshake, migration and disconnect control frames.
    pub const CONNECTION: &str = "@connection";
    /// Subscription control frames.
    pub const LISTENER: &str = "@listener";
    /// Server-signalled errors.
    pub const ERROR: &str = "@error";
    /// Local connect notifications (never announced to the server).
    pub const CONNECT: &str = "@connect";
    /// Local disconnect notifications (never announced to the server).
    pub const DISCONNECT: &str = "@disconnect";
    /// Prefix marking a name as reserved.
    pub const RESERVED_PREFIX: char = '@';
}

/// Payload literals used on `@connection` and `@listener` frames.
pub mod payloads {
    /// Handshake offer and acknowledgment payload.
    pub const CONNECT: &str = "connect";
    /// Session migration payload; also the `@error` payload that demands a
    /// subscription replay.
    pub const MIGRATE: &str = "migrate";
    /// Graceful disconnect notice payload.
    pub const DISCONNECT: &str = "disconnect";
    /// Prefix marking an `@listener` payload as an unsubscription.
    pub const UNSUBSCRIBE_PREFIX: char = '!';
}
