//! Negotiated session identity and lifecycle phases.

/// The negotiated identity for the current connection.
///
/// At most one instance is live per session client; while absent, the
/// connection is "not ready" and public operations that need a session are
/// buffered until it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Opaque identifier issued by the server.
    pub client_id: String,
    /// Session-scoped credential echoed on every outbound frame.
    pub token: String,
    /// Value every inbound frame must carry in its token field.
    pub server_key: String,
    /// Encryption key placeholder; carried but never used.
    pub enc_key: String,
    /// Whether frame bodies are compressed on this session.
    pub compress: bool,
}

/// Snapshot of the just-replaced session, retained across exactly one
/// reconnect attempt to support migration; discarded after first use.
pub type PriorSessionState = SessionState;

/// Handshake lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session; waiting for a handshake offer.
    NoSession,
    /// Offer received; settle timer pending before state creation.
    AwaitingAck,
    /// Session state exists; operations may proceed.
    Ready,
    /// Graceful close requested; notice sent or pending.
    Closing,
    /// Connection closed at the caller's request.
    Closed,
}

impl SessionPhase {
    /// Whether a handshake offer should be acted on in this phase.
    pub fn accepts_offer(self) -> bool {
        matches!(self, SessionPhase::NoSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_session_accepts_offers() {
        assert!(SessionPhase::NoSession.accepts_offer());
        assert!(!SessionPhase::AwaitingAck.accepts_offer());
        assert!(!SessionPhase::Ready.accepts_offer());
        assert!(!SessionPhase::Closing.accepts_offer());
        assert!(!SessionPhase::Closed.accepts_offer());
    }
}
