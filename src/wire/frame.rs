//! JSON wire envelope types.
//!
//! Every frame is a flat JSON object with a `name` discriminator. Outbound
//! frames always echo the session token; inbound frames are accepted only
//! when their token matches the session's server key (checked by the
//! session loop, not here).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::constants::{names, payloads};
use crate::session::state::{PriorSessionState, SessionState};

/// Generic application frame: `{name, data, token}`.
#[derive(Debug, Clone, Serialize)]
pub struct AppFrame<'a> {
    /// Sanitized event name.
    pub name: &'a str,
    /// Opaque application payload.
    pub data: &'a Value,
    /// Session token.
    pub token: &'a str,
}

/// Handshake acknowledgment sent after the session state settles.
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeAck<'a> {
    name: &'static str,
    data: &'static str,
    token: &'a str,
    compress: u8,
}

impl<'a> HandshakeAck<'a> {
    /// Build the acknowledgment for a freshly created session.
    pub fn new(token: &'a str, compress: bool) -> Self {
        Self {
            name: names::CONNECTION,
            data: payloads::CONNECT,
            token,
            compress: u8::from(compress),
        }
    }
}

/// One-shot migration frame carrying the prior session's identifiers.
#[derive(Debug, Clone, Serialize)]
pub struct MigrateFrame<'a> {
    name: &'static str,
    data: &'static str,
    token: &'a str,
    #[serde(rename = "oldClient")]
    old_client: &'a str,
    #[serde(rename = "oldToken")]
    old_token: &'a str,
    #[serde(rename = "oldServerKey")]
    old_server_key: &'a str,
    #[serde(rename = "oldEncKey")]
    old_enc_key: &'a str,
}

impl<'a> MigrateFrame<'a> {
    /// Build a migration frame from the new session token and the prior
    /// session snapshot.
    pub fn new(token: &'a str, prior: &'a PriorSessionState) -> Self {
        Self {
            name: names::CONNECTION,
            data: payloads::MIGRATE,
            token,
            old_client: &prior.client_id,
            old_token: &prior.token,
            old_server_key: &prior.server_key,
            old_enc_key: &prior.enc_key,
        }
    }
}

/// Graceful disconnect notice.
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectNotice<'a> {
    name: &'static str,
    data: &'static str,
    token: &'a str,
    code: u16,
}

impl<'a> DisconnectNotice<'a> {
    /// Build a disconnect notice with an already-normalized close code.
    pub fn new(token: &'a str, code: u16) -> Self {
        Self {
            name: names::CONNECTION,
            data: payloads::DISCONNECT,
            token,
            code,
        }
    }
}

/// Subscription control frame; payload is the bare name, or `!name` for an
/// unsubscription.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerControl<'a> {
    name: &'static str,
    data: String,
    token: &'a str,
}

impl<'a> ListenerControl<'a> {
    /// Announce a subscription.
    pub fn subscribe(listener: &str, token: &'a str) -> Self {
        Self {
            name: names::LISTENER,
            data: listener.to_string(),
            token,
        }
    }

    /// Announce an unsubscription.
    pub fn unsubscribe(listener: &str, token: &'a str) -> Self {
        Self {
            name: names::LISTENER,
            data: format!("{}{listener}", payloads::UNSUBSCRIBE_PREFIX),
            token,
        }
    }
}

/// Inbound frame as parsed off the wire.
///
/// All fields beyond `name` are optional so the one struct covers handshake
/// offers, control frames and application events alike.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    /// Frame discriminator.
    pub name: String,
    /// Payload; `Value::Null` when absent.
    #[serde(default)]
    pub data: Value,
    /// Token, expected to equal the session server key.
    #[serde(default)]
    pub token: Option<String>,
    /// Client identifier (handshake offer only).
    #[serde(default, rename = "clientID")]
    pub client_id: Option<String>,
    /// Server verification key (handshake offer only).
    #[serde(default, rename = "serverKey")]
    pub server_key: Option<String>,
    /// Encryption key placeholder (handshake offer only).
    #[serde(default, rename = "encKey")]
    pub enc_key: Option<String>,
}

impl InboundFrame {
    /// Parse a text frame; `None` for malformed JSON (silently dropped by
    /// the caller).
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Whether this is a `@connection`/`connect` handshake offer.
    pub fn is_handshake_offer(&self) -> bool {
        self.name == names::CONNECTION && self.data.as_str() == Some(payloads::CONNECT)
    }

    /// Extract the server-supplied identity fields of a handshake offer.
    pub fn handshake_offer(&self) -> HandshakeOffer {
        HandshakeOffer {
            client_id: self.client_id.clone().unwrap_or_default(),
            token: self.token.clone().unwrap_or_default(),
            server_key: self.server_key.clone().unwrap_or_default(),
            enc_key: self.enc_key.clone().unwrap_or_default(),
        }
    }
}

/// Server-supplied identity fields from a handshake offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOffer {
    /// Opaque client identifier issued by the server.
    pub client_id: String,
    /// Session token to echo on every outbound frame.
    pub token: String,
    /// Key the server will echo on every inbound frame.
    pub server_key: String,
    /// Encryption key placeholder (unused).
    pub enc_key: String,
}

impl HandshakeOffer {
    /// Build the session state for this offer.
    pub fn into_state(self, compress: bool) -> SessionState {
        SessionState {
            client_id: self.client_id,
            token: self.token,
            server_key: self.server_key,
            enc_key: self.enc_key,
            compress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_app_frame_shape() {
        let data = json!({"x": 1});
        let frame = AppFrame {
            name: "chat",
            data: &data,
            token: "tok",
        };
        let value: Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"name": "chat", "data": {"x": 1}, "token": "tok"}));
    }

    #[test]
    fn test_handshake_ack_shape() {
        let ack = HandshakeAck::new("tok", true);
        let value: Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(
            value,
            json!({"name": "@connection", "data": "connect", "token": "tok", "compress": 1})
        );
    }

    #[test]
    fn test_migrate_frame_field_names() {
        let prior = PriorSessionState {
            client_id: "c1".into(),
            token: "t1".into(),
            server_key: "sk1".into(),
            enc_key: "ek1".into(),
            compress: false,
        };
        let value: Value = serde_json::to_value(MigrateFrame::new("t2", &prior)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "@connection",
                "data": "migrate",
                "token": "t2",
                "oldClient": "c1",
                "oldToken": "t1",
                "oldServerKey": "sk1",
                "oldEncKey": "ek1",
            })
        );
    }

    #[test]
    fn test_disconnect_notice_shape() {
        let value: Value = serde_json::to_value(DisconnectNotice::new("tok", 1500)).unwrap();
        assert_eq!(
            value,
            json!({"name": "@connection", "data": "disconnect", "token": "tok", "code": 1500})
        );
    }

    #[test]
    fn test_listener_control_payloads() {
        let sub: Value = serde_json::to_value(ListenerControl::subscribe("chat", "tok")).unwrap();
        assert_eq!(sub["data"], json!("chat"));

        let unsub: Value =
            serde_json::to_value(ListenerControl::unsubscribe("chat", "tok")).unwrap();
        assert_eq!(unsub["data"], json!("!chat"));
    }

    #[test]
    fn test_parse_handshake_offer() {
        let text = r#"{"name":"@connection","data":"connect","clientID":"c1","token":"t1","serverKey":"sk1","encKey":"ek1"}"#;
        let frame = InboundFrame::parse(text).unwrap();
        assert!(frame.is_handshake_offer());

        let offer = frame.handshake_offer();
        assert_eq!(offer.client_id, "c1");
        assert_eq!(offer.server_key, "sk1");

        let state = offer.into_state(true);
        assert_eq!(state.token, "t1");
        assert!(state.compress);
    }

    #[test]
    fn test_parse_malformed_is_none() {
        assert!(InboundFrame::parse("not json").is_none());
        assert!(InboundFrame::parse("{\"data\":1}").is_none()); // missing name
    }

    #[test]
    fn test_parse_app_event() {
        let frame = InboundFrame::parse(r#"{"name":"chat","data":"hi","token":"sk1"}"#).unwrap();
        assert!(!frame.is_handshake_offer());
        assert_eq!(frame.token.as_deref(), Some("sk1"));
        assert_eq!(frame.data, json!("hi"));
    }
}
