//! Transport abstraction and the WebSocket implementation.
//!
//! The session loop drives a boxed [`Transport`] and asks a [`Connector`]
//! for a fresh one on every (re)connect. Connections are never shared: a
//! superseded transport is dropped wholesale, so events from a replaced
//! socket cannot leak into the new session.

use async_trait::async_trait;

use crate::core::constants::WS_PATH;
use crate::core::error::{ConfigError, TransportError};

/// Event reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Message(String),
    /// The peer closed the connection, with the close code if one was sent.
    Closed(Option<u16>),
    /// The connection failed. Treated like an abnormal close downstream.
    Error(String),
}

/// One socket connection.
///
/// `recv` returning `None` means the byte stream ended without a close
/// frame; the session loop treats that as an abnormal close.
#[async_trait]
pub trait Transport: Send {
    /// Transmit one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next event.
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Close the connection with the given code.
    async fn close(&mut self, code: u16) -> Result<(), TransportError>;
}

/// Factory producing a fresh [`Transport`] per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new connection.
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// Derive the WebSocket endpoint from an origin.
///
/// The origin must start with `http(s)://` or `ws(s)://`; an `http` scheme
/// is swapped for `ws` and the `/ws` path is appended.
pub fn websocket_url(origin: &str) -> Result<String, ConfigError> {
    let valid = ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| origin.starts_with(scheme));
    if !valid {
        return Err(ConfigError::InvalidOrigin(origin.to_string()));
    }

    let swapped = match origin.strip_prefix("http") {
        Some(rest) => format!("ws{rest}"),
        None => origin.to_string(),
    };
    Ok(format!("{}{WS_PATH}", swapped.trim_end_matches('/')))
}

#[cfg(feature = "websocket")]
mod ws {
    use async_trait::async_trait;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
    use tracing::debug;

    use super::{Connector, Transport, TransportEvent};
    use crate::core::error::TransportError;

    type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// WebSocket transport over tokio-tungstenite.
    pub struct WsTransport {
        inner: WsStream,
    }

    impl WsTransport {
        /// Wrap an established WebSocket stream.
        pub fn new(inner: WsStream) -> Self {
            Self { inner }
        }
    }

    #[async_trait]
    impl Transport for WsTransport {
        async fn send(&mut self, text: String) -> Result<(), TransportError> {
            self.inner
                .send(Message::text(text))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        }

        async fn recv(&mut self) -> Option<TransportEvent> {
            loop {
                return match self.inner.next().await {
                    Some(Ok(Message::Text(text))) => {
                        Some(TransportEvent::Message(text.to_string()))
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        // Some peers ship text frames as binary; tolerate it.
                        match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => Some(TransportEvent::Message(text)),
                            Err(_) => {
                                debug!("dropping non-UTF8 binary frame");
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        Some(TransportEvent::Closed(frame.map(|f| u16::from(f.code))))
                    }
                    Some(Ok(_)) => continue, // ping/pong handled by the protocol layer
                    Some(Err(e)) => Some(TransportEvent::Error(e.to_string())),
                    None => None,
                };
            }
        }

        async fn close(&mut self, code: u16) -> Result<(), TransportError> {
            self.inner
                .close(Some(CloseFrame {
                    code: CloseCode::from(code),
                    reason: "".into(),
                }))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        }
    }

    /// Connector opening WebSocket connections to one endpoint URL.
    #[derive(Debug, Clone)]
    pub struct WsConnector {
        url: String,
    }

    impl WsConnector {
        /// Create a connector for an already-derived `ws(s)://…` URL.
        pub fn new(url: impl Into<String>) -> Self {
            Self { url: url.into() }
        }
    }

    #[async_trait]
    impl Connector for WsConnector {
        async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
            let (stream, _response) = connect_async(&self.url)
                .await
                .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
            debug!(url = %self.url, "websocket connected");
            Ok(Box::new(WsTransport::new(stream)))
        }
    }
}

#[cfg(feature = "websocket")]
pub use ws::{WsConnector, WsTransport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_http_swap() {
        assert_eq!(
            websocket_url("http://example.com").unwrap(),
            "ws://example.com/ws"
        );
        assert_eq!(
            websocket_url("https://example.com").unwrap(),
            "wss://example.com/ws"
        );
    }

    #[test]
    fn test_websocket_url_ws_passthrough() {
        assert_eq!(
            websocket_url("ws://example.com").unwrap(),
            "ws://example.com/ws"
        );
        assert_eq!(
            websocket_url("wss://example.com/").unwrap(),
            "wss://example.com/ws"
        );
    }

    #[test]
    fn test_websocket_url_rejects_other_schemes() {
        assert!(websocket_url("ftp://example.com").is_err());
        assert!(websocket_url("example.com").is_err());
        assert!(websocket_url("").is_err());
    }
}
