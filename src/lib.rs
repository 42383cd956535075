//! # wsession
//!
//! Client-side WebSocket session layer: token-gated event routing over a
//! negotiated session, with transparent reconnection.
//!
//! A [`SessionClient`] connects to an origin, waits for the server's
//! handshake offer, and settles into a session identified by a client ID,
//! a token echoed on every outbound frame, and a server key that every
//! inbound frame must carry to be delivered. On top of that session it
//! provides:
//!
//! - **Named events**: subscribe with [`SessionClient::on`], publish with
//!   [`SessionClient::send`]; subscriptions are announced to the server
//!   and replayed automatically after every reconnect
//! - **Buffering**: operations issued before the session is ready are
//!   queued and flushed, in order, right after the handshake completes
//! - **Reconnection**: transient closes reopen the transport (throttled),
//!   migrate the prior session identity, and re-announce subscriptions
//! - **Serialized sends**: one outbound FIFO with a guard interval, so
//!   frames never interleave on the socket
//! - **Optional compression**: gzip + base64 frame bodies when a
//!   [`Compressor`] is injected, with a tolerant raw-text fallback
//!
//! ## Feature Flags
//!
//! - `websocket` (default): tokio-tungstenite transport and
//!   [`SessionClient::connect`]
//! - `gzip` (default): the [`GzipCompressor`](extensions::GzipCompressor)
//!   capability
//!
//! ## Modules
//!
//! - [`core`]: Constants, error types and capability traits
//! - [`wire`]: JSON frame envelopes and the text codec
//! - [`transport`]: Transport traits, WebSocket implementation, outbound
//!   queue
//! - [`session`]: Session state machine and the public client
//! - [`extensions`]: Optional capabilities (compression)
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsession::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = SessionClient::connect(SessionConfig::new("https://example.com"))?;
//! client.on("chat", |data| println!("chat: {data}"));
//! client.ready().await;
//! client.send("chat", serde_json::json!("hello"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Wire format (always included)
pub mod wire;

// Transport layer
pub mod transport;

// Session layer
pub mod session;

// Extensions (feature-gated capabilities)
pub mod extensions;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{Cipher, ClientError, Compressor, ConfigError, TransportError};
    pub use crate::session::{SessionClient, SessionConfig};
    pub use crate::transport::{Connector, Transport, TransportEvent};

    #[cfg(feature = "gzip")]
    pub use crate::extensions::GzipCompressor;
}

// Re-export commonly used items at crate root
pub use crate::core::{Cipher, ClientError, Compressor, ConfigError, TransportError};
pub use session::{SessionClient, SessionConfig};

#[cfg(feature = "gzip")]
pub use extensions::GzipCompressor;
