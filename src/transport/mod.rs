//! Socket transport and outbound send discipline.

pub mod queue;
pub mod socket;

pub use queue::OutboundQueue;
pub use socket::{websocket_url, Connector, Transport, TransportEvent};

#[cfg(feature = "websocket")]
pub use socket::{WsConnector, WsTransport};
