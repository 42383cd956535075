//! Session layer: negotiated state, listener registry, reconnect policy
//! and the orchestrating event loop.

pub mod listeners;
pub mod manager;
pub mod reconnect;
pub mod state;

pub use listeners::{sanitize_name, ListenerFn, ListenerRegistry};
pub use manager::{SessionClient, SessionConfig};
pub use reconnect::ReconnectPolicy;
pub use state::{PriorSessionState, SessionPhase, SessionState};
