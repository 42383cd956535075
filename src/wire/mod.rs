//! Wire envelope and frame codec.

pub mod codec;
pub mod frame;

pub use codec::FrameCodec;
pub use frame::{
    AppFrame, DisconnectNotice, HandshakeAck, HandshakeOffer, InboundFrame, ListenerControl,
    MigrateFrame,
};
