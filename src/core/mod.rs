//! Core constants, error types, and capability traits.

pub mod constants;
pub mod error;
pub mod traits;

pub use constants::*;
pub use error::{CipherError, ClientError, CompressError, ConfigError, TransportError};
pub use traits::{Cipher, Compressor};
