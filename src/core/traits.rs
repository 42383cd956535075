//! Capability traits injected into the session client.
//!
//! Optional capabilities are passed in explicitly rather than discovered at
//! load time: a missing compressor simply disables compression during the
//! handshake, and the cipher slot is carried but never exercised.

use crate::core::error::{CipherError, CompressError};

/// Byte-level compression capability.
///
/// When a compressor is injected and the server does not veto it, the
/// session negotiates `compress = 1` and application frames are compressed
/// before the text-safe encoding step.
pub trait Compressor: Send + Sync {
    /// Compress a byte slice.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError>;

    /// Decompress a byte slice produced by [`Compressor::compress`].
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError>;
}

/// Payload cipher capability.
///
/// Reserved seam: the protocol threads an `encKey` through the handshake and
/// migration frames, but no frame is ever encrypted or decrypted. The trait
/// exists so the key material has somewhere to go once the server side
/// defines a scheme.
pub trait Cipher: Send + Sync {
    /// Encrypt a payload under the session encryption key.
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypt a payload under the session encryption key.
    fn decrypt(&self, key: &str, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}
