//! Error types for the wsession client.
//!
//! Transport and protocol faults are absorbed internally by the session
//! loop (silent drop or reconnect); these types cover the places where an
//! error is still worth propagating to a caller or logging.

use thiserror::Error;

/// Errors building a session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Origin does not start with `http(s)://` or `ws(s)://`.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
}

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish the connection.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Failed to transmit a frame.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Errors from a compression capability.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Decompression failed (corrupt or foreign input).
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Errors from a cipher capability.
///
/// The cipher seam is reserved; no code path produces these yet.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Errors surfaced by the public client handle.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
