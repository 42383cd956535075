//! Gzip compressor capability.
//!
//! The wire contract fixes gzip as the negotiated compression scheme; this
//! module provides the [`Compressor`] implementation the session client can
//! be configured with. Absence of the capability simply leaves sessions
//! uncompressed.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::error::CompressError;
use crate::core::traits::Compressor;

/// Default gzip compression level (0-9, higher = smaller but slower).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Maximum decompressed size accepted from the wire (DoS protection).
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Gzip implementation of the [`Compressor`] capability.
#[derive(Debug, Clone)]
pub struct GzipCompressor {
    level: u32,
    max_decompressed_size: usize,
}

impl GzipCompressor {
    /// Create a compressor with the default level.
    pub fn new() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
        }
    }

    /// Create a compressor with an explicit level, clamped to 0-9.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
        }
    }

    /// Get the configured compression level.
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(data)
            .map_err(|e| CompressError::CompressionFailed(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| CompressError::CompressionFailed(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut decoder = GzDecoder::new(data).take(self.max_decompressed_size as u64 + 1);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|e| CompressError::DecompressionFailed(e.to_string()))?;
        if output.len() > self.max_decompressed_size {
            return Err(CompressError::DecompressionFailed(
                "decompressed size exceeded limit".to_string(),
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let compressor = GzipCompressor::new();
        let data = b"hello hello hello hello hello hello";

        let compressed = compressor.compress(data).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_decompress_garbage_fails() {
        let compressor = GzipCompressor::new();
        assert!(compressor.decompress(b"not gzip at all").is_err());
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(GzipCompressor::with_level(100).level(), 9);
        assert_eq!(GzipCompressor::with_level(1).level(), 1);
    }

    #[test]
    fn test_empty_input() {
        let compressor = GzipCompressor::new();
        let compressed = compressor.compress(b"").unwrap();
        // A gzip stream of nothing is still a valid stream.
        assert!(!compressed.is_empty());
        assert_eq!(compressor.decompress(&compressed).unwrap(), b"");
    }
}
