//! Text-safe frame codec.
//!
//! When a session negotiates compression, outbound JSON text is compressed
//! and base64-encoded; inbound text gets the inverse attempted. Both
//! directions fall back to the raw text on any failure or empty result —
//! noise on the wire is tolerated, never fatal.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::core::traits::Compressor;

/// Encodes and decodes frame text for one session client.
#[derive(Clone)]
pub struct FrameCodec {
    compressor: Option<Arc<dyn Compressor>>,
}

impl FrameCodec {
    /// Create a codec around an optional compressor capability.
    pub fn new(compressor: Option<Arc<dyn Compressor>>) -> Self {
        Self { compressor }
    }

    /// Whether a compression capability is available locally.
    pub fn compression_available(&self) -> bool {
        self.compressor.is_some()
    }

    /// Encode outbound frame text.
    ///
    /// With `compress` unset (or no capability injected) the text passes
    /// through unchanged.
    pub fn encode(&self, text: &str, compress: bool) -> String {
        if !compress {
            return text.to_string();
        }
        let Some(compressor) = &self.compressor else {
            return text.to_string();
        };
        match compressor.compress(text.as_bytes()) {
            Ok(bytes) if !bytes.is_empty() => BASE64.encode(bytes),
            Ok(_) => text.to_string(),
            Err(err) => {
                debug!("outbound compression failed, sending raw: {err}");
                text.to_string()
            }
        }
    }

    /// Decode inbound frame text.
    ///
    /// Attempts base64 + decompression when the session negotiated
    /// compression; any failure (or an empty result) yields the original
    /// text unchanged.
    pub fn decode(&self, text: &str, compress: bool) -> String {
        if !compress {
            return text.to_string();
        }
        let Some(compressor) = &self.compressor else {
            return text.to_string();
        };
        let Ok(raw) = BASE64.decode(text) else {
            return text.to_string();
        };
        match compressor.decompress(&raw) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(decoded) if !decoded.is_empty() => decoded,
                _ => text.to_string(),
            },
            Err(_) => text.to_string(),
        }
    }
}

impl std::fmt::Debug for FrameCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCodec")
            .field("compression_available", &self.compression_available())
            .finish()
    }
}

#[cfg(all(test, feature = "gzip"))]
mod tests {
    use super::*;
    use crate::extensions::compression::GzipCompressor;

    fn codec() -> FrameCodec {
        FrameCodec::new(Some(Arc::new(GzipCompressor::new())))
    }

    #[test]
    fn test_roundtrip_compressed() {
        let codec = codec();
        let text = r#"{"name":"chat","data":"hello hello hello hello","token":"tok"}"#;

        let encoded = codec.encode(text, true);
        assert_ne!(encoded, text);

        let decoded = codec.decode(&encoded, true);
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_plain_passthrough() {
        let codec = codec();
        let text = "{\"name\":\"chat\"}";
        assert_eq!(codec.encode(text, false), text);
        assert_eq!(codec.decode(text, false), text);
    }

    #[test]
    fn test_decode_raw_fallback() {
        // A plain JSON frame arriving on a compressed session must survive.
        let codec = codec();
        let text = r#"{"name":"chat","data":"hi","token":"sk"}"#;
        assert_eq!(codec.decode(text, true), text);
    }

    #[test]
    fn test_decode_garbage_base64_fallback() {
        let codec = codec();
        // Valid base64, but not gzip underneath.
        let bogus = BASE64.encode(b"definitely not gzip");
        assert_eq!(codec.decode(&bogus, true), bogus);
    }

    #[test]
    fn test_no_capability_disables_compression() {
        let codec = FrameCodec::new(None);
        assert!(!codec.compression_available());
        let text = "{\"name\":\"x\"}";
        assert_eq!(codec.encode(text, true), text);
        assert_eq!(codec.decode(text, true), text);
    }
}
