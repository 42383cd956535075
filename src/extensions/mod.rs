//! Optional capability implementations.

#[cfg(feature = "gzip")]
#[cfg_attr(docsrs, doc(cfg(feature = "gzip")))]
pub mod compression;

#[cfg(feature = "gzip")]
pub use compression::GzipCompressor;
