//! Error types for texture container parsing and pixel decoding

use thiserror::Error;

/// Errors that can occur when parsing texture containers or decoding pixels
#[derive(Error, Debug)]
pub enum TexError {
    /// Stream ended before the requested bytes could be read
    #[error("short read: wanted {expected} bytes at offset {offset}")]
    ShortRead { offset: u64, expected: usize },

    /// A fixed header field did not match its required value
    #[error("header mismatch: {0}")]
    HeaderMismatch(&'static str),

    /// A declared size field exceeds its hard ceiling
    #[error("{field} of {size} bytes exceeds the {max} byte limit")]
    SizeLimitExceeded {
        field: &'static str,
        size: u64,
        max: u64,
    },

    /// Computed layout size does not equal the actual payload size
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Compressed payload is malformed or does not inflate to the declared size
    #[error("decompression failed")]
    DecompressionFailure,

    /// Pixel format code is not in the known table
    #[error("unsupported pixel format code 0x{0:08X}")]
    UnsupportedPixelFormat(u32),

    /// Compression code is not in the known table
    #[error("unsupported compression code 0x{0:08X}")]
    UnsupportedCompression(u32),

    /// No registered format validated against the stream
    #[error("unrecognized format")]
    UnrecognizedFormat,

    /// IO error from the backing stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
