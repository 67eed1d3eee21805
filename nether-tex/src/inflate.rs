//! Generic decompressor adapter
//!
//! Compressed container payloads are neutralized here, behind a fixed
//! contract: input bytes plus the declared uncompressed size in, a buffer of
//! exactly that size out, or a failure. A stream that is malformed, ends
//! short, or would produce more than the declared size is rejected, never
//! silently truncated or overrun. Identical input always yields identical
//! output or identical failure.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::TexError;

/// Fixed-contract stream decompressor.
///
/// Implementations must be stateless across calls; the container decoder
/// holds one behind this trait so tests can substitute instrumented
/// variants.
pub trait Decompressor {
    /// Inflate `input` into a buffer of exactly `expected_len` bytes.
    ///
    /// # Errors
    /// [`TexError::DecompressionFailure`] if the stream is malformed or its
    /// inflated length differs from `expected_len` in either direction.
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, TexError>;
}

/// zlib (RFC 1950) inflate via `flate2`.
#[derive(Debug, Default)]
pub struct ZlibDecompressor;

impl Decompressor for ZlibDecompressor {
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, TexError> {
        let mut inflater = Decompress::new(true); // true = zlib wrapper
        let mut out = vec![0u8; expected_len];
        let mut in_pos = 0usize;
        let mut out_pos = 0usize;

        loop {
            let status = inflater
                .decompress(&input[in_pos..], &mut out[out_pos..], FlushDecompress::Finish)
                .map_err(|_| TexError::DecompressionFailure)?;

            let new_in = inflater.total_in() as usize;
            let new_out = inflater.total_out() as usize;
            let progressed = new_in != in_pos || new_out != out_pos;
            in_pos = new_in;
            out_pos = new_out;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    // No forward progress means either truncated input or a
                    // stream trying to write past the declared size.
                    if !progressed {
                        return Err(TexError::DecompressionFailure);
                    }
                }
            }
        }

        if out_pos != expected_len {
            // Stream ended before filling the declared size.
            return Err(TexError::DecompressionFailure);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_round_trip() {
        let raw: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        let compressed = deflate(&raw);
        let out = ZlibDecompressor.decompress(&compressed, raw.len()).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_empty_payload() {
        let compressed = deflate(&[]);
        let out = ZlibDecompressor.decompress(&compressed, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_output_rejected() {
        // Stream inflates to one byte fewer than declared: must fail, never
        // return a truncated-but-accepted buffer.
        let raw = vec![0xABu8; 31];
        let compressed = deflate(&raw);
        let result = ZlibDecompressor.decompress(&compressed, 32);
        assert!(matches!(result, Err(TexError::DecompressionFailure)));
    }

    #[test]
    fn test_long_output_rejected() {
        // Stream inflates to one byte more than declared.
        let raw = vec![0xABu8; 33];
        let compressed = deflate(&raw);
        let result = ZlibDecompressor.decompress(&compressed, 32);
        assert!(matches!(result, Err(TexError::DecompressionFailure)));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let raw = vec![0x55u8; 1024];
        let mut compressed = deflate(&raw);
        compressed.truncate(compressed.len() / 2);
        let result = ZlibDecompressor.decompress(&compressed, raw.len());
        assert!(matches!(result, Err(TexError::DecompressionFailure)));
    }

    #[test]
    fn test_garbage_rejected() {
        let garbage = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22];
        let result = ZlibDecompressor.decompress(&garbage, 64);
        assert!(matches!(result, Err(TexError::DecompressionFailure)));
    }

    #[test]
    fn test_deterministic() {
        let raw = b"same bytes in, same bytes out".to_vec();
        let compressed = deflate(&raw);
        let a = ZlibDecompressor.decompress(&compressed, raw.len()).unwrap();
        let b = ZlibDecompressor.decompress(&compressed, raw.len()).unwrap();
        assert_eq!(a, b);
    }
}
