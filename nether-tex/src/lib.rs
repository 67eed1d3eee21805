//! Nether-Tex: console texture container parsing and pixel decoding
//!
//! This crate provides the decoding core behind asset thumbnails: it parses
//! texture container headers from untrusted byte streams and converts their
//! compressed or packed pixel payloads into a canonical uncompressed pixel
//! buffer. Consumers (launcher UI, asset browser) only ever see validated
//! metadata and RGBA pixels.
//!
//! # Key Features
//!
//! - **Hostile-input safe**: every header field is bounds-checked, declared
//!   sizes are capped before allocation, and size mismatches fail decoding
//!   instead of clamping
//! - **Palette and packed formats**: RGB565/RGBA4444 linear data plus 4bpp
//!   and 8bpp indexed data with packed palettes
//! - **Contained decompression**: zlib payloads are inflated to exactly the
//!   declared size or rejected
//! - **Cached decoding**: decoding a container twice never re-runs
//!   decompression or pixel unpacking
//!
//! # Format Overview
//!
//! An Emberware Classic texture container (`.ewctex`) holds:
//! - A fixed 40-byte little-endian header (magic, image count, dimensions,
//!   pixel-format code, compression code, payload sizes)
//! - One payload, stored raw or zlib-compressed: optional leading palette
//!   entries followed by packed pixel data
//!
//! A `.ewctexs` bundle is multiple containers concatenated back to back;
//! only the first entry is decoded.
//!
//! # Usage
//!
//! ```ignore
//! use nether_tex::{identify, FileStream};
//!
//! let stream = FileStream::open("sprite.ewctex")?;
//! let mut tex = identify(&stream, Some("sprite.ewctex"))?;
//!
//! let (width, height) = tex.dimensions().unwrap();
//! println!("{}x{} {}", width, height, tex.pixel_format_name().unwrap());
//!
//! if let Some(image) = tex.decode_image() {
//!     // image.data() is RGBA8888, image.stride() bytes per row
//! }
//! ```

mod classic;
mod decode;
mod error;
mod inflate;
mod pixel;
mod registry;
mod stream;

pub use classic::{ClassicPixelFormat, ClassicTex, ClassicTexHeader, Compression, TexKind};
pub use decode::{from_indexed4, from_indexed8, from_linear16, NibbleOrder};
pub use error::TexError;
pub use inflate::{Decompressor, ZlibDecompressor};
pub use pixel::{Color16, Palette, PixelBuffer, PixelFormat};
pub use registry::{identify, FormatKind, FormatSpec, FORMATS};
pub use stream::{ByteStream, FileStream, MemStream};

// =============================================================================
// Constants
// =============================================================================

/// Classic texture container magic bytes
pub const CLASSIC_TEX_MAGIC: &[u8; 4] = b"EWCT";

/// Hard ceiling on a container's declared compressed payload size
pub const TEX_MAX_COMPRESSED_SIZE: u64 = 1024 * 1024;

/// Hard ceiling on a container's declared uncompressed payload size
pub const TEX_MAX_UNCOMPRESSED_SIZE: u64 = 4 * 1024 * 1024;

/// Palette entries required by 4bpp indexed formats
pub const CI4_PALETTE_ENTRIES: usize = 16;

/// Palette entries required by 8bpp indexed formats
pub const CI8_PALETTE_ENTRIES: usize = 256;

// =============================================================================
// Tests
// =============================================================================
