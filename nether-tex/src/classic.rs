//! Emberware Classic texture container (.ewctex / .ewctexs)
//!
//! Classic texture assets are a 40-byte little-endian header followed by a
//! single payload, stored raw or as a zlib stream. The payload holds an
//! optional leading palette and a packed pixel region; the pixel-format code
//! in the header selects the layout.
//!
//! # Layout
//! ```text
//! 0x00: magic        [u8; 4]  "EWCT"
//! 0x04: num_images   u32      always 1
//! 0x08: width        u32      storage width in pixels
//! 0x0C: height       u32      storage height in pixels
//! 0x10: width_disp   u32      displayed width (metadata only)
//! 0x14: height_disp  u32      displayed height (metadata only)
//! 0x18: px_format    u32      pixel-format code, see [`ClassicPixelFormat`]
//! 0x1C: compression  u32      0 = stored, 1 = zlib deflate
//! 0x20: compr_size   u32      payload size as stored in the stream
//! 0x24: uncompr_size u32      payload size after decompression
//! ```
//!
//! A `.ewctex` stream is exactly header plus payload. A `.ewctexs` bundle is
//! multiple containers concatenated; only the first entry is decoded and
//! later entries are not addressable.

use log::{debug, warn};

use crate::decode::{from_indexed4, from_indexed8, from_linear16, NibbleOrder};
use crate::error::TexError;
use crate::inflate::{Decompressor, ZlibDecompressor};
use crate::pixel::{Color16, Palette, PixelBuffer};
use crate::stream::ByteStream;
use crate::{CLASSIC_TEX_MAGIC, TEX_MAX_COMPRESSED_SIZE, TEX_MAX_UNCOMPRESSED_SIZE};

/// Whether a stream is a single container or a concatenated bundle.
///
/// Both share the same magic; the distinction is driven by the file
/// extension. A single `.ewctex` must be exactly header plus payload, while
/// a `.ewctexs` bundle may carry further entries after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexKind {
    Single,
    Bundle,
}

impl TexKind {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Single => "ewctex",
            Self::Bundle => "ewctexs",
        }
    }

    /// Unofficial MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Single => "image/x-ewctex",
            Self::Bundle => "image/x-ewctexs",
        }
    }

    /// Human-readable container name.
    pub fn texture_format_name(self) -> &'static str {
        match self {
            Self::Single => "Emberware Classic .ewctex",
            Self::Bundle => "Emberware Classic .ewctexs",
        }
    }
}

/// Payload compression codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Payload bytes are the pixel data as-is
    Stored,
    /// Payload is a zlib (RFC 1950) stream
    Zlib,
}

impl Compression {
    fn from_code(code: u32) -> Result<Self, TexError> {
        match code {
            0 => Ok(Self::Stored),
            1 => Ok(Self::Zlib),
            other => Err(TexError::UnsupportedCompression(other)),
        }
    }
}

/// Known pixel-format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassicPixelFormat {
    /// 0: linear 16-bit RGB565
    Rgb565,
    /// 1: linear 16-bit RGBA4444
    Rgba4444,
    /// 2: 8bpp indices, 256-entry RGB565 palette
    Ci8Rgb565,
    /// 3: 8bpp indices, 256-entry RGBA4444 palette
    Ci8Rgba4444,
    /// 4: 4bpp indices, 16-entry RGB565 palette
    Ci4Rgb565,
    /// 5: 4bpp indices, 16-entry RGBA4444 palette
    Ci4Rgba4444,
}

impl ClassicPixelFormat {
    /// Map a header code to a known format.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Rgb565),
            1 => Some(Self::Rgba4444),
            2 => Some(Self::Ci8Rgb565),
            3 => Some(Self::Ci8Rgba4444),
            4 => Some(Self::Ci4Rgb565),
            5 => Some(Self::Ci4Rgba4444),
            _ => None,
        }
    }

    /// Packed color sub-format of the pixels or palette entries.
    pub fn color16(self) -> Color16 {
        match self {
            Self::Rgb565 | Self::Ci8Rgb565 | Self::Ci4Rgb565 => Color16::Rgb565,
            Self::Rgba4444 | Self::Ci8Rgba4444 | Self::Ci4Rgba4444 => Color16::Rgba4444,
        }
    }

    /// Leading palette entry count, zero for the linear formats.
    pub fn palette_entries(self) -> usize {
        match self {
            Self::Rgb565 | Self::Rgba4444 => 0,
            Self::Ci8Rgb565 | Self::Ci8Rgba4444 => 256,
            Self::Ci4Rgb565 | Self::Ci4Rgba4444 => 16,
        }
    }

    /// Pixel region size in bytes for the given dimensions.
    ///
    /// Saturating on absurd dimensions; the layout-vs-payload equality
    /// check rejects those streams.
    pub fn pixel_bytes(self, width: u32, height: u32) -> usize {
        let pixels = (width as usize).saturating_mul(height as usize);
        match self {
            Self::Rgb565 | Self::Rgba4444 => pixels.saturating_mul(2),
            Self::Ci8Rgb565 | Self::Ci8Rgba4444 => pixels,
            Self::Ci4Rgb565 | Self::Ci4Rgba4444 => pixels.div_ceil(2),
        }
    }

    /// Pixel format name as shown in metadata queries.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgb565 => "RGB565",
            Self::Rgba4444 => "RGBA4444",
            Self::Ci8Rgb565 => "8bpp with RGB565 palette",
            Self::Ci8Rgba4444 => "8bpp with RGBA4444 palette",
            Self::Ci4Rgb565 => "4bpp with RGB565 palette",
            Self::Ci4Rgba4444 => "4bpp with RGBA4444 palette",
        }
    }
}

/// Classic texture header (40 bytes, little-endian)
#[derive(Debug, Clone, Copy)]
pub struct ClassicTexHeader {
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub width_disp: u32,
    pub height_disp: u32,
    pub px_format: u32,
    pub compression: u32,
    pub compr_size: u32,
    pub uncompr_size: u32,
}

impl ClassicTexHeader {
    pub const SIZE: usize = 40;

    /// Parse a header from raw bytes.
    ///
    /// # Errors
    /// - [`TexError::ShortRead`] if fewer than [`Self::SIZE`] bytes
    /// - [`TexError::HeaderMismatch`] if the magic is wrong
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TexError> {
        if bytes.len() < Self::SIZE {
            return Err(TexError::ShortRead {
                offset: 0,
                expected: Self::SIZE,
            });
        }
        if &bytes[0..4] != CLASSIC_TEX_MAGIC {
            return Err(TexError::HeaderMismatch("magic"));
        }
        let u32_at = |off: usize| u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);
        Ok(Self {
            num_images: u32_at(0x04),
            width: u32_at(0x08),
            height: u32_at(0x0C),
            width_disp: u32_at(0x10),
            height_disp: u32_at(0x14),
            px_format: u32_at(0x18),
            compression: u32_at(0x1C),
            compr_size: u32_at(0x20),
            uncompr_size: u32_at(0x24),
        })
    }
}

/// Decoder for one Classic texture container.
///
/// Borrows the stream for its own lifetime; the caller keeps ownership and
/// must keep the stream open until decoding is done. The header is read and
/// validated at construction. Check [`is_valid`](Self::is_valid) before
/// expecting pixel data; an invalid container still answers the static
/// extension/MIME queries on [`TexKind`].
///
/// [`decode_image`](Self::decode_image) is idempotent: the first call does
/// the payload read, decompression, and pixel decode, and the result
/// (success or failure) is cached for every later call.
pub struct ClassicTex<'a> {
    stream: &'a dyn ByteStream,
    kind: TexKind,
    header: Option<ClassicTexHeader>,
    error: Option<TexError>,
    decompressor: Box<dyn Decompressor>,
    image: Option<PixelBuffer>,
    decode_failed: bool,
}

impl<'a> ClassicTex<'a> {
    /// Read and validate a container header from `stream`.
    ///
    /// Never fails outright: a stream that does not validate produces a
    /// decoder whose [`is_valid`](Self::is_valid) is false, with the cause
    /// available from [`validation_error`](Self::validation_error).
    pub fn new(stream: &'a dyn ByteStream, kind: TexKind) -> Self {
        Self::with_decompressor(stream, kind, Box::new(ZlibDecompressor))
    }

    /// Like [`new`](Self::new) with a caller-supplied decompressor.
    pub fn with_decompressor(
        stream: &'a dyn ByteStream,
        kind: TexKind,
        decompressor: Box<dyn Decompressor>,
    ) -> Self {
        let mut tex = Self {
            stream,
            kind,
            header: None,
            error: None,
            decompressor,
            image: None,
            decode_failed: false,
        };
        match tex.read_and_validate() {
            Ok(header) => {
                debug!(
                    "{}: {}x{} px_format={}",
                    kind.texture_format_name(),
                    header.width,
                    header.height,
                    header.px_format
                );
                tex.header = Some(header);
            }
            Err(e) => {
                warn!("{} rejected: {}", kind.texture_format_name(), e);
                tex.error = Some(e);
            }
        }
        tex
    }

    fn read_and_validate(&self) -> Result<ClassicTexHeader, TexError> {
        let mut raw = [0u8; ClassicTexHeader::SIZE];
        self.stream.read_exact_at(0, &mut raw)?;
        let header = ClassicTexHeader::from_bytes(&raw)?;

        if header.num_images != 1 {
            return Err(TexError::HeaderMismatch("image count"));
        }
        if header.width == 0 || header.height == 0 {
            return Err(TexError::HeaderMismatch("zero dimension"));
        }
        // Hard ceilings on attacker-controlled sizes, checked before any
        // payload allocation.
        if u64::from(header.compr_size) > TEX_MAX_COMPRESSED_SIZE {
            return Err(TexError::SizeLimitExceeded {
                field: "compressed size",
                size: u64::from(header.compr_size),
                max: TEX_MAX_COMPRESSED_SIZE,
            });
        }
        if u64::from(header.uncompr_size) > TEX_MAX_UNCOMPRESSED_SIZE {
            return Err(TexError::SizeLimitExceeded {
                field: "uncompressed size",
                size: u64::from(header.uncompr_size),
                max: TEX_MAX_UNCOMPRESSED_SIZE,
            });
        }
        Compression::from_code(header.compression)?;

        let declared = ClassicTexHeader::SIZE as u64 + u64::from(header.compr_size);
        let actual = self.stream.size();
        let ok = match self.kind {
            TexKind::Single => actual == declared,
            // Bundles carry further concatenated entries after the first.
            TexKind::Bundle => actual >= declared,
        };
        if !ok {
            return Err(TexError::SizeMismatch {
                expected: declared as usize,
                actual: actual as usize,
            });
        }
        Ok(header)
    }

    /// True once header validation has succeeded.
    pub fn is_valid(&self) -> bool {
        self.header.is_some()
    }

    /// Why validation failed, when it did.
    pub fn validation_error(&self) -> Option<&TexError> {
        self.error.as_ref()
    }

    pub fn kind(&self) -> TexKind {
        self.kind
    }

    /// Storage dimensions in pixels.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.header.map(|h| (h.width, h.height))
    }

    /// Displayed dimensions, which may differ from storage (textures are
    /// usually stored padded to a power of two).
    pub fn display_dimensions(&self) -> Option<(u32, u32)> {
        self.header.map(|h| (h.width_disp, h.height_disp))
    }

    /// Pixel format name, or `"Unknown (0x…)"` for codes not in the table.
    pub fn pixel_format_name(&self) -> Option<String> {
        let header = self.header?;
        Some(match ClassicPixelFormat::from_code(header.px_format) {
            Some(px) => px.name().to_owned(),
            None => format!("Unknown (0x{:08X})", header.px_format),
        })
    }

    /// Container format name.
    pub fn texture_format_name(&self) -> Option<&'static str> {
        self.header.map(|_| self.kind.texture_format_name())
    }

    /// Mipmap count. The Classic container has no mipmaps.
    pub fn mipmap_count(&self) -> Option<u32> {
        None
    }

    /// Decode the image, or return the cached result.
    ///
    /// Returns `None` for invalid containers and for valid containers whose
    /// payload fails to decode; the failure does not retract the header
    /// metadata. Repeated calls never re-run decompression or pixel
    /// decoding.
    pub fn decode_image(&mut self) -> Option<&PixelBuffer> {
        if self.header.is_some() && self.image.is_none() && !self.decode_failed {
            match self.load_image() {
                Ok(image) => self.image = Some(image),
                Err(e) => {
                    warn!("{} decode failed: {}", self.kind.texture_format_name(), e);
                    self.decode_failed = true;
                }
            }
        }
        self.image.as_ref()
    }

    fn load_image(&self) -> Result<PixelBuffer, TexError> {
        let header = self.header.as_ref().ok_or(TexError::UnrecognizedFormat)?;
        let px = ClassicPixelFormat::from_code(header.px_format)
            .ok_or(TexError::UnsupportedPixelFormat(header.px_format))?;
        let compression = Compression::from_code(header.compression)?;

        // Sizes were bounds-checked at validation, safe to allocate.
        let mut compr = vec![0u8; header.compr_size as usize];
        self.stream
            .read_exact_at(ClassicTexHeader::SIZE as u64, &mut compr)?;

        let payload = match compression {
            Compression::Stored => {
                if header.compr_size != header.uncompr_size {
                    return Err(TexError::SizeMismatch {
                        expected: header.uncompr_size as usize,
                        actual: header.compr_size as usize,
                    });
                }
                compr
            }
            Compression::Zlib => self
                .decompressor
                .decompress(&compr, header.uncompr_size as usize)?,
        };

        // The payload is palette entries followed by packed pixels, and the
        // computed layout must account for every byte.
        let pal_bytes = px.palette_entries() * Color16::SIZE;
        let pix_bytes = px.pixel_bytes(header.width, header.height);
        let expected = pal_bytes.saturating_add(pix_bytes);
        if expected != payload.len() {
            return Err(TexError::SizeMismatch {
                expected,
                actual: payload.len(),
            });
        }

        let (pal_raw, pix_raw) = payload.split_at(pal_bytes);
        let image = match px {
            ClassicPixelFormat::Rgb565 | ClassicPixelFormat::Rgba4444 => {
                from_linear16(px.color16(), header.width, header.height, pix_raw)?
            }
            ClassicPixelFormat::Ci8Rgb565 | ClassicPixelFormat::Ci8Rgba4444 => {
                let palette = Palette::from_le_bytes(px.color16(), 256, pal_raw)?;
                from_indexed8(header.width, header.height, pix_raw, &palette)?
            }
            ClassicPixelFormat::Ci4Rgb565 | ClassicPixelFormat::Ci4Rgba4444 => {
                let palette = Palette::from_le_bytes(px.color16(), 16, pal_raw)?;
                from_indexed4(
                    NibbleOrder::LowFirst,
                    header.width,
                    header.height,
                    pix_raw,
                    &palette,
                )?
            }
        };

        debug!(
            "{}: decoded {}x{} {}",
            self.kind.texture_format_name(),
            header.width,
            header.height,
            px.name()
        );
        Ok(image)
    }
}
