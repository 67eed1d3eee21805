//! Pixel-format decoders
//!
//! Pure mappings from a raw byte region (plus optional palette) to a
//! [`PixelBuffer`]. Output is always `Truecolor32` with a packed stride of
//! `width * 4`. Input lengths must match the layout implied by the
//! dimensions and bit depth exactly; a mismatch is a decode failure, never
//! a clamp. Dimensions are trusted as given; the container decoder
//! validates them before calling in.

use crate::error::TexError;
use crate::pixel::{Color16, Palette, PixelBuffer, PixelFormat};

/// Which nibble of a byte is the left pixel of a 4bpp pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NibbleOrder {
    /// Low nibble first: byte `0x3A` decodes as indices `0xA`, `0x3`
    LowFirst,
    /// High nibble first: byte `0x3A` decodes as indices `0x3`, `0xA`
    HighFirst,
}

/// Pixel count of a `width` x `height` image.
///
/// Saturating: an overflowing count can never match a real input length,
/// so the exact-size checks below reject it.
fn pixel_count(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

/// Decode linear 16-bit packed pixels to truecolor.
///
/// Each consecutive little-endian halfword is one pixel, expanded per
/// `format`.
///
/// # Arguments
/// * `format` - Packed color sub-format (RGB565 or RGBA4444)
/// * `width`, `height` - Image dimensions in pixels
/// * `src` - Raw pixel bytes, exactly `width * height * 2` long
///
/// # Errors
/// [`TexError::SizeMismatch`] if `src` is not exactly the implied length.
pub fn from_linear16(
    format: Color16,
    width: u32,
    height: u32,
    src: &[u8],
) -> Result<PixelBuffer, TexError> {
    let pixels = pixel_count(width, height);
    let expected = pixels.saturating_mul(Color16::SIZE);
    if src.len() != expected {
        return Err(TexError::SizeMismatch {
            expected,
            actual: src.len(),
        });
    }

    let mut data = Vec::with_capacity(pixels * 4);
    for halfword in src.chunks_exact(2) {
        let value = u16::from_le_bytes([halfword[0], halfword[1]]);
        data.extend_from_slice(&format.unpack(value));
    }

    PixelBuffer::new(
        width,
        height,
        PixelFormat::Truecolor32,
        width as usize * 4,
        data,
        None,
    )
}

/// Decode 8-bit palette indices to truecolor.
///
/// Each byte is an index into `palette`, which must hold exactly 256
/// entries; the entry is expanded per the palette's packed sub-format.
///
/// # Errors
/// [`TexError::SizeMismatch`] if `src` is not exactly `width * height`
/// bytes or the palette is not 256 entries.
pub fn from_indexed8(
    width: u32,
    height: u32,
    src: &[u8],
    palette: &Palette,
) -> Result<PixelBuffer, TexError> {
    let pixels = pixel_count(width, height);
    if src.len() != pixels {
        return Err(TexError::SizeMismatch {
            expected: pixels,
            actual: src.len(),
        });
    }
    if palette.len() != 256 {
        return Err(TexError::SizeMismatch {
            expected: 256,
            actual: palette.len(),
        });
    }

    // Expand the palette once; every index is in range for a 256-entry table.
    let mut lut = [[0u8; 4]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = palette.rgba(i).unwrap_or([0, 0, 0, 0]);
    }

    let mut data = Vec::with_capacity(pixels * 4);
    for &index in src {
        data.extend_from_slice(&lut[index as usize]);
    }

    PixelBuffer::new(
        width,
        height,
        PixelFormat::Truecolor32,
        width as usize * 4,
        data,
        None,
    )
}

/// Decode 4-bit palette indices to truecolor.
///
/// Each byte holds two indices; `order` selects which nibble is the left
/// pixel. `palette` must hold exactly 16 entries. Odd widths are the
/// caller's responsibility: the declared width must account for any row-end
/// padding.
///
/// # Errors
/// [`TexError::SizeMismatch`] if `src` is not exactly
/// `ceil(width * height / 2)` bytes or the palette is not 16 entries.
pub fn from_indexed4(
    order: NibbleOrder,
    width: u32,
    height: u32,
    src: &[u8],
    palette: &Palette,
) -> Result<PixelBuffer, TexError> {
    let pixels = pixel_count(width, height);
    let expected = pixels.div_ceil(2);
    if src.len() != expected {
        return Err(TexError::SizeMismatch {
            expected,
            actual: src.len(),
        });
    }
    if palette.len() != 16 {
        return Err(TexError::SizeMismatch {
            expected: 16,
            actual: palette.len(),
        });
    }

    let mut lut = [[0u8; 4]; 16];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = palette.rgba(i).unwrap_or([0, 0, 0, 0]);
    }

    let mut data = Vec::with_capacity(pixels * 4);
    for i in 0..pixels {
        let byte = src[i / 2];
        let index = match (order, i % 2) {
            (NibbleOrder::LowFirst, 0) | (NibbleOrder::HighFirst, 1) => byte & 0x0F,
            _ => byte >> 4,
        };
        data.extend_from_slice(&lut[index as usize]);
    }

    PixelBuffer::new(
        width,
        height,
        PixelFormat::Truecolor32,
        width as usize * 4,
        data,
        None,
    )
}
