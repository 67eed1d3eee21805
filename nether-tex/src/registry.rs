//! Format registry and dispatch
//!
//! The supported container formats are a closed set: one [`FormatKind`] tag
//! and one [`FormatSpec`] table entry per format. Adding a format means
//! adding a variant and a table entry. Dispatch tries extension-matched
//! candidates first, then falls back to magic-number sniffing, and returns
//! the first decoder that validates. It never guesses.

use log::debug;

use crate::classic::{ClassicTex, TexKind};
use crate::error::TexError;
use crate::stream::ByteStream;
use crate::CLASSIC_TEX_MAGIC;

/// Tag for every supported container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Single Emberware Classic texture (.ewctex)
    ClassicTex,
    /// Concatenated Classic texture bundle (.ewctexs)
    ClassicTexBundle,
}

impl FormatKind {
    /// Open a decoder of this kind over `stream`.
    pub fn open(self, stream: &dyn ByteStream) -> ClassicTex<'_> {
        match self {
            Self::ClassicTex => ClassicTex::new(stream, TexKind::Single),
            Self::ClassicTexBundle => ClassicTex::new(stream, TexKind::Bundle),
        }
    }
}

/// Static description of one registered format.
pub struct FormatSpec {
    pub kind: FormatKind,
    /// Human-readable format name
    pub name: &'static str,
    /// Extensions without the leading dot, lowercase
    pub extensions: &'static [&'static str],
    /// Unofficial MIME types
    pub mime_types: &'static [&'static str],
    /// Magic bytes at stream offset 0
    pub magic: &'static [u8; 4],
}

/// Registered formats, in sniffing priority order.
///
/// The two Classic kinds share a magic; the exact-size single container is
/// tried before the more permissive bundle rule.
pub const FORMATS: &[FormatSpec] = &[
    FormatSpec {
        kind: FormatKind::ClassicTex,
        name: "Emberware Classic .ewctex",
        extensions: &["ewctex"],
        mime_types: &["image/x-ewctex"],
        magic: CLASSIC_TEX_MAGIC,
    },
    FormatSpec {
        kind: FormatKind::ClassicTexBundle,
        name: "Emberware Classic .ewctexs",
        extensions: &["ewctexs"],
        mime_types: &["image/x-ewctexs"],
        magic: CLASSIC_TEX_MAGIC,
    },
];

/// Lowercased extension of a filename hint.
fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Identify the container format of `stream` and return its decoder.
///
/// Candidates whose registered extension matches `filename_hint` are tried
/// first, then the remaining formats whose magic matches the first bytes of
/// the stream. The first candidate whose validation succeeds wins.
///
/// # Errors
/// [`TexError::UnrecognizedFormat`] if no registered format validates.
pub fn identify<'a>(
    stream: &'a dyn ByteStream,
    filename_hint: Option<&str>,
) -> Result<ClassicTex<'a>, TexError> {
    let ext = filename_hint.and_then(extension_of);

    let mut sniffed = [0u8; 4];
    let sniff_ok = stream.read_at(0, &mut sniffed)? == 4;

    let ext_matches = |spec: &&FormatSpec| match &ext {
        Some(e) => spec.extensions.contains(&e.as_str()),
        None => false,
    };

    let by_extension = FORMATS.iter().filter(|spec| ext_matches(spec));
    let by_magic = FORMATS
        .iter()
        .filter(|spec| !ext_matches(spec))
        .filter(|spec| sniff_ok && spec.magic == &sniffed);

    for spec in by_extension.chain(by_magic) {
        let decoder = spec.kind.open(stream);
        if decoder.is_valid() {
            debug!("identified stream as {}", spec.name);
            return Ok(decoder);
        }
    }
    Err(TexError::UnrecognizedFormat)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression as ZlibLevel;

    use super::*;
    use crate::classic::ClassicTexHeader;
    use crate::stream::MemStream;

    fn tex_container(w: u32, h: u32, px: u32, raw_payload: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), ZlibLevel::default());
        encoder.write_all(raw_payload).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut out = Vec::with_capacity(ClassicTexHeader::SIZE + compressed.len());
        out.extend_from_slice(CLASSIC_TEX_MAGIC);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        out.extend_from_slice(&px.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(raw_payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed);
        out
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("foo.ewctex").as_deref(), Some("ewctex"));
        assert_eq!(extension_of("FOO.EWCTEXS").as_deref(), Some("ewctexs"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_identify_by_extension() {
        let data = tex_container(4, 4, 0, &[0u8; 32]);
        let stream = MemStream::new(&data);
        let tex = identify(&stream, Some("sprite.ewctex")).unwrap();
        assert_eq!(tex.kind(), TexKind::Single);
    }

    #[test]
    fn test_identify_bundle_by_extension() {
        let first = tex_container(4, 4, 0, &[0u8; 32]);
        let mut data = first.clone();
        data.extend_from_slice(&first);
        let stream = MemStream::new(&data);
        let tex = identify(&stream, Some("SPRITES.EWCTEXS")).unwrap();
        assert_eq!(tex.kind(), TexKind::Bundle);
    }

    #[test]
    fn test_identify_by_magic_without_hint() {
        let data = tex_container(4, 4, 0, &[0u8; 32]);
        let stream = MemStream::new(&data);
        let tex = identify(&stream, None).unwrap();
        assert_eq!(tex.kind(), TexKind::Single);
    }

    #[test]
    fn test_identify_concatenated_without_hint() {
        // Exact-size rule fails, the bundle rule validates next
        let first = tex_container(4, 4, 0, &[0u8; 32]);
        let mut data = first.clone();
        data.extend_from_slice(&first);
        let stream = MemStream::new(&data);
        let tex = identify(&stream, None).unwrap();
        assert_eq!(tex.kind(), TexKind::Bundle);
    }

    #[test]
    fn test_misleading_extension_falls_back_to_sniff() {
        let data = tex_container(4, 4, 0, &[0u8; 32]);
        let stream = MemStream::new(&data);
        let tex = identify(&stream, Some("renamed.bin")).unwrap();
        assert_eq!(tex.kind(), TexKind::Single);
    }

    #[test]
    fn test_unrecognized_format() {
        let data = b"PNG\x0d not actually a texture container";
        let stream = MemStream::new(data);
        let result = identify(&stream, Some("image.png"));
        assert!(matches!(result, Err(TexError::UnrecognizedFormat)));
    }

    #[test]
    fn test_empty_stream() {
        let stream = MemStream::new(&[]);
        let result = identify(&stream, None);
        assert!(matches!(result, Err(TexError::UnrecognizedFormat)));
    }

    #[test]
    fn test_right_magic_bad_header_is_unrecognized() {
        // Correct magic but an impossible image count: every candidate
        // fails validation, so the dispatcher reports no format.
        let mut data = tex_container(4, 4, 0, &[0u8; 32]);
        data[4..8].copy_from_slice(&7u32.to_le_bytes());
        let stream = MemStream::new(&data);
        let result = identify(&stream, None);
        assert!(matches!(result, Err(TexError::UnrecognizedFormat)));
    }

    #[test]
    fn test_decode_through_registry() {
        let data = tex_container(2, 2, 0, &[0x00, 0xF8, 0xE0, 0x07, 0x1F, 0x00, 0xFF, 0xFF]);
        let stream = MemStream::new(&data);
        let mut tex = identify(&stream, Some("tiny.ewctex")).unwrap();
        let image = tex.decode_image().expect("decode");
        assert_eq!(image.rgba_at(0, 0), Some([0xFF, 0x00, 0x00, 0xFF]));
        assert_eq!(image.rgba_at(1, 1), Some([0xFF, 0xFF, 0xFF, 0xFF]));
    }
}
