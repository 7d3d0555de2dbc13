//! Text decoding and media sniffing helpers.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (BOM sniffing via encoding_rs also picks up UTF-16 parts)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (superset of ISO-8859-1, common in legacy text files)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
///
/// ```ignore
/// assert_eq!(decode_text("Hello".as_bytes(), None), "Hello");
/// assert_eq!(decode_text(b"caf\xe9", None), "café");
/// ```
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, malformed) = encoding.decode(bytes);
        if !malformed {
            return result;
        }
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode an XML part, honoring the encoding named in its declaration.
pub fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

// ============================================================================
// Media Format Detection
// ============================================================================

/// Media formats found in a package's asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    /// Windows metafile / enhanced metafile (legacy picture mechanism)
    Wmf,
    Emf,
    Svg,
    /// Embedded OLE object payload
    Ole,
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Bmp => "image/bmp",
            MediaFormat::Tiff => "image/tiff",
            MediaFormat::Wmf => "image/x-wmf",
            MediaFormat::Emf => "image/x-emf",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::Ole => "application/vnd.openxmlformats-officedocument.oleObject",
            MediaFormat::Binary => "application/octet-stream",
        }
    }
}

/// Detect media format from the asset path, falling back to magic bytes.
pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    let path_lower = path.to_lowercase();
    let extension = path_lower.rsplit('.').next().unwrap_or("");

    match extension {
        "jpg" | "jpeg" => return MediaFormat::Jpeg,
        "png" => return MediaFormat::Png,
        "gif" => return MediaFormat::Gif,
        "bmp" => return MediaFormat::Bmp,
        "tif" | "tiff" => return MediaFormat::Tiff,
        "wmf" => return MediaFormat::Wmf,
        "emf" => return MediaFormat::Emf,
        "svg" => return MediaFormat::Svg,
        "bin" if path_lower.contains("oleobject") => return MediaFormat::Ole,
        _ => {}
    }

    if data.starts_with(&[0xFF, 0xD8]) {
        MediaFormat::Jpeg
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        MediaFormat::Png
    } else if data.starts_with(b"GIF") {
        MediaFormat::Gif
    } else if data.starts_with(b"BM") {
        MediaFormat::Bmp
    } else if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        MediaFormat::Wmf
    } else if data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        // Compound File Binary: the OLE storage container
        MediaFormat::Ole
    } else {
        MediaFormat::Binary
    }
}

// ============================================================================
// Encoding Detection
// ============================================================================

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` in the first ~100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = memchr::memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    if after_enc.is_empty() {
        return None;
    }

    let quote = after_enc[0];
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;

    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8() {
        assert_eq!(decode_text("Grüße".as_bytes(), None), "Grüße");
    }

    #[test]
    fn test_decode_text_falls_back_to_cp1252() {
        assert_eq!(decode_text(b"caf\xe9", None), "café");
    }

    #[test]
    fn test_extract_xml_encoding() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document/>"#;
        assert_eq!(extract_xml_encoding(xml), Some("UTF-8"));
        assert_eq!(extract_xml_encoding(b"<w:document/>"), None);
        assert_eq!(
            extract_xml_encoding(b"<?xml version='1.0' encoding='windows-1252'?>"),
            Some("windows-1252")
        );
    }

    #[test]
    fn test_detect_media_format_by_extension() {
        assert_eq!(detect_media_format("word/media/image1.JPEG", &[]), MediaFormat::Jpeg);
        assert_eq!(detect_media_format("word/media/image2.png", &[]), MediaFormat::Png);
        assert_eq!(detect_media_format("word/media/image3.emf", &[]), MediaFormat::Emf);
        assert_eq!(
            detect_media_format("word/embeddings/oleObject1.bin", &[]),
            MediaFormat::Ole
        );
    }

    #[test]
    fn test_detect_media_format_by_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_media_format("word/media/blob", &png), MediaFormat::Png);
        assert_eq!(detect_media_format("word/media/blob", b"GIF89a"), MediaFormat::Gif);
        assert_eq!(detect_media_format("word/media/blob", b"????"), MediaFormat::Binary);
        assert_eq!(MediaFormat::Ole.mime_type(), "application/vnd.openxmlformats-officedocument.oleObject");
    }
}
