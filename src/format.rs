//! # Image Format Detection
//!
//! Riconosce il formato di un buffer dai magic bytes, così ogni plugin può
//! decidere se il buffer lo riguarda o se va lasciato passare invariato.
//!
//! I formati raster sono riconosciuti tramite `image::guess_format`; SVG è
//! testo, quindi viene riconosciuto cercando il tag `<svg` all'inizio del file.

use image::ImageFormat;

/// How far into a buffer we look for an `<svg` tag.
const SVG_SNIFF_LEN: usize = 4096;

/// Image formats the built-in plugins know about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    WebP,
    Svg,
}

impl ImageKind {
    /// Canonical file extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Svg => "svg",
        }
    }
}

/// Detect the format of an in-memory image.
pub fn detect(data: &[u8]) -> Option<ImageKind> {
    match image::guess_format(data) {
        Ok(ImageFormat::Png) => Some(ImageKind::Png),
        Ok(ImageFormat::Jpeg) => Some(ImageKind::Jpeg),
        Ok(ImageFormat::Gif) => Some(ImageKind::Gif),
        Ok(ImageFormat::WebP) => Some(ImageKind::WebP),
        _ if is_svg(data) => Some(ImageKind::Svg),
        _ => None,
    }
}

fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();

    text.starts_with('<') && text.to_ascii_lowercase().contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_detect_raster_formats() {
        assert_eq!(detect(PNG_MAGIC), Some(ImageKind::Png));
        assert_eq!(detect(JPEG_MAGIC), Some(ImageKind::Jpeg));
        assert_eq!(detect(b"GIF89a\x01\x00\x01\x00"), Some(ImageKind::Gif));
        assert_eq!(detect(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(ImageKind::WebP));
    }

    #[test]
    fn test_detect_svg() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert_eq!(detect(svg), Some(ImageKind::Svg));
        assert_eq!(detect(b"  <svg width=\"1\"/>"), Some(ImageKind::Svg));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(b"plain text, not an image"), None);
        assert_eq!(detect(b""), None);
    }
}
