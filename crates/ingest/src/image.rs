use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat as DecodedFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Formats the vision model receives. Anything else is re-encoded as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    fn passthrough(format: DecodedFormat) -> Option<Self> {
        match format {
            DecodedFormat::Jpeg => Some(ImageFormat::Jpeg),
            DecodedFormat::Png => Some(ImageFormat::Png),
            DecodedFormat::WebP => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// An upload that decoded cleanly, in a format the vision model accepts.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl PreparedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), BASE64.encode(&self.bytes))
    }
}

/// Decode the whole image so truncated or corrupt files are rejected.
pub fn decode_image(bytes: &[u8]) -> Result<(DecodedFormat, DynamicImage)> {
    let format = image::guess_format(bytes).context("unrecognised image format")?;
    let decoded =
        image::load_from_memory_with_format(bytes, format).context("image data is corrupt")?;
    Ok((format, decoded))
}

/// Validate an upload and convert it for the vision model.
///
/// Images with an alpha channel are flattened onto white and sent as JPEG,
/// as are formats other than JPEG, PNG and WEBP. Opaque JPEG, PNG and WEBP
/// files are forwarded unchanged.
pub fn prepare_image(bytes: &[u8]) -> Result<PreparedImage> {
    let (format, decoded) = decode_image(bytes)?;

    if !decoded.color().has_alpha() {
        if let Some(format) = ImageFormat::passthrough(format) {
            return Ok(PreparedImage {
                format,
                bytes: bytes.to_vec(),
            });
        }
    }

    let rgb = if decoded.color().has_alpha() {
        flatten_onto_white(&decoded)
    } else {
        decoded.to_rgb8()
    };

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut encoded, DecodedFormat::Jpeg)
        .context("failed to re-encode image as JPEG")?;

    Ok(PreparedImage {
        format: ImageFormat::Jpeg,
        bytes: encoded.into_inner(),
    })
}

/// Encode image bytes as a `data:` URL for the vision model.
pub fn to_data_url(bytes: &[u8]) -> Result<String> {
    Ok(prepare_image(bytes)?.to_data_url())
}

/// MIME type guessed from the file signature, without decoding.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        DecodedFormat::Jpeg => Some("image/jpeg"),
        DecodedFormat::Png => Some("image/png"),
        DecodedFormat::WebP => Some("image/webp"),
        DecodedFormat::Gif => Some("image/gif"),
        DecodedFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn encode(image: DynamicImage, format: DecodedFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn opaque_png() -> Vec<u8> {
        encode(DynamicImage::ImageRgb8(RgbImage::new(1, 1)), DecodedFormat::Png)
    }

    #[test]
    fn test_opaque_png_is_forwarded_unchanged() {
        let png = opaque_png();
        let prepared = prepare_image(&png).unwrap();
        assert_eq!(prepared.format, ImageFormat::Png);
        assert_eq!(prepared.bytes, png);
        assert!(prepared.to_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_transparent_png_is_flattened_to_jpeg() {
        let clear = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let png = encode(DynamicImage::ImageRgba8(clear), DecodedFormat::Png);

        let prepared = prepare_image(&png).unwrap();
        assert_eq!(prepared.format, ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&prepared.bytes).unwrap().to_rgb8();
        // fully transparent pixels become white
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c > 240)));
    }

    #[test]
    fn test_other_formats_are_reencoded_as_jpeg() {
        let bmp = encode(DynamicImage::ImageRgb8(RgbImage::new(1, 1)), DecodedFormat::Bmp);
        let url = to_data_url(&bmp).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_signature_without_image_data_is_rejected() {
        assert!(to_data_url(b"\x89PNG\r\n\x1a\ngarbage-not-an-image").is_err());
        assert!(to_data_url(b"plain text").is_err());

        let png = opaque_png();
        assert!(prepare_image(&png[..png.len() / 2]).is_err());
    }

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type(&opaque_png()), Some("image/png"));
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_mime_type(b"%PDF-1.7"), None);
    }
}
