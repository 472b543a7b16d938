//! Source image preparation for image-to-video generation.

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder};
use vgen_models::Resolution;

use crate::error::{MediaError, MediaResult};
use crate::Frame;

/// Decode any supported image format into RGB.
pub fn decode_image(bytes: &[u8]) -> MediaResult<Frame> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| MediaError::ImageDecode(e.to_string()))
}

/// Resize to `height`, keeping the aspect ratio (width rounded to nearest).
pub fn resize_to_height(img: &Frame, height: u32) -> Frame {
    let target = Resolution::new(img.width(), img.height()).fit_height(height);
    if target.width == img.width() && target.height == img.height() {
        return img.clone();
    }
    imageops::resize(img, target.width, target.height, FilterType::CatmullRom)
}

/// Encode as PNG.
pub fn encode_png(img: &Frame) -> MediaResult<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
        .map_err(|e| MediaError::ImageEncode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_keeps_aspect() {
        let img = Frame::new(1920, 1080);
        let resized = resize_to_height(&img, 544);
        assert_eq!((resized.width(), resized.height()), (967, 544));
    }

    #[test]
    fn test_resize_noop_at_target() {
        let img = Frame::new(960, 544);
        let resized = resize_to_height(&img, 544);
        assert_eq!((resized.width(), resized.height()), (960, 544));
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let mut img = Frame::new(4, 2);
        img.put_pixel(1, 1, image::Rgb([200, 10, 30]));

        let png = encode_png(&img).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(1, 1), &image::Rgb([200, 10, 30]));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::ImageDecode(_)));
    }
}
