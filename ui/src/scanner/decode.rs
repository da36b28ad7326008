//! Glue between raw pixels and the `rqrr` decoder.

use image::GrayImage;

use super::error::EngineError;

/// A square area of a frame, in source pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// The centred square of edge `size` inside a `width` x `height` frame,
/// shrunk to fit when the frame is smaller.
pub fn centered_region(width: u32, height: u32, size: u32) -> Region {
    let size = size.min(width).min(height);
    Region {
        x: (width - size) / 2,
        y: (height - size) / 2,
        size,
    }
}

/// Converts RGBA pixels to luma using the standard weights.
pub fn luma_from_rgba(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|pixel| {
            (pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114) as u8
        })
        .collect()
}

/// Stretches a low-contrast frame to the full 0-255 range.
///
/// Returns false (and leaves the data untouched) when the frame is flat or
/// already has enough contrast.
pub fn stretch_contrast(luma: &mut [u8]) -> bool {
    let (min_luma, max_luma) = luma
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));

    let luma_range = max_luma.saturating_sub(min_luma);
    if luma_range == 0 || luma_range >= 200 {
        return false;
    }

    let scale = 255.0 / luma_range as f32;
    for pixel in luma.iter_mut() {
        *pixel = ((*pixel as f32 - min_luma as f32) * scale).round() as u8;
    }
    true
}

/// Decodes the first readable QR code in a greyscale image.
///
/// Every detected grid is tried in turn; a damaged or partial code does not
/// hide a good one elsewhere in the frame.
pub fn decode_gray(image: GrayImage) -> Result<String, EngineError> {
    let mut prepared = rqrr::PreparedImage::prepare(image);
    prepared
        .detect_grids()
        .iter()
        .find_map(|grid| match grid.decode() {
            Ok((_meta, content)) if !content.is_empty() => Some(content),
            _ => None,
        })
        .ok_or(EngineError::NoCode)
}

/// Decodes a raw luma buffer, retrying once with stretched contrast.
pub fn decode_luma(width: u32, height: u32, luma: Vec<u8>) -> Result<String, EngineError> {
    let mut stretched = luma.clone();
    let image = GrayImage::from_raw(width, height, luma).ok_or_else(|| {
        EngineError::InvalidImage(format!("buffer does not match {}x{}", width, height))
    })?;

    match decode_gray(image) {
        Ok(content) => Ok(content),
        Err(EngineError::NoCode) if stretch_contrast(&mut stretched) => {
            GrayImage::from_raw(width, height, stretched)
                .ok_or(EngineError::NoCode)
                .and_then(decode_gray)
        }
        Err(e) => Err(e),
    }
}

/// Decodes an encoded image file (png, jpeg, ...).
pub fn decode_image_bytes(bytes: &[u8]) -> Result<String, EngineError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| EngineError::InvalidImage(e.to_string()))?
        .to_luma8();
    let (width, height) = image.dimensions();
    decode_luma(width, height, image.into_raw())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use qrcode::{Color, QrCode};
    use std::io::Cursor;

    /// Renders `text` as a QR image with a 4-module quiet zone, `dark`/`light`
    /// being the module colours.
    pub(crate) fn render_qr(text: &str, dark: u8, light: u8) -> GrayImage {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let width = code.width() as u32;
        let colors = code.to_colors();
        let scale = 8;
        let quiet = 4;
        let size = (width + 2 * quiet) * scale;

        GrayImage::from_fn(size, size, |x, y| {
            let mx = (x / scale) as i64 - quiet as i64;
            let my = (y / scale) as i64 - quiet as i64;
            let inside = mx >= 0 && my >= 0 && (mx as u32) < width && (my as u32) < width;
            if inside && colors[(my as u32 * width + mx as u32) as usize] == Color::Dark {
                Luma([dark])
            } else {
                Luma([light])
            }
        })
    }

    pub(crate) fn png_bytes(image: &GrayImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_a_rendered_png() {
        let bytes = png_bytes(&render_qr("HELLO", 0, 255));
        assert_eq!(decode_image_bytes(&bytes), Ok("HELLO".to_string()));
    }

    /// Puts `left` and `right` side by side on a white canvas.
    fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
        let width = left.width() + right.width();
        let height = left.height().max(right.height());
        let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
        image::imageops::replace(&mut canvas, left, 0, 0);
        image::imageops::replace(&mut canvas, right, left.width() as i64, 0);
        canvas
    }

    /// Keeps the three finder corners of a `render_qr` image (so the grid is
    /// still found) and scrambles every other module.
    fn damage_data_area(image: &mut GrayImage) {
        let (quiet, scale) = (4, 8);
        let modules = image.width() / scale - 2 * quiet;
        let in_finder = |m: u32| m < 8 || m >= modules - 8;
        for my in 0..modules {
            for mx in 0..modules {
                if in_finder(mx) && in_finder(my) {
                    continue;
                }
                let dark = (mx + my) % 2 == 0;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (x, y) = ((mx + quiet) * scale + dx, (my + quiet) * scale + dy);
                        image.put_pixel(x, y, Luma([if dark { 0 } else { 255 }]));
                    }
                }
            }
        }
    }

    #[test]
    fn a_damaged_code_does_not_hide_a_readable_one() {
        let mut damaged = render_qr("DAMAGED-CODE-WITH-A-LONGER-PAYLOAD", 0, 255);
        damage_data_area(&mut damaged);
        let good = render_qr("HELLO", 0, 255);

        for image in [side_by_side(&damaged, &good), side_by_side(&good, &damaged)] {
            let (w, h) = image.dimensions();
            assert_eq!(decode_luma(w, h, image.into_raw()), Ok("HELLO".to_string()));
        }
    }

    #[test]
    fn decodes_a_low_contrast_frame() {
        let image = render_qr("https://example.org/pay?id=42", 110, 160);
        let (w, h) = image.dimensions();
        assert_eq!(
            decode_luma(w, h, image.into_raw()),
            Ok("https://example.org/pay?id=42".to_string())
        );
    }

    #[test]
    fn blank_image_has_no_code() {
        let blank = GrayImage::from_pixel(200, 200, Luma([255]));
        assert_eq!(decode_image_bytes(&png_bytes(&blank)), Err(EngineError::NoCode));
    }

    #[test]
    fn garbage_bytes_are_invalid() {
        assert!(matches!(
            decode_image_bytes(b"definitely not an image"),
            Err(EngineError::InvalidImage(_))
        ));
    }

    #[test]
    fn mismatched_buffer_is_invalid() {
        assert!(matches!(
            decode_luma(10, 10, vec![0; 5]),
            Err(EngineError::InvalidImage(_))
        ));
    }

    #[test]
    fn contrast_stretch_uses_full_range() {
        let mut luma = vec![100, 130, 185];
        assert!(stretch_contrast(&mut luma));
        assert_eq!(luma, vec![0, 90, 255]);

        let mut flat = vec![7; 4];
        assert!(!stretch_contrast(&mut flat));
        assert_eq!(flat, vec![7; 4]);

        let mut wide = vec![0, 255];
        assert!(!stretch_contrast(&mut wide));
    }

    #[test]
    fn luma_weights() {
        assert_eq!(luma_from_rgba(&[0, 0, 0, 255, 255, 0, 0, 255]), vec![0, 76]);
        assert_eq!(luma_from_rgba(&[0, 255, 0, 255, 1, 2]), vec![149]);
    }

    #[test]
    fn region_is_centred_and_clamped() {
        assert_eq!(
            centered_region(640, 480, 250),
            Region { x: 195, y: 115, size: 250 }
        );
        assert_eq!(
            centered_region(200, 100, 250),
            Region { x: 50, y: 0, size: 100 }
        );
    }
}
