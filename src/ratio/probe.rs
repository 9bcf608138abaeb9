//! Pixel dimensions from raw image bytes.
use std::io::Cursor;

use image::ImageReader;

use super::matcher::{closest_in, Ratio, STANDARD_RATIOS};

/// Read `(width, height)` from the image header. Only the header is decoded.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = match ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("image format probe failed: {}", e);
            return None;
        }
    };
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            tracing::debug!("image dimension probe failed: {}", e);
            None
        }
    }
}

/// Closest [`STANDARD_RATIOS`] label for an encoded image; unreadable input gives `"1:1"`.
pub fn ratio_from_image(bytes: &[u8]) -> &'static str {
    ratio_from_image_in(STANDARD_RATIOS, bytes)
}

pub fn ratio_from_image_in(table: &[Ratio], bytes: &[u8]) -> &'static str {
    let dims = image_dimensions(bytes);
    closest_in(table, dims.map(|d| d.0), dims.map(|d| d.1))
}
