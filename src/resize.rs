//! Decode-and-resize: the expensive synchronous step workers run off-thread.
//!
//! The pipeline treats resizing as an opaque function; [`fit_resize`] is the
//! stock implementation. It scales to the viewport width (aspect preserved,
//! Lanczos3) and re-encodes as JPEG quality 75, so cached entries stay small
//! compared to raw RGBA.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::debug;

use crate::error::RenderError;

/// Synchronous resize function: `(raw_bytes, width, height) -> resized_bytes`.
///
/// Must be safe to call concurrently from multiple worker threads.
pub type ResizeFn = Arc<dyn Fn(&[u8], u32, u32) -> Result<Vec<u8>, RenderError> + Send + Sync>;

/// Decode raw image bytes and scale them to fit the viewport width.
///
/// Height participates only in the cache key; the scale factor is
/// `width / original_width` so tall pages keep their full length and the
/// presentation layer scrolls them vertically.
pub fn fit_resize(raw: &[u8], width: u32, _height: u32) -> Result<Vec<u8>, RenderError> {
    let img = image::load_from_memory(raw).map_err(|e| RenderError::Decode(e.to_string()))?;

    let orig_w = img.width().max(1);
    let orig_h = img.height().max(1);
    let target_w = width.max(1);
    let scale = target_w as f64 / orig_w as f64;
    let target_h = ((orig_h as f64 * scale).round() as u32).max(1);

    debug!(
        "Resizing {}x{} -> {}x{} (scale {:.3})",
        orig_w, orig_h, target_w, target_h, scale
    );

    let resized = img.resize_exact(target_w, target_h, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, 75);
    rgb.write_with_encoder(encoder)
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Wrap [`fit_resize`] as a shareable [`ResizeFn`].
pub fn default_resize_fn() -> ResizeFn {
    Arc::new(fit_resize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn sample_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Test: Width-fit scaling
    /// Validates: Output width equals target, height follows the aspect ratio
    #[test]
    fn test_fit_resize_dimensions() {
        let raw = sample_png(40, 80);
        let resized = fit_resize(&raw, 20, 999).unwrap();
        let out = image::load_from_memory(&resized).unwrap();
        assert_eq!(out.width(), 20);
        assert_eq!(out.height(), 40);
    }

    /// Test: Malformed input
    /// Validates: Decode error, not a panic
    #[test]
    fn test_fit_resize_malformed() {
        let err = fit_resize(b"definitely not an image", 100, 100).unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_fit_resize_upscales() {
        let raw = sample_png(10, 10);
        let resized = fit_resize(&raw, 30, 30).unwrap();
        let out = image::load_from_memory(&resized).unwrap();
        assert_eq!(out.width(), 30);
        assert_eq!(out.height(), 30);
    }
}
