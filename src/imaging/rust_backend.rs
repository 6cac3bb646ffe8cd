//! Backend built on the `image` crate's own resampler.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (GIF, JPEG, PNG, WebP) | `image::load_from_memory_with_format` |
//! | Scale | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Rotate | `rotate90` / `rotate180` / `rotate270`, right angles only |
//! | Encode | `image` encoders (`JpegEncoder::new_with_quality` for JPEG) |
//! | Text | `imageproc::drawing` + `ab_glyph` |

use super::backend::{BackendError, Decoded, ImageBackend};
use super::format::ImageFormat;
use super::geometry::{CropRegion, Dimensions};
use super::params::{Color, EncodeOptions, TextRequest};
use super::raster;
use image::DynamicImage;
use image::imageops::FilterType;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn name(&self) -> &'static str {
        "rust"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<DynamicImage>, BackendError> {
        raster::decode(bytes)
    }

    fn scale(&self, image: &DynamicImage, size: Dimensions) -> Result<DynamicImage, BackendError> {
        Ok(image.resize_exact(size.width, size.height, FilterType::Lanczos3))
    }

    fn crop(&self, image: &DynamicImage, region: CropRegion) -> Result<DynamicImage, BackendError> {
        Ok(raster::crop(image, region))
    }

    fn rotate(
        &self,
        image: &DynamicImage,
        degrees: f64,
        canvas: Dimensions,
        background: Color,
    ) -> Result<DynamicImage, BackendError> {
        let rotated = raster::rotate_right_angle(image, degrees).ok_or_else(|| {
            BackendError::Unsupported(format!(
                "rust backend rotates by multiples of 90 degrees only, got {degrees}"
            ))
        })?;
        Ok(raster::center_on_canvas(rotated, canvas, background))
    }

    fn background(&self, image: &DynamicImage, color: Color) -> Result<DynamicImage, BackendError> {
        Ok(raster::background(image, color))
    }

    fn composite(
        &self,
        image: &DynamicImage,
        overlay: &DynamicImage,
        source: CropRegion,
        dst_x: i64,
        dst_y: i64,
        percent: u8,
    ) -> Result<DynamicImage, BackendError> {
        Ok(raster::composite(image, overlay, source, dst_x, dst_y, percent))
    }

    fn text_extent(&self, font: &[u8], size: f32, text: &str) -> Result<Dimensions, BackendError> {
        raster::text_extent(font, size, text)
    }

    fn draw_text(
        &self,
        image: &DynamicImage,
        font: &[u8],
        request: &TextRequest,
        origin: (i32, i32),
    ) -> Result<DynamicImage, BackendError> {
        raster::draw_text(image, font, request, origin)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, BackendError> {
        raster::encode(image, format, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_test_image, gradient};
    use image::GenericImageView;

    #[test]
    fn decode_synthetic_jpeg() {
        let bytes = encode_test_image(&gradient(200, 150), ImageFormat::Jpeg);
        let decoded = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions, Dimensions::new(200, 150));
        assert_eq!(decoded.format, ImageFormat::Jpeg);
    }

    #[test]
    fn scale_is_exact() {
        let backend = RustBackend::new();
        let scaled = backend
            .scale(&gradient(400, 300), Dimensions::new(123, 77))
            .unwrap();
        assert_eq!(scaled.dimensions(), (123, 77));
    }

    #[test]
    fn crop_takes_region() {
        let backend = RustBackend::new();
        let region = CropRegion::centered(Dimensions::new(400, 300), 100, 50);
        let cropped = backend.crop(&gradient(400, 300), region).unwrap();
        assert_eq!(cropped.dimensions(), (100, 50));
    }

    #[test]
    fn rotate_right_angle_fills_swapped_canvas() {
        let backend = RustBackend::new();
        let rotated = backend
            .rotate(
                &gradient(80, 40),
                90.0,
                Dimensions::new(40, 80),
                Color::TRANSPARENT,
            )
            .unwrap();
        assert_eq!(rotated.dimensions(), (40, 80));
    }

    #[test]
    fn rotate_half_turn_keeps_canvas_contract() {
        let backend = RustBackend::new();
        let rotated = backend
            .rotate(
                &gradient(80, 40),
                180.0,
                Dimensions::new(40, 80),
                Color::TRANSPARENT,
            )
            .unwrap();
        assert_eq!(rotated.dimensions(), (40, 80));
    }

    #[test]
    fn rotate_arbitrary_angle_is_unsupported() {
        let backend = RustBackend::new();
        let result = backend.rotate(
            &gradient(80, 40),
            45.0,
            Dimensions::new(40, 80),
            Color::TRANSPARENT,
        );
        assert!(matches!(result, Err(BackendError::Unsupported(_))));
    }

    #[test]
    fn write_to_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.webp");
        RustBackend::new()
            .write(
                &gradient(32, 32),
                &path,
                ImageFormat::WebP,
                EncodeOptions::default(),
            )
            .unwrap();
        let (w, h) = image::image_dimensions(&path).unwrap();
        assert_eq!((w, h), (32, 32));
    }

    #[test]
    fn write_to_missing_directory_is_io_error() {
        let result = RustBackend::new().write(
            &gradient(8, 8),
            std::path::Path::new("/nonexistent/dir/out.png"),
            ImageFormat::Png,
            EncodeOptions::default(),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn thumbnail_text_with_garbage_font_is_backend_error() {
        use crate::imaging::{Options, TextRequest, ThumbError, Thumbnail};

        let tmp = tempfile::TempDir::new().unwrap();
        let font = tmp.path().join("f.ttf");
        std::fs::write(&font, b"definitely not truetype").unwrap();
        let bytes = encode_test_image(&gradient(60, 40), ImageFormat::Png);
        let mut thumb = Thumbnail::from_bytes(&bytes, Options::default(), RustBackend::new()).unwrap();

        let result = thumb.draw_text(&TextRequest {
            size: 12.0,
            angle: 30.0,
            x: 0,
            y: 0,
            color: Color::BLACK,
            font,
            text: "abc".into(),
        });
        assert!(matches!(result, Err(ThumbError::Backend(_))));
        assert_eq!(thumb.dimensions(), Dimensions::new(60, 40));
    }
}
