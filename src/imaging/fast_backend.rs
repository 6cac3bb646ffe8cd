//! Alternative backend: SIMD resampling through `fast_image_resize`.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Scale | `fast_image_resize::Resizer`, Lanczos3 convolution, alpha-aware |
//! | Rotate | right angles exact, other angles `imageproc` projective warp |
//! | Everything else | shared with [`RustBackend`](super::rust_backend::RustBackend) |

use super::backend::{BackendError, Decoded, ImageBackend};
use super::format::ImageFormat;
use super::geometry::{CropRegion, Dimensions};
use super::params::{Color, EncodeOptions, TextRequest};
use super::raster;
use fast_image_resize::{self as fir, PixelType, ResizeOptions};
use image::{DynamicImage, RgbImage, RgbaImage};

#[derive(Debug, Clone, Copy, Default)]
pub struct FastBackend;

impl FastBackend {
    pub fn new() -> Self {
        Self
    }
}

fn resize_failed(e: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("fast resize: {e}"))
}

/// Resample through `fast_image_resize`, staying in RGB when there is no alpha.
fn fast_resize(image: &DynamicImage, size: Dimensions) -> Result<DynamicImage, BackendError> {
    let (pixel_type, pixels) = if image.color().has_alpha() {
        (PixelType::U8x4, image.to_rgba8().into_raw())
    } else {
        (PixelType::U8x3, image.to_rgb8().into_raw())
    };

    let src = fir::images::Image::from_vec_u8(image.width(), image.height(), pixels, pixel_type)
        .map_err(resize_failed)?;
    let mut dst = fir::images::Image::new(size.width, size.height, pixel_type);

    let options = ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
        .use_alpha(true);
    fir::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(resize_failed)?;

    let raw = dst.into_vec();
    let rebuilt = match pixel_type {
        PixelType::U8x4 => {
            RgbaImage::from_raw(size.width, size.height, raw).map(DynamicImage::ImageRgba8)
        }
        _ => RgbImage::from_raw(size.width, size.height, raw).map(DynamicImage::ImageRgb8),
    };
    rebuilt.ok_or_else(|| resize_failed("resized buffer has the wrong length"))
}

impl ImageBackend for FastBackend {
    type Image = DynamicImage;

    fn name(&self) -> &'static str {
        "fast"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<DynamicImage>, BackendError> {
        raster::decode(bytes)
    }

    fn scale(&self, image: &DynamicImage, size: Dimensions) -> Result<DynamicImage, BackendError> {
        fast_resize(image, size)
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
        match raster::rotate_right_angle(image, degrees) {
            Some(rotated) => Ok(raster::center_on_canvas(rotated, canvas, background)),
            None => Ok(raster::rotate_warp(image, degrees, canvas, background)),
        }
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
