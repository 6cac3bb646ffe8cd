//! Pixel helpers over `image::DynamicImage` shared by the real backends.
//!
//! Both [`RustBackend`](super::rust_backend::RustBackend) and
//! [`FastBackend`](super::fast_backend::FastBackend) decode, encode, blend and
//! draw text the same way; they differ only in how they resample and rotate.

use super::backend::{BackendError, Decoded};
use super::format::ImageFormat;
use super::geometry::{CropRegion, Dimensions};
use super::params::{Color, EncodeOptions, TextRequest};
use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::io::Cursor;

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::WebP => image::ImageFormat::WebP,
    }
}

/// Sniff the container from its magic bytes and decode it.
pub fn decode(bytes: &[u8]) -> Result<Decoded<DynamicImage>, BackendError> {
    let sniffed = image::guess_format(bytes)
        .map_err(|e| BackendError::UnsupportedFormat(format!("unrecognized image data: {e}")))?;
    let format = match sniffed {
        image::ImageFormat::Gif => ImageFormat::Gif,
        image::ImageFormat::Jpeg => ImageFormat::Jpeg,
        image::ImageFormat::Png => ImageFormat::Png,
        image::ImageFormat::WebP => ImageFormat::WebP,
        other => {
            return Err(BackendError::UnsupportedFormat(format!("{other:?}")));
        }
    };
    let image = image::load_from_memory_with_format(bytes, codec_format(format))
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode {format}: {e}")))?;
    Ok(Decoded {
        dimensions: Dimensions::new(image.width(), image.height()),
        image,
        format,
    })
}

/// Normalize to 8-bit RGB or RGBA, keeping alpha only if the source has it.
fn to_8bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Encode into `format`.
///
/// JPEG uses the configured quality. PNG drops alpha unless
/// `preserve_alpha`; GIF drops it unless `preserve_transparency`. WebP is
/// written losslessly.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    options: EncodeOptions,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encode_err =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("{format} encode failed: {e}"));

    match format {
        ImageFormat::Jpeg => {
            let quality = options.quality.value() as u8;
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => {
            let keep_alpha = match format {
                ImageFormat::Png => options.preserve_alpha,
                ImageFormat::Gif => options.preserve_transparency,
                _ => true,
            };
            let pixels = if keep_alpha {
                to_8bit(image)
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            };
            pixels
                .write_to(&mut Cursor::new(&mut out), codec_format(format))
                .map_err(encode_err)?;
        }
    }
    Ok(out)
}

pub fn crop(image: &DynamicImage, region: CropRegion) -> DynamicImage {
    image.crop_imm(region.x, region.y, region.width, region.height)
}

/// Composite `image` over a solid `color` canvas of the same size.
pub fn background(image: &DynamicImage, color: Color) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba(color.to_array()));
    imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

/// Blend `source` of `overlay` onto `image` at `percent` strength.
pub fn composite(
    image: &DynamicImage,
    overlay: &DynamicImage,
    source: CropRegion,
    dst_x: i64,
    dst_y: i64,
    percent: u8,
) -> DynamicImage {
    let mut base = image.to_rgba8();
    let mut patch = overlay
        .view(source.x, source.y, source.width, source.height)
        .to_image();
    let strength = u32::from(percent.min(100));
    for pixel in patch.pixels_mut() {
        pixel[3] = (u32::from(pixel[3]) * strength / 100) as u8;
    }
    imageops::overlay(&mut base, &patch, dst_x, dst_y);
    DynamicImage::ImageRgba8(base)
}

/// Place `image` centered on a `canvas`-sized buffer filled with `fill`.
/// Parts that do not fit are clipped.
pub fn center_on_canvas(image: DynamicImage, canvas: Dimensions, fill: Color) -> DynamicImage {
    if image.dimensions() == (canvas.width, canvas.height) {
        return image;
    }
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(fill.to_array()));
    let x = (i64::from(canvas.width) - i64::from(image.width())) / 2;
    let y = (i64::from(canvas.height) - i64::from(image.height())) / 2;
    imageops::replace(&mut out, &image.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(out)
}

/// Exact rotation for multiples of 90°. `None` for any other angle.
pub fn rotate_right_angle(image: &DynamicImage, degrees: f64) -> Option<DynamicImage> {
    let turns = degrees.rem_euclid(360.0) / 90.0;
    if turns.fract() != 0.0 {
        return None;
    }
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    let rotated = match (turns as u8) % 4 {
        0 => image.clone(),
        1 => image.rotate90(),
        2 => image.rotate180(),
        _ => image.rotate270(),
    };
    Some(rotated)
}

/// Clockwise rotation by any angle, bilinear, about the image center,
/// rendered onto a `canvas`-sized buffer.
pub fn rotate_warp(
    image: &DynamicImage,
    degrees: f64,
    canvas: Dimensions,
    background: Color,
) -> DynamicImage {
    let source = image.to_rgba8();
    let projection = Projection::translate(canvas.width as f32 / 2.0, canvas.height as f32 / 2.0)
        * Projection::rotate(degrees.to_radians() as f32)
        * Projection::translate(-(source.width() as f32) / 2.0, -(source.height() as f32) / 2.0);
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgba(background.to_array()),
        &mut out,
    );
    DynamicImage::ImageRgba8(out)
}

fn load_font(font: &[u8]) -> Result<FontVec, BackendError> {
    FontVec::try_from_vec(font.to_vec())
        .map_err(|e| BackendError::ProcessingFailed(format!("invalid font: {e}")))
}

/// Font size in points to pixels at 96 dpi.
fn px_scale(size: f32) -> PxScale {
    PxScale::from(size * 96.0 / 72.0)
}

pub fn text_extent(font: &[u8], size: f32, text: &str) -> Result<Dimensions, BackendError> {
    let font = load_font(font)?;
    let (width, height) = imageproc::drawing::text_size(px_scale(size), &font, text);
    Ok(Dimensions::new(width, height))
}

/// Render one line of text. A non-zero angle rotates the text block
/// counter-clockwise about its own center.
pub fn draw_text(
    image: &DynamicImage,
    font: &[u8],
    request: &TextRequest,
    origin: (i32, i32),
) -> Result<DynamicImage, BackendError> {
    let font = load_font(font)?;
    let scale = px_scale(request.size);
    let mut base = image.to_rgba8();
    let color = Rgba(request.color.to_array());

    if request.angle == 0.0 {
        imageproc::drawing::draw_text_mut(
            &mut base,
            color,
            origin.0,
            origin.1,
            scale,
            &font,
            &request.text,
        );
        return Ok(DynamicImage::ImageRgba8(base));
    }

    // Render onto a square transparent layer large enough for any rotation,
    // then blend the rotated layer over the image.
    let (w, h) = imageproc::drawing::text_size(scale, &font, &request.text);
    let side = (f64::from(w).hypot(f64::from(h)).ceil() as u32).max(1);
    let inset_x = (side - w.min(side)) / 2;
    let inset_y = (side - h.min(side)) / 2;
    let mut layer = RgbaImage::from_pixel(side, side, Rgba([color[0], color[1], color[2], 0]));
    imageproc::drawing::draw_text_mut(
        &mut layer,
        color,
        inset_x as i32,
        inset_y as i32,
        scale,
        &font,
        &request.text,
    );
    let rotated = imageproc::geometric_transformations::rotate_about_center(
        &layer,
        -request.angle.to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );
    imageops::overlay(
        &mut base,
        &rotated,
        i64::from(origin.0) - i64::from(inset_x),
        i64::from(origin.1) - i64::from(inset_y),
    );
    Ok(DynamicImage::ImageRgba8(base))
}
