//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the whole pixel-level surface the
//! orchestrator needs: decode, scale, crop, rotate, composite, text, encode.
//! Geometry is always decided by the caller; a backend only executes the
//! transform it is handed.
//!
//! | Operation | [`RustBackend`](super::rust_backend::RustBackend) | [`FastBackend`](super::fast_backend::FastBackend) |
//! |---|---|---|
//! | Decode / encode | `image` codecs | `image` codecs |
//! | Scale | `imageops::resize`, Lanczos3 | `fast_image_resize`, Lanczos3 |
//! | Crop | `crop_imm` | `crop_imm` |
//! | Rotate | right angles only | any angle (`imageproc` warp) |
//! | Background / composite | shared alpha blending | shared alpha blending |
//! | Text | `imageproc` + `ab_glyph` | `imageproc` + `ab_glyph` |
//!
//! Buffers are owned values (`Self::Image`). Every transform borrows its input
//! and returns a new buffer, so a failed transform leaves the caller's buffer
//! intact. Resources are released when the buffer is dropped.

use super::format::ImageFormat;
use super::geometry::{CropRegion, Dimensions};
use super::params::{Color, EncodeOptions, TextRequest};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// A freshly decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<I> {
    pub image: I,
    pub dimensions: Dimensions,
    pub format: ImageFormat,
}

/// Trait for image processing backends.
///
/// Every backend implements the full operation set so the orchestrator never
/// branches on which one is active. See the [module docs](self) for the
/// parity table.
pub trait ImageBackend: Sync {
    /// The backend's in-memory pixel buffer.
    type Image;

    /// Short identifier used in logs and config (`"rust"`, `"fast"`).
    fn name(&self) -> &'static str;

    /// Decode GIF, JPEG, PNG or WebP bytes. Anything else is
    /// [`BackendError::UnsupportedFormat`].
    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Self::Image>, BackendError>;

    /// Resample to exactly `size`.
    fn scale(&self, image: &Self::Image, size: Dimensions) -> Result<Self::Image, BackendError>;

    /// Cut out `region`, which the caller guarantees lies inside the image.
    fn crop(&self, image: &Self::Image, region: CropRegion) -> Result<Self::Image, BackendError>;

    /// Rotate clockwise by `degrees` about the center, rendering onto a
    /// `canvas`-sized buffer. Uncovered pixels are `background`.
    fn rotate(
        &self,
        image: &Self::Image,
        degrees: f64,
        canvas: Dimensions,
        background: Color,
    ) -> Result<Self::Image, BackendError>;

    /// Composite the image over a solid canvas of `color` (alpha included).
    fn background(&self, image: &Self::Image, color: Color) -> Result<Self::Image, BackendError>;

    /// Blend `source` of `overlay` onto the image with its top-left corner at
    /// (`dst_x`, `dst_y`). Pixels falling outside the image are skipped.
    fn composite(
        &self,
        image: &Self::Image,
        overlay: &Self::Image,
        source: CropRegion,
        dst_x: i64,
        dst_y: i64,
        percent: u8,
    ) -> Result<Self::Image, BackendError>;

    /// Pixel extent of `text` rendered with `font` at `size` points.
    fn text_extent(&self, font: &[u8], size: f32, text: &str) -> Result<Dimensions, BackendError>;

    /// Render `request` with its top-left corner at `origin`.
    fn draw_text(
        &self,
        image: &Self::Image,
        font: &[u8],
        request: &TextRequest,
        origin: (i32, i32),
    ) -> Result<Self::Image, BackendError>;

    fn encode(
        &self,
        image: &Self::Image,
        format: ImageFormat,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, BackendError>;

    /// Encode and write to `path`.
    fn write(
        &self,
        image: &Self::Image,
        path: &Path,
        format: ImageFormat,
        options: EncodeOptions,
    ) -> Result<(), BackendError> {
        let bytes = self.encode(image, format, options)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching pixels.
    ///
    /// Its "image" is just the buffer's dimensions, so every orchestrator
    /// decision can be checked against the recorded calls. Uses Mutex (not
    /// RefCell) so it is Sync like the real backends.
    #[derive(Default)]
    pub struct MockBackend {
        pub source: Option<(Dimensions, ImageFormat)>,
        /// Name of an operation that should fail (`"scale"`, `"crop"`, ...).
        pub fail_on: Option<&'static str>,
        /// Reject rotations that are not right angles, like `RustBackend`.
        pub right_angles_only: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Scale(Dimensions),
        Crop(CropRegion),
        Rotate {
            degrees: f64,
            canvas: Dimensions,
        },
        Background(Color),
        Composite {
            source: CropRegion,
            dst_x: i64,
            dst_y: i64,
            percent: u8,
        },
        TextExtent(String),
        DrawText {
            origin: (i32, i32),
            text: String,
        },
        Encode {
            format: ImageFormat,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every decode yields an image of this size and format.
        pub fn with_source(width: u32, height: u32, format: ImageFormat) -> Self {
            Self {
                source: Some((Dimensions::new(width, height), format)),
                ..Self::default()
            }
        }

        pub fn failing(mut self, op: &'static str) -> Self {
            self.fail_on = Some(op);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Recorded operations other than decode and text measurement.
        pub fn transforms(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| !matches!(op, RecordedOp::Decode(_) | RecordedOp::TextExtent(_)))
                .collect()
        }

        fn record(&self, name: &str, op: RecordedOp) -> Result<(), BackendError> {
            if self.fail_on == Some(name) {
                return Err(BackendError::ProcessingFailed(format!("mock {name} failure")));
            }
            self.operations.lock().unwrap().push(op);
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        type Image = Dimensions;

        fn name(&self) -> &'static str {
            "mock"
        }

        fn decode(&self, bytes: &[u8]) -> Result<Decoded<Dimensions>, BackendError> {
            self.record("decode", RecordedOp::Decode(bytes.len()))?;
            let (dimensions, format) = self
                .source
                .ok_or_else(|| BackendError::UnsupportedFormat("no mock source".into()))?;
            Ok(Decoded {
                image: dimensions,
                dimensions,
                format,
            })
        }

        fn scale(&self, _image: &Dimensions, size: Dimensions) -> Result<Dimensions, BackendError> {
            self.record("scale", RecordedOp::Scale(size))?;
            Ok(size)
        }

        fn crop(&self, image: &Dimensions, region: CropRegion) -> Result<Dimensions, BackendError> {
            assert!(
                region.x + region.width <= image.width && region.y + region.height <= image.height,
                "crop {region:?} outside {image}"
            );
            self.record("crop", RecordedOp::Crop(region))?;
            Ok(region.size())
        }

        fn rotate(
            &self,
            _image: &Dimensions,
            degrees: f64,
            canvas: Dimensions,
            _background: Color,
        ) -> Result<Dimensions, BackendError> {
            if self.right_angles_only && degrees.rem_euclid(90.0) != 0.0 {
                return Err(BackendError::Unsupported(format!(
                    "rotation by {degrees} degrees"
                )));
            }
            self.record("rotate", RecordedOp::Rotate { degrees, canvas })?;
            Ok(canvas)
        }

        fn background(&self, image: &Dimensions, color: Color) -> Result<Dimensions, BackendError> {
            self.record("background", RecordedOp::Background(color))?;
            Ok(*image)
        }

        fn composite(
            &self,
            image: &Dimensions,
            _overlay: &Dimensions,
            source: CropRegion,
            dst_x: i64,
            dst_y: i64,
            percent: u8,
        ) -> Result<Dimensions, BackendError> {
            self.record(
                "composite",
                RecordedOp::Composite {
                    source,
                    dst_x,
                    dst_y,
                    percent,
                },
            )?;
            Ok(*image)
        }

        fn text_extent(
            &self,
            _font: &[u8],
            size: f32,
            text: &str,
        ) -> Result<Dimensions, BackendError> {
            self.record("text_extent", RecordedOp::TextExtent(text.to_string()))?;
            // Half-em advance per character.
            let width = (text.chars().count() as f32 * size / 2.0).ceil() as u32;
            Ok(Dimensions::new(width, size.ceil() as u32))
        }

        fn draw_text(
            &self,
            image: &Dimensions,
            _font: &[u8],
            request: &TextRequest,
            origin: (i32, i32),
        ) -> Result<Dimensions, BackendError> {
            self.record(
                "draw_text",
                RecordedOp::DrawText {
                    origin,
                    text: request.text.clone(),
                },
            )?;
            Ok(*image)
        }

        fn encode(
            &self,
            image: &Dimensions,
            format: ImageFormat,
            options: EncodeOptions,
        ) -> Result<Vec<u8>, BackendError> {
            self.record(
                "encode",
                RecordedOp::Encode {
                    format,
                    quality: options.quality.value(),
                },
            )?;
            Ok(format!("{format} {image}").into_bytes())
        }
    }

    #[test]
    fn mock_decode_reports_source() {
        let backend = MockBackend::with_source(800, 600, ImageFormat::Png);
        let decoded = backend.decode(b"bytes").unwrap();
        assert_eq!(decoded.dimensions, Dimensions::new(800, 600));
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(5)]);
    }

    #[test]
    fn mock_without_source_is_unsupported() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(b""),
            Err(BackendError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn mock_failure_is_not_recorded() {
        let backend = MockBackend::with_source(10, 10, ImageFormat::Png).failing("scale");
        let result = backend.scale(&Dimensions::new(10, 10), Dimensions::new(5, 5));
        assert!(result.is_err());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn default_write_encodes_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let backend = MockBackend::new();
        backend
            .write(
                &Dimensions::new(4, 3),
                &path,
                ImageFormat::Png,
                EncodeOptions::default(),
            )
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PNG 4x3");
    }
}
