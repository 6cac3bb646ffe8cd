//! The chainable image handle.
//!
//! A [`Thumbnail`] owns one decoded buffer, its [`GeometryState`], the
//! handle's [`Options`] and the backend that produced the buffer. Every
//! transform follows the same steps:
//!
//! 1. validate arguments ([`ThumbError::Argument`] on bad input)
//! 2. derive target geometry with [`calculations`](super::calculations)
//! 3. clamp it against the current extent (never an error)
//! 4. hand the backend the concrete transform
//! 5. replace buffer and state together
//!
//! The buffer is replaced only after the backend returns a new one, so a
//! failed transform leaves the handle exactly as it was.
//!
//! ```no_run
//! # use simple_thumb::imaging::{Options, RustBackend, Thumbnail};
//! # fn main() -> simple_thumb::imaging::Result<()> {
//! let mut thumb = Thumbnail::open("photo.jpg", Options::default(), RustBackend::new())?;
//! thumb.resize(800, 0)?.adaptive_resize(300, 300)?.rotate(90.0)?;
//! thumb.save("thumb.png")?;
//! # Ok(())
//! # }
//! ```

use super::backend::{BackendError, ImageBackend};
use super::calculations::{target_geometry, text_origin};
use super::format::ImageFormat;
use super::geometry::{CropRegion, Dimensions, GeometryState, ResizeConstraint};
use super::params::{Color, MergeRequest, Options, TextRequest};
use super::response::Response;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ThumbError {
    #[error("Invalid argument: {0}")]
    Argument(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Resource unavailable: {0}")]
    Resource(String),
    #[error("Invalid state: {0}")]
    State(String),
    #[error("Source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<BackendError> for ThumbError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => ThumbError::Io(e),
            BackendError::UnsupportedFormat(msg) => ThumbError::UnsupportedFormat(msg),
            BackendError::Unsupported(msg) => ThumbError::Resource(msg),
            BackendError::ProcessingFailed(msg) => ThumbError::Backend(msg),
        }
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ThumbError>;

/// A decoded image plus the state needed to keep transforming it.
///
/// Single owner, no internal locking: chain calls through `&mut self`.
pub struct Thumbnail<B: ImageBackend> {
    backend: B,
    image: B::Image,
    state: GeometryState,
    options: Options,
    format: ImageFormat,
}

fn require_positive(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(ThumbError::Argument(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(())
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ThumbError::Argument(format!("{name} must be a finite number")));
    }
    Ok(())
}

impl<B: ImageBackend> Thumbnail<B> {
    // -- Construction ---------------------------------------------------------

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>, options: Options, backend: B) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ThumbError::SourceNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "read source image");
        Self::from_bytes(&bytes, options, backend)
    }

    /// Decode an in-memory image.
    pub fn from_bytes(bytes: &[u8], options: Options, backend: B) -> Result<Self> {
        options.validate().map_err(ThumbError::Argument)?;
        let decoded = backend.decode(bytes)?;
        let state = GeometryState::new(decoded.dimensions.width, decoded.dimensions.height)
            .ok_or_else(|| {
                ThumbError::UnsupportedFormat(format!(
                    "{} image has zero extent ({})",
                    decoded.format, decoded.dimensions
                ))
            })?;
        debug!(
            backend = backend.name(),
            format = %decoded.format,
            width = state.width(),
            height = state.height(),
            "decoded image"
        );
        Ok(Self {
            backend,
            image: decoded.image,
            state,
            options,
            format: decoded.format,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.state.width()
    }

    pub fn height(&self) -> u32 {
        self.state.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.state.dimensions()
    }

    pub fn geometry(&self) -> GeometryState {
        self.state
    }

    /// Format the source was decoded from; used by [`to_bytes`](Self::to_bytes).
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn image(&self) -> &B::Image {
        &self.image
    }

    pub fn into_image(self) -> B::Image {
        self.image
    }

    pub fn set_options(&mut self, options: Options) -> Result<&mut Self> {
        options.validate().map_err(ThumbError::Argument)?;
        self.options = options;
        Ok(self)
    }

    pub fn set_resize_up(&mut self, resize_up: bool) -> &mut Self {
        self.options.resize_up = resize_up;
        self
    }

    pub fn set_quality(&mut self, quality: u32) -> Result<&mut Self> {
        let options = Options {
            quality,
            ..self.options
        };
        self.set_options(options)
    }

    // -- Geometry transforms --------------------------------------------------

    /// Clamp a requested box to the current extent unless upscaling is allowed.
    /// Zero stays zero ("unconstrained").
    fn clamp_box(&self, width: u32, height: u32) -> Dimensions {
        if self.options.resize_up {
            Dimensions::new(width, height)
        } else {
            Dimensions::new(width.min(self.width()), height.min(self.height()))
        }
    }

    fn apply_scale(&mut self, target: Dimensions) -> Result<()> {
        let next = GeometryState::from_target(target);
        let image = self.backend.scale(&self.image, next.dimensions())?;
        self.image = image;
        self.state = next;
        Ok(())
    }

    fn apply_crop(&mut self, region: CropRegion) -> Result<()> {
        if region.is_full(self.dimensions()) {
            return Ok(());
        }
        let image = self.backend.crop(&self.image, region)?;
        self.image = image;
        self.state = GeometryState::from_target(region.size());
        Ok(())
    }

    /// Fit inside `max_width`×`max_height`, keeping the aspect ratio.
    ///
    /// Zero leaves an axis unconstrained. Without `resize_up` the box is
    /// first clamped to the current size, so this never enlarges.
    pub fn resize(&mut self, max_width: u32, max_height: u32) -> Result<&mut Self> {
        let bound = self.clamp_box(max_width, max_height);
        let Some(target) = target_geometry(
            self.dimensions(),
            ResizeConstraint::MaxBox {
                max_width: bound.width,
                max_height: bound.height,
            },
        ) else {
            return Ok(self);
        };
        debug!(
            from = %self.dimensions(),
            max = %bound,
            to = %target,
            "resize"
        );
        self.apply_scale(target)?;
        Ok(self)
    }

    /// Scale to cover `width`×`height`, then crop the overflow from the center.
    ///
    /// The cover size is scaled to directly rather than through [`resize`](Self::resize),
    /// whose bounding-box rounding can land a pixel short of the target.
    pub fn adaptive_resize(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        require_positive("width", width)?;
        require_positive("height", height)?;

        let bound = self.clamp_box(width, height);
        let Some(cover) = target_geometry(
            self.dimensions(),
            ResizeConstraint::StrictBox {
                width: bound.width,
                height: bound.height,
            },
        ) else {
            return Ok(self);
        };
        debug!(
            from = %self.dimensions(),
            target = %bound,
            intermediate = %cover,
            "adaptive resize"
        );
        self.apply_scale(cover)?;

        let target = self.clamp_box(width, height);
        let region = CropRegion::adaptive(self.dimensions(), target);
        debug!(x = region.x, y = region.y, size = %region.size(), "adaptive crop");
        self.apply_crop(region)?;
        Ok(self)
    }

    /// Scale both axes by `percent`. Zero is a no-op.
    pub fn resize_percent(&mut self, percent: u32) -> Result<&mut Self> {
        let Some(target) = target_geometry(self.dimensions(), ResizeConstraint::Percent(percent)) else {
            debug!("resize by 0 percent skipped");
            return Ok(self);
        };
        debug!(percent, from = %self.dimensions(), to = %target, "percent resize");
        self.apply_scale(target)?;
        Ok(self)
    }

    /// Cut a region out of the image.
    ///
    /// Out-of-bounds input is corrected, never rejected: the size is clamped
    /// to the image, an origin that runs off the far edge is pulled back, and
    /// negative origins become zero.
    pub fn crop(&mut self, x: i64, y: i64, width: u32, height: u32) -> Result<&mut Self> {
        require_positive("crop width", width)?;
        require_positive("crop height", height)?;

        let region = CropRegion::clamped(self.dimensions(), x, y, width, height);
        debug!(
            requested_x = x,
            requested_y = y,
            x = region.x,
            y = region.y,
            size = %region.size(),
            "crop"
        );
        self.apply_crop(region)?;
        Ok(self)
    }

    /// Crop a centered `width`×`height` region (`height` defaults to `width`).
    pub fn crop_from_center(&mut self, width: u32, height: Option<u32>) -> Result<&mut Self> {
        let height = height.unwrap_or(width);
        require_positive("crop width", width)?;
        require_positive("crop height", height)?;

        let region = CropRegion::centered(self.dimensions(), width, height);
        self.crop(
            i64::from(region.x),
            i64::from(region.y),
            region.width,
            region.height,
        )
    }

    /// Rotate clockwise by `degrees`.
    ///
    /// Width and height are swapped whatever the angle, and the backend
    /// renders onto that swapped canvas. For multiples of 180° this clips
    /// the image to the swapped box.
    pub fn rotate(&mut self, degrees: f64) -> Result<&mut Self> {
        require_finite("degrees", degrees)?;

        let next = self.state.swapped();
        debug!(degrees, from = %self.dimensions(), to = %next.dimensions(), "rotate");
        let image = self.backend.rotate(
            &self.image,
            degrees,
            next.dimensions(),
            Color::TRANSPARENT,
        )?;
        self.image = image;
        self.state = next;
        Ok(self)
    }

    // -- Compositing ----------------------------------------------------------

    /// Put the image over a solid `color` at `opacity` percent.
    pub fn background(&mut self, color: Color, opacity: u32) -> Result<&mut Self> {
        let opacity = u8::try_from(opacity)
            .ok()
            .filter(|o| *o <= 100)
            .ok_or_else(|| {
                ThumbError::Argument(format!("opacity must be 0-100, got {opacity}"))
            })?;

        let fill = color.with_opacity(opacity);
        debug!(color = %color, opacity, "background");
        let image = self.backend.background(&self.image, fill)?;
        self.image = image;
        Ok(self)
    }

    /// Blend a region of `overlay` onto this image.
    pub fn copy_merge(&mut self, overlay: &Thumbnail<B>, request: MergeRequest) -> Result<&mut Self> {
        require_positive("source width", request.src_width)?;
        require_positive("source height", request.src_height)?;
        let percent = u8::try_from(request.percent)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                ThumbError::Argument(format!(
                    "merge percent must be 0-100, got {}",
                    request.percent
                ))
            })?;

        let source = CropRegion::clamped(
            overlay.dimensions(),
            request.src_x,
            request.src_y,
            request.src_width,
            request.src_height,
        );
        debug!(
            dst_x = request.dst_x,
            dst_y = request.dst_y,
            source = ?source,
            percent,
            "copy merge"
        );
        let image = self.backend.composite(
            &self.image,
            &overlay.image,
            source,
            request.dst_x,
            request.dst_y,
            percent,
        )?;
        self.image = image;
        Ok(self)
    }

    /// Draw one line of text. Negative `x`/`y` anchor from the far edges.
    pub fn draw_text(&mut self, request: &TextRequest) -> Result<&mut Self> {
        require_finite("text size", f64::from(request.size))?;
        if request.size <= 0.0 {
            return Err(ThumbError::Argument(
                "text size must be greater than zero".into(),
            ));
        }
        require_finite("text angle", f64::from(request.angle))?;

        let font = std::fs::read(&request.font)?;
        let extent = self
            .backend
            .text_extent(&font, request.size, &request.text)?;
        let origin = text_origin(self.dimensions(), extent, request.x, request.y);
        debug!(
            text = %request.text,
            extent = %extent,
            x = origin.0,
            y = origin.1,
            "draw text"
        );
        let image = self
            .backend
            .draw_text(&self.image, &font, request, origin)?;
        self.image = image;
        Ok(self)
    }

    // -- Output ---------------------------------------------------------------

    /// Write to `path`, picking the format from its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<&Self> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path).ok_or_else(|| {
            ThumbError::UnsupportedFormat(format!(
                "cannot save {}: extension must be gif, jpg, jpeg, png or webp",
                path.display()
            ))
        })?;
        self.save_as(path, format)
    }

    /// Write to `path` as `format`, whatever the extension says.
    pub fn save_as(&self, path: impl AsRef<Path>, format: ImageFormat) -> Result<&Self> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Err(ThumbError::Resource(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }
        if std::fs::metadata(dir)?.permissions().readonly() {
            return Err(ThumbError::Resource(format!(
                "output directory {} is not writable",
                dir.display()
            )));
        }

        debug!(path = %path.display(), format = %format, size = %self.dimensions(), "save");
        self.backend
            .write(&self.image, path, format, self.options.encode_options())
            .map_err(|e| match e {
                BackendError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                    ThumbError::Resource(format!("cannot write {}: {io}", path.display()))
                }
                other => other.into(),
            })?;
        Ok(self)
    }

    /// Encode in the source format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_as(self.format)
    }

    pub fn to_bytes_as(&self, format: ImageFormat) -> Result<Vec<u8>> {
        Ok(self
            .backend
            .encode(&self.image, format, self.options.encode_options())?)
    }

    /// Emit a `Content-Type` header and the encoded image.
    ///
    /// Fails with [`ThumbError::State`] if the response already committed
    /// its headers.
    pub fn show<W: Write>(&self, response: &mut Response<W>) -> Result<&Self> {
        if response.headers_sent() {
            return Err(ThumbError::State(
                "cannot show image, headers have already been sent".into(),
            ));
        }
        let bytes = self.to_bytes()?;
        response.send_headers(&[("Content-Type", self.format.mime_type())])?;
        response.write_body(&bytes)?;
        Ok(self)
    }

    /// Write just the encoded bytes, no header.
    pub fn show_raw(&self, writer: &mut impl Write) -> Result<&Self> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(self)
    }
}
