//! Shared test utilities for the simple-thumb test suite.
//!
//! Synthetic images only: no fixture files are checked in. Everything is
//! generated with the `image` crate at the size a test needs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = write_test_image(tmp.path(), "wide.png", 800, 400);
//! let thumb = Thumbnail::open(&path, Options::default(), RustBackend::new()).unwrap();
//! ```

use crate::imaging::{EncodeOptions, ImageFormat};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// In-memory images
// =========================================================================

/// An RGB gradient, so resampling and cropping produce non-uniform output.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Encode `image` as `format` with default options. Panics on failure.
pub fn encode_test_image(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    crate::imaging::raster::encode(image, format, EncodeOptions::default()).unwrap()
}

// =========================================================================
// On-disk images
// =========================================================================

/// Write a gradient image to `dir/name`, format taken from the extension.
pub fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let format = ImageFormat::from_path(&path)
        .unwrap_or_else(|| panic!("test image '{name}' needs a supported extension"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, encode_test_image(&gradient(width, height), format)).unwrap();
    path
}

/// One image per supported format, some nested in subdirectories.
pub fn write_test_tree(dir: &Path) -> Vec<PathBuf> {
    vec![
        write_test_image(dir, "wide.png", 320, 160),
        write_test_image(dir, "tall.jpg", 120, 240),
        write_test_image(dir, "nested/square.gif", 100, 100),
        write_test_image(dir, "nested/deeper/photo.webp", 200, 150),
    ]
}

// =========================================================================
// Fonts
// =========================================================================

/// The first parseable TrueType font installed on the machine, if any.
///
/// No font is checked in, so rendering tests return early without one.
pub fn system_font() -> Option<PathBuf> {
    ["/usr/share/fonts", "/usr/local/share/fonts", "/Library/Fonts"]
        .iter()
        .flat_map(|dir| walkdir::WalkDir::new(dir).sort_by_file_name())
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
        })
        .find(|path| {
            std::fs::read(path)
                .ok()
                .is_some_and(|bytes| ab_glyph::FontVec::try_from_vec(bytes).is_ok())
        })
}
