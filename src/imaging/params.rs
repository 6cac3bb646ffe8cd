//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`operations`](super::operations) orchestrator and the
//! [`backend`](super::backend), which does the actual pixel work.
//!
//! ## Types
//!
//! - [`Options`]: Per-handle behaviour: upscaling, encode quality, alpha policy.
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`EncodeOptions`]: What an encoder needs from [`Options`].
//! - [`Color`]: RGBA color, parsed from `#rgb` / `#rrggbb` hex.
//! - [`TextRequest`]: Everything needed to render one line of text.
//! - [`MergeRequest`]: Source region, destination and strength of a copy-merge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Behaviour switches carried by every image handle.
///
/// Mirrors the `[options]` section of `simple-thumb.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Allow resizes to grow the image past its current size.
    pub resize_up: bool,
    /// Encode quality, 0-100. Only lossy formats use it.
    pub quality: u32,
    /// Keep the alpha channel when writing PNG.
    pub preserve_alpha: bool,
    /// Keep transparency when writing GIF.
    pub preserve_transparency: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resize_up: false,
            quality: 100,
            preserve_alpha: true,
            preserve_transparency: true,
        }
    }
}

impl Options {
    /// Check value ranges. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.quality > 100 {
            return Err(format!("quality must be 0-100, got {}", self.quality));
        }
        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            quality: Quality::new(self.quality),
            preserve_alpha: self.preserve_alpha,
            preserve_transparency: self.preserve_transparency,
        }
    }
}

/// Encoder settings derived from [`Options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub quality: Quality,
    pub preserve_alpha: bool,
    pub preserve_transparency: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Options::default().encode_options()
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha set from an opacity percentage (0-100).
    pub fn with_opacity(self, percent: u8) -> Self {
        let percent = u32::from(percent.min(100));
        Self {
            a: ((255 * percent + 50) / 100) as u8,
            ..self
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`. The result is opaque.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid color '{s}': expected #rgb or #rrggbb")),
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{s}': not a hex value"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|e| format!("invalid color '{s}': {e}"))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// One line of text to draw onto an image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    /// Font size in points.
    pub size: f32,
    /// Counter-clockwise rotation in degrees.
    pub angle: f32,
    /// Negative values anchor from the right edge.
    pub x: i32,
    /// Negative values anchor from the bottom edge.
    pub y: i32,
    pub color: Color,
    pub font: PathBuf,
    pub text: String,
}

/// Where and how strongly to blend a region of another image.
///
/// The source rectangle is clamped to the other image the same way a crop
/// is. Destination pixels that fall outside this image are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRequest {
    pub dst_x: i64,
    pub dst_y: i64,
    pub src_x: i64,
    pub src_y: i64,
    pub src_width: u32,
    pub src_height: u32,
    /// Blend strength, 0-100.
    pub percent: u32,
}
