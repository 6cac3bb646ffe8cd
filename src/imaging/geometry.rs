//! Geometry value types shared by the calculator and the orchestrator.
//!
//! - [`Dimensions`]: a width/height pair. Used both for the calculator's
//!   output (target geometry) and as the payload of [`GeometryState`].
//! - [`GeometryState`]: the current extent of an image handle. Never zero on
//!   either axis.
//! - [`ResizeConstraint`]: what a resize is constrained by.
//! - [`CropRegion`]: a rectangle guaranteed to lie inside the image it was
//!   derived for.
//!
//! Out-of-bounds crop input is never an error: [`CropRegion::clamped`] shrinks
//! and shifts the rectangle until it fits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same extent with the axes exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Current pixel extent of an image handle.
///
/// Both axes are always at least one pixel. Updates replace the whole value,
/// so width and height always change together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryState(Dimensions);

impl GeometryState {
    /// Returns `None` for an image with zero extent on either axis.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self(Dimensions { width, height }))
        }
    }

    /// Build a state from calculated geometry, raising a collapsed axis to 1px.
    ///
    /// Truncating arithmetic can floor a very thin image to zero rows; the
    /// backend is never asked for an empty buffer.
    pub fn from_target(target: Dimensions) -> Self {
        Self(Dimensions {
            width: target.width.max(1),
            height: target.height.max(1),
        })
    }

    pub fn width(self) -> u32 {
        self.0.width
    }

    pub fn height(self) -> u32 {
        self.0.height
    }

    pub fn dimensions(self) -> Dimensions {
        self.0
    }

    pub fn swapped(self) -> Self {
        Self(self.0.swapped())
    }
}

/// The constraint a resize derives its target geometry from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeConstraint {
    /// Fit inside a box. Zero on an axis means "unconstrained on that axis".
    MaxBox { max_width: u32, max_height: u32 },
    /// Cover a box completely (crop-to-fill). Both axes > 0.
    StrictBox { width: u32, height: u32 },
    /// Uniform scale in whole percent.
    Percent(u32),
}

/// A rectangle inside an image: `x + width <= image width`, same for `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Derive a valid region from arbitrary caller input.
    ///
    /// The size is clamped to the image first. An origin that would push the
    /// rectangle past the right/bottom edge is shifted back so the rectangle
    /// ends exactly on that edge, and a negative origin becomes zero.
    pub fn clamped(image: Dimensions, x: i64, y: i64, width: u32, height: u32) -> Self {
        let width = width.min(image.width);
        let height = height.min(image.height);

        let mut x = x;
        let mut y = y;
        if x.saturating_add(i64::from(width)) > i64::from(image.width) {
            x = i64::from(image.width - width);
        }
        if y.saturating_add(i64::from(height)) > i64::from(image.height) {
            y = i64::from(image.height - height);
        }

        Self {
            // both are now within 0..=image extent
            x: x.max(0) as u32,
            y: y.max(0) as u32,
            width,
            height,
        }
    }

    /// A `width`×`height` region centered in the image (size clamped first).
    pub fn centered(image: Dimensions, width: u32, height: u32) -> Self {
        let width = width.min(image.width);
        let height = height.min(image.height);
        Self {
            x: (image.width - width) / 2,
            y: (image.height - height) / 2,
            width,
            height,
        }
    }

    /// The region that trims an over-filled image down to `target`.
    ///
    /// After a crop-to-fill resize only one axis overflows the target, so at
    /// most one of the offsets is non-zero; width overflow is checked first.
    pub fn adaptive(image: Dimensions, target: Dimensions) -> Self {
        let mut x = 0;
        let mut y = 0;
        if image.width > target.width {
            x = (image.width - target.width) / 2;
        } else if image.height > target.height {
            y = (image.height - target.height) / 2;
        }
        Self {
            x,
            y,
            width: target.width,
            height: target.height,
        }
    }

    pub fn size(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Whether this region covers the whole of `image`.
    pub fn is_full(self, image: Dimensions) -> bool {
        self.x == 0 && self.y == 0 && self.size() == image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: Dimensions = Dimensions::new(800, 400);

    // =========================================================================
    // GeometryState
    // =========================================================================

    #[test]
    fn state_rejects_zero_extent() {
        assert!(GeometryState::new(0, 10).is_none());
        assert!(GeometryState::new(10, 0).is_none());
        assert!(GeometryState::new(1, 1).is_some());
    }

    #[test]
    fn state_from_target_never_collapses() {
        let state = GeometryState::from_target(Dimensions::new(10, 0));
        assert_eq!(state.dimensions(), Dimensions::new(10, 1));
    }

    #[test]
    fn state_swapped_exchanges_axes() {
        let state = GeometryState::new(800, 400).unwrap().swapped();
        assert_eq!((state.width(), state.height()), (400, 800));
    }

    // =========================================================================
    // CropRegion::clamped
    // =========================================================================

    #[test]
    fn clamped_in_bounds_is_untouched() {
        let region = CropRegion::clamped(IMAGE, 10, 20, 100, 50);
        assert_eq!(
            region,
            CropRegion {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn clamped_shifts_origin_to_fit_right_edge() {
        let region = CropRegion::clamped(IMAGE, 750, 0, 100, 100);
        assert_eq!(region.x, 700);
        assert_eq!(region.x + region.width, IMAGE.width);
    }

    #[test]
    fn clamped_shifts_origin_to_fit_bottom_edge() {
        let region = CropRegion::clamped(IMAGE, 0, 390, 100, 100);
        assert_eq!(region.y, 300);
        assert_eq!(region.y + region.height, IMAGE.height);
    }

    #[test]
    fn clamped_shrinks_oversized_region() {
        let region = CropRegion::clamped(IMAGE, 5, 5, 2000, 2000);
        assert_eq!(region, CropRegion { x: 0, y: 0, width: 800, height: 400 });
    }

    #[test]
    fn clamped_negative_origin_becomes_zero() {
        let region = CropRegion::clamped(IMAGE, -30, -1, 100, 100);
        assert_eq!((region.x, region.y), (0, 0));
    }

    #[test]
    fn clamped_full_image_is_full() {
        let region = CropRegion::clamped(IMAGE, 0, 0, 800, 400);
        assert!(region.is_full(IMAGE));
    }

    // =========================================================================
    // centered / adaptive offsets
    // =========================================================================

    #[test]
    fn centered_offsets_are_halved_overflow() {
        let region = CropRegion::centered(IMAGE, 200, 100);
        assert_eq!((region.x, region.y), (300, 150));
    }

    #[test]
    fn centered_truncates_odd_overflow() {
        let region = CropRegion::centered(Dimensions::new(101, 101), 100, 100);
        assert_eq!((region.x, region.y), (0, 0));
    }

    #[test]
    fn centered_clamps_size_first() {
        let region = CropRegion::centered(IMAGE, 1000, 100);
        assert_eq!(region.width, 800);
        assert_eq!(region.x, 0);
    }

    #[test]
    fn adaptive_prefers_horizontal_overflow() {
        let region = CropRegion::adaptive(Dimensions::new(600, 300), Dimensions::new(300, 300));
        assert_eq!((region.x, region.y), (150, 0));
    }

    #[test]
    fn adaptive_vertical_overflow() {
        let region = CropRegion::adaptive(Dimensions::new(300, 500), Dimensions::new(300, 300));
        assert_eq!((region.x, region.y), (0, 100));
    }

    #[test]
    fn adaptive_exact_fit_has_no_offset() {
        let region = CropRegion::adaptive(Dimensions::new(300, 300), Dimensions::new(300, 300));
        assert_eq!((region.x, region.y), (0, 0));
    }
}
