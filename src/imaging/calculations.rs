//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Width-driven scaling truncates the derived height; height-driven scaling
//! rounds the derived width up. Callers depend on that asymmetry, so both
//! helpers keep it.

use super::geometry::{Dimensions, ResizeConstraint};

/// `a * b / c` rounded down, saturating at `u32::MAX`.
fn mul_div_floor(a: u32, b: u32, c: u32) -> u32 {
    let product = u64::from(a) * u64::from(b);
    product
        .checked_div(u64::from(c))
        .map_or(0, |q| u32::try_from(q).unwrap_or(u32::MAX))
}

/// `a * b / c` rounded up, saturating at `u32::MAX`.
fn mul_div_ceil(a: u32, b: u32, c: u32) -> u32 {
    if c == 0 {
        return 0;
    }
    let product = u64::from(a) * u64::from(b);
    u32::try_from(product.div_ceil(u64::from(c))).unwrap_or(u32::MAX)
}

/// Scale so the width becomes `max_width`; height follows, truncated.
///
/// `width` must be non-zero.
///
/// # Examples
/// ```
/// # use simple_thumb::imaging::calculations::scale_to_width;
/// # use simple_thumb::imaging::Dimensions;
/// // 333 * 100 / 200 = 166.5 → 166
/// assert_eq!(scale_to_width(200, 333, 100), Dimensions::new(100, 166));
/// ```
pub fn scale_to_width(width: u32, height: u32, max_width: u32) -> Dimensions {
    debug_assert!(width > 0, "scale_to_width needs a non-empty source");
    Dimensions {
        width: max_width,
        height: mul_div_floor(height, max_width, width),
    }
}

/// Scale so the height becomes `max_height`; width follows, rounded up.
///
/// `height` must be non-zero.
///
/// # Examples
/// ```
/// # use simple_thumb::imaging::calculations::scale_to_height;
/// # use simple_thumb::imaging::Dimensions;
/// // 333 * 100 / 200 = 166.5 → 167
/// assert_eq!(scale_to_height(333, 200, 100), Dimensions::new(167, 100));
/// ```
pub fn scale_to_height(width: u32, height: u32, max_height: u32) -> Dimensions {
    debug_assert!(height > 0, "scale_to_height needs a non-empty source");
    Dimensions {
        width: mul_div_ceil(width, max_height, height),
        height: max_height,
    }
}

/// Fit `width`×`height` inside a `max_width`×`max_height` box.
///
/// A zero bound leaves that axis unconstrained. The two passes run in a fixed
/// order and the height pass overwrites the width pass whenever
/// `max_height > 0`, so with both bounds set the result is always the
/// height-first one. When both bounds are zero the source size is returned.
///
/// # Examples
/// ```
/// # use simple_thumb::imaging::calculations::bounding_box_resize;
/// # use simple_thumb::imaging::Dimensions;
/// assert_eq!(bounding_box_resize(2000, 1000, 800, 0), Dimensions::new(800, 400));
/// assert_eq!(bounding_box_resize(1000, 500, 400, 100), Dimensions::new(200, 100));
/// ```
pub fn bounding_box_resize(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Dimensions {
    let mut size = Dimensions::new(width, height);

    if max_width > 0 {
        size = scale_to_width(width, height, max_width);

        if max_height > 0 && size.height > max_height {
            size = scale_to_height(size.width, size.height, max_height);
        }
    }

    if max_height > 0 {
        size = scale_to_height(width, height, max_height);

        if max_width > 0 && size.width > max_width {
            size = scale_to_width(size.width, size.height, max_width);
        }
    }

    size
}

/// Scale `width`×`height` so it covers a `max_width`×`max_height` box.
///
/// The first pass scales along one axis, picked by comparing the box's sides
/// and the source's sides. If the other axis then falls short of the box, a
/// corrective pass re-derives the size from the *source* along the other
/// axis. The result is never smaller than the box on either axis, so a
/// following crop can fill it exactly.
///
/// | box wider or square | source wider | first pass | corrective when |
/// |---|---|---|---|
/// | yes | yes | height | width < box |
/// | yes | no  | width  | height < box |
/// | no  | yes (or square) | width | height < box |
/// | no  | no  | height | width < box |
pub fn strict_fit_resize(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Dimensions {
    let height_first = if max_width >= max_height {
        width > height
    } else {
        height > width
    };

    if height_first {
        let size = scale_to_height(width, height, max_height);
        if size.width < max_width {
            return scale_to_width(width, height, max_width);
        }
        size
    } else {
        let size = scale_to_width(width, height, max_width);
        if size.height < max_height {
            return scale_to_height(width, height, max_height);
        }
        size
    }
}

/// Scale both axes by `percent`, rounding up. `None` when `percent` is zero.
///
/// # Examples
/// ```
/// # use simple_thumb::imaging::calculations::percent_resize;
/// # use simple_thumb::imaging::Dimensions;
/// assert_eq!(percent_resize(800, 400, 50), Some(Dimensions::new(400, 200)));
/// assert_eq!(percent_resize(800, 400, 0), None);
/// ```
pub fn percent_resize(width: u32, height: u32, percent: u32) -> Option<Dimensions> {
    if percent == 0 {
        return None;
    }
    Some(Dimensions {
        width: mul_div_ceil(width, percent, 100),
        height: mul_div_ceil(height, percent, 100),
    })
}

/// Target geometry for `current` under `constraint`.
///
/// `None` means the constraint asks for no change (a zero percent).
pub fn target_geometry(current: Dimensions, constraint: ResizeConstraint) -> Option<Dimensions> {
    let Dimensions { width, height } = current;
    match constraint {
        ResizeConstraint::MaxBox {
            max_width,
            max_height,
        } => Some(bounding_box_resize(width, height, max_width, max_height)),
        ResizeConstraint::StrictBox {
            width: box_w,
            height: box_h,
        } => Some(strict_fit_resize(width, height, box_w, box_h)),
        ResizeConstraint::Percent(percent) => percent_resize(width, height, percent),
    }
}

/// Resolve a text origin on a canvas.
///
/// Non-negative coordinates are used as given. A negative coordinate anchors
/// the text block to the opposite edge: `x = -10` puts the right edge of the
/// text 10px from the right edge of the canvas.
pub fn text_origin(canvas: Dimensions, text: Dimensions, x: i32, y: i32) -> (i32, i32) {
    let anchor = |pos: i32, canvas_len: u32, text_len: u32| -> i32 {
        if pos >= 0 {
            pos
        } else {
            let far = i64::from(canvas_len) - i64::from(text_len) + i64::from(pos);
            far.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        }
    };
    (
        anchor(x, canvas.width, text.width),
        anchor(y, canvas.height, text.height),
    )
}
