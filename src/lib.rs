//! # Simple Thumb
//!
//! Chainable thumbnailing: open an image, chain resize, crop and rotate calls,
//! then save or stream the result. The geometry is pure integer math and the
//! pixel work sits behind a backend trait with two interchangeable
//! implementations.
//!
//! # Architecture: Calculate, Then Transform
//!
//! Every transform on a [`imaging::Thumbnail`] runs in the same order:
//!
//! ```text
//! 1. Validate   arguments       →  ThumbError::Argument on bad input
//! 2. Calculate  current size    →  target size     (imaging::calculations)
//! 3. Transform  current buffer  →  new buffer      (ImageBackend)
//! 4. Commit     buffer + geometry replaced together
//! ```
//!
//! Geometry is decided before any pixels move, so all of it is unit tested
//! against a recording mock backend without decoding a single image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry, the `Thumbnail` handle, and the `rust` / `fast` backends |
//! | [`recipe`] | Textual operation chains (`resize=800x0`, `adaptive=300x300`) |
//! | [`batch`] | Parallel processing of a whole directory tree |
//! | [`config`] | `simple-thumb.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Height-First Bounding Box
//!
//! A resize constrained on both axes runs the width-driven pass and then the
//! height-driven pass, and the second one always overwrites the first. With
//! both bounds set, the result is the height-first fit.
//!
//! ## Exact Adaptive Resize
//!
//! `adaptive_resize` scales straight to the smallest size that covers the
//! target on both axes, then center-crops the overflow. The result is always
//! exactly the requested size. Rounding never leaves it a pixel short.
//!
//! ## Rotation Swaps the Canvas
//!
//! Rotation always exchanges width and height, whatever the angle, and the
//! backend renders onto that swapped canvas. Buffer and recorded geometry
//! cannot disagree. Half turns on non-square images are clipped to the
//! swapped box.
//!
//! ## Two Backends, One Trait
//!
//! [`imaging::RustBackend`] uses the `image` crate's Lanczos3 resampler and
//! rotates by right angles only. [`imaging::FastBackend`] uses
//! `fast_image_resize` for scaling and `imageproc` warping for any angle.
//! Callers pick one explicitly; there is no detection or fallback.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod recipe;

#[cfg(test)]
pub(crate) mod test_helpers;
