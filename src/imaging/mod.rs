//! Image processing: geometry engine plus two interchangeable backends.
//!
//! | Concern | Where |
//! |---|---|
//! | **Target geometry** | [`calculations`]: pure integer math |
//! | **Geometry values** | [`Dimensions`], [`GeometryState`], [`CropRegion`] |
//! | **Chained transforms** | [`Thumbnail`] |
//! | **Pixel work** | [`ImageBackend`]: [`RustBackend`] or [`FastBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + the two implementations
//! - **Operations**: The [`Thumbnail`] handle combining calculations + backend

pub mod backend;
pub mod calculations;
mod fast_backend;
mod format;
mod geometry;
mod operations;
mod params;
pub(crate) mod raster;
mod response;
mod rust_backend;

pub use backend::{BackendError, Decoded, ImageBackend};
pub use fast_backend::FastBackend;
pub use format::ImageFormat;
pub use geometry::{CropRegion, Dimensions, GeometryState, ResizeConstraint};
pub use operations::{Result, ThumbError, Thumbnail};
pub use params::{Color, EncodeOptions, MergeRequest, Options, Quality, TextRequest};
pub use response::Response;
pub use rust_backend::RustBackend;
