//! Peripheral degradation filters.
//!
//! Each filter returns a new buffer; inputs are never modified in place.

pub mod clutter;
pub mod color;
pub mod gaussian;

pub use clutter::radial_pixel_distortion;
pub use color::grayscale_frame;
pub use gaussian::{gaussian_blur_frame, gaussian_blur_mask};
