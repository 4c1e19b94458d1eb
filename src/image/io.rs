//! Loading and saving frames via the `image` crate.

use crate::image::{Frame, ProcessedImage};
use crate::util::{RetinaError, RetinaResult};
use ::image::imageops::FilterType;
use std::path::Path;

/// Creates a frame from a decoded `image` RGB buffer.
pub fn frame_from_rgb_image(img: &::image::RgbImage) -> RetinaResult<Frame> {
    Frame::new(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Loads an image from disk, converts it to RGB and resizes it to
/// `resolution x resolution` with a triangle (bilinear) filter.
///
/// Images that already have the target size are not resampled.
pub fn load_frame<P: AsRef<Path>>(path: P, resolution: usize) -> RetinaResult<Frame> {
    let path = path.as_ref();
    let img = ::image::open(path).map_err(|err| RetinaError::ImageIo {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let side = u32::try_from(resolution).map_err(|_| RetinaError::InvalidDimensions {
        width: resolution,
        height: resolution,
    })?;
    if rgb.width() == side && rgb.height() == side {
        return frame_from_rgb_image(&rgb);
    }
    let resized = ::image::imageops::resize(&rgb, side, side, FilterType::Triangle);
    frame_from_rgb_image(&resized)
}

/// Writes a processed image as 8-bit RGB, clamping samples to `[0, 255]`.
pub fn save_processed<P: AsRef<Path>>(path: P, img: &ProcessedImage) -> RetinaResult<()> {
    let path = path.as_ref();
    let rgb8 = img.to_rgb8();
    let buffer = ::image::RgbImage::from_raw(
        rgb8.width() as u32,
        rgb8.height() as u32,
        rgb8.into_raw(),
    )
    .ok_or(RetinaError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    buffer.save(path).map_err(|err| RetinaError::ImageIo {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
