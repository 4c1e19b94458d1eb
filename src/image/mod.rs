//! Pixel containers.
//!
//! Frames travel through the pipeline as owned interleaved RGB buffers:
//! `Frame` (8-bit) on the way in and `ProcessedImage` (16-bit) on the way
//! out. Every stage allocates its result instead of writing in place.
//! Grayscale work (optical flow) uses `GrayImage` planes, borrowed as
//! packed `ImageView`s.

use crate::util::math::{luma, round_u8};
use crate::util::{RetinaError, RetinaResult};

pub mod io;
pub mod pyramid;

pub use pyramid::{GrayImage, ImagePyramid};

/// Borrowed packed single-channel plane, handed out by `GrayImage::view`.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
}

impl<'a, T> ImageView<'a, T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples, exactly `width * height` of them.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

/// Checks that a packed buffer holds exactly `width * height * channels` samples.
pub(crate) fn exact_len(
    len: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> RetinaResult<()> {
    let needed = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .filter(|&n| n > 0)
        .ok_or(RetinaError::InvalidDimensions { width, height })?;
    match len.cmp(&needed) {
        std::cmp::Ordering::Less => Err(RetinaError::BufferTooSmall { needed, got: len }),
        std::cmp::Ordering::Greater => Err(RetinaError::InvalidDimensions { width, height }),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

/// Owned interleaved RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbBuffer<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

/// A preprocessed 8-bit RGB input frame.
pub type Frame = RgbBuffer<u8>;

/// Composited output; values stay in the 16-bit range.
pub type ProcessedImage = RgbBuffer<u16>;

impl<T: Copy + Default> RgbBuffer<T> {
    /// Wraps an interleaved RGB buffer of exactly `width * height * 3` samples.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> RetinaResult<Self> {
        exact_len(data.len(), width, height, 3)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn from_parts(data: Vec<T>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height * 3);
        Self {
            data,
            width,
            height,
        }
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [T; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the interleaved samples.
    pub fn as_raw(&self) -> &[T] {
        &self.data
    }

    /// Consumes the image and returns the interleaved samples.
    pub fn into_raw(self) -> Vec<T> {
        self.data
    }

    /// Returns the RGB triple at `(x, y)`.
    ///
    /// Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: usize, y: usize) -> [T; 3] {
        let idx = (y * self.width + x) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Overwrites the RGB triple at `(x, y)`.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: [T; 3]) {
        let idx = (y * self.width + x) * 3;
        self.data[idx..idx + 3].copy_from_slice(&value);
    }

    pub(crate) fn same_size<U>(&self, other: &RgbBuffer<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Frame {
    /// Converts to a single-channel luma image.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| round_u8(luma(px[0] as f32, px[1] as f32, px[2] as f32)))
            .collect();
        GrayImage::from_parts(data, self.width, self.height)
    }

    /// Widens samples into a processed image without changing values.
    pub fn to_processed(&self) -> ProcessedImage {
        ProcessedImage {
            data: self.data.iter().map(|&v| u16::from(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl ProcessedImage {
    /// Clamps every sample to `[0, 255]` for display or 8-bit export.
    pub fn to_rgb8(&self) -> Frame {
        Frame {
            data: self.data.iter().map(|&v| v.min(255) as u8).collect(),
            width: self.width,
            height: self.height,
        }
    }
}
