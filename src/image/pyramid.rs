//! Grayscale planes and the 2x2 box pyramid used by the flow estimator.
//!
//! Each level halves the previous one (odd trailing rows and columns are
//! dropped) with `dst = (a + b + c + d + 2) / 4`.

use crate::image::{exact_len, ImageView};
use crate::util::{RetinaError, RetinaResult};

/// Owned single-channel 8-bit image, row-major without padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl GrayImage {
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize) -> RetinaResult<Self> {
        exact_len(data.len(), width, height, 1)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn from_parts(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    fn from_view(view: ImageView<'_, u8>) -> Self {
        Self::from_parts(view.as_slice().to_vec(), view.width(), view.height())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }

    fn half(&self) -> Self {
        let (w, h) = (self.width / 2, self.height / 2);
        let src = &self.data;
        let stride = self.width;
        let data: Vec<u8> = (0..h)
            .flat_map(|y| {
                let top = 2 * y * stride;
                let bottom = top + stride;
                (0..w).map(move |x| {
                    let sum = u16::from(src[top + 2 * x])
                        + u16::from(src[top + 2 * x + 1])
                        + u16::from(src[bottom + 2 * x])
                        + u16::from(src[bottom + 2 * x + 1]);
                    ((sum + 2) / 4) as u8
                })
            })
            .collect();
        Self::from_parts(data, w, h)
    }
}

/// Levels from full resolution (index 0) down to the coarsest.
pub struct ImagePyramid {
    levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Builds at most `max_levels` levels (at least the base). An empty base
    /// is rejected.
    ///
    /// Halving stops once a level is narrower or shorter than 4 pixels.
    pub fn build_u8(base: ImageView<'_, u8>, max_levels: usize) -> RetinaResult<Self> {
        if base.width() == 0 || base.height() == 0 {
            return Err(RetinaError::InvalidDimensions {
                width: base.width(),
                height: base.height(),
            });
        }
        let mut levels = vec![GrayImage::from_view(base)];
        while levels.len() < max_levels.max(1) {
            let Some(last) = levels.last() else { break };
            if last.width < 4 || last.height < 4 {
                break;
            }
            let next = last.half();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::{GrayImage, ImagePyramid};

    #[test]
    fn half_rounds_box_average() {
        let img = GrayImage::from_vec(vec![0, 1, 2, 255, 3, 4, 5, 255], 4, 2).unwrap();
        let half = img.half();
        assert_eq!((half.width(), half.height()), (2, 1));
        assert_eq!(half.data(), &[2, 129]);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(GrayImage::from_vec(vec![0; 5], 2, 2).is_err());
        assert!(GrayImage::from_vec(vec![0; 3], 2, 2).is_err());
    }

    #[test]
    fn pyramid_stops_below_four_pixels() {
        let img = GrayImage::from_vec((0u8..16).collect(), 4, 4).unwrap();
        let pyramid = ImagePyramid::build_u8(img.view(), 10).unwrap();
        assert_eq!(pyramid.levels().len(), 2);
        assert_eq!(pyramid.levels()[1].data(), &[3, 5, 11, 13]);

        let single = ImagePyramid::build_u8(img.view(), 1).unwrap();
        assert_eq!(single.levels().len(), 1);
        assert_eq!(single.levels()[0], img);
    }
}
