//! Fovea and periphery masks.
//!
//! The fovea mask is a filled disk rasterized on a `P x P` canvas with value
//! `1.0` inside or on the boundary and `0.0` elsewhere. The periphery mask is
//! its complement. Masks are rebuilt for every frame because the center may
//! move under dynamic foveation.

use crate::util::{RetinaError, RetinaResult};

/// Single-channel `f32` mask with values in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Creates an all-zero mask.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub(crate) fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the mask width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the mask height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the value at `(x, y)`, or `None` out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Counts samples that are not exactly zero.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }

    /// Returns `(x, y)` of every nonzero sample in row-major order.
    pub fn nonzero_coords(&self) -> Vec<(usize, usize)> {
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }

    /// Returns `1 - m` for every sample.
    pub fn complement(&self) -> Self {
        Self {
            data: self.data.iter().map(|&v| 1.0 - v).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Hard fovea mask and its complementary periphery mask.
#[derive(Clone, Debug, PartialEq)]
pub struct RetinaMasks {
    pub fovea: Mask,
    pub periphery: Mask,
}

/// Builds the fovea disk and periphery masks on a `size x size` canvas.
///
/// Centers outside the canvas and radii larger than the canvas are clipped to
/// the canvas bounds. A zero radius is rejected.
pub fn build_retina_masks(size: usize, center: (i32, i32), radius: u32) -> RetinaResult<RetinaMasks> {
    if radius == 0 {
        return Err(RetinaError::config("fovea_radius", "must be > 0"));
    }
    if size == 0 {
        return Err(RetinaError::InvalidDimensions {
            width: size,
            height: size,
        });
    }

    let mut fovea = Mask::zeros(size, size);
    fill_disk(&mut fovea, center, radius);
    let periphery = fovea.complement();
    Ok(RetinaMasks { fovea, periphery })
}

fn fill_disk(mask: &mut Mask, center: (i32, i32), radius: u32) {
    let (cx, cy) = (i64::from(center.0), i64::from(center.1));
    let r = i64::from(radius);
    let r2 = r * r;
    let width = mask.width as i64;
    let height = mask.height as i64;

    let y0 = (cy - r).max(0);
    let y1 = (cy + r).min(height - 1);
    let x0 = (cx - r).max(0);
    let x1 = (cx + r).min(width - 1);
    if y0 > y1 || x0 > x1 {
        return;
    }

    for y in y0..=y1 {
        let dy = y - cy;
        let row = y as usize * mask.width;
        for x in x0..=x1 {
            let dx = x - cx;
            if dx * dx + dy * dy <= r2 {
                mask.data[row + x as usize] = 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::build_retina_masks;

    #[test]
    fn disk_boundary_is_inclusive() {
        let masks = build_retina_masks(11, (5, 5), 3).unwrap();
        assert_eq!(masks.fovea.get(8, 5), Some(1.0));
        assert_eq!(masks.fovea.get(5, 2), Some(1.0));
        assert_eq!(masks.fovea.get(8, 8), Some(0.0));
        assert_eq!(masks.periphery.get(8, 8), Some(1.0));
    }

    #[test]
    fn far_center_yields_empty_fovea() {
        let masks = build_retina_masks(16, (-100, 300), 5).unwrap();
        assert_eq!(masks.fovea.count_nonzero(), 0);
        assert_eq!(masks.periphery.count_nonzero(), 16 * 16);
    }
}
