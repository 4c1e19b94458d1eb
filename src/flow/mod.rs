//! Dense optical flow and motion-driven fixation.
//!
//! Flow is estimated coarse-to-fine with Horn-Schunck iterations over the
//! 2x2 box pyramid from `image::pyramid`. The fixation locator reduces the
//! flow magnitude to a grid of cell means and fixates the strongest cell.

mod fixation;
mod horn_schunck;

pub(crate) use fixation::locate_fixation_within;
pub use fixation::{
    argmax_cell, fixation_from_flow, grid_mean_magnitude, locate_fixation, Fixation,
};
pub use horn_schunck::dense_flow;

use crate::util::math::wrap_tau;
use crate::util::{RetinaError, RetinaResult};

/// Parameters for the dense flow estimator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowParams {
    /// Pyramid levels including the base level.
    pub levels: usize,
    /// Smoothness weight; larger values give smoother fields.
    pub alpha: f32,
    /// Jacobi iterations per pyramid level.
    pub iterations: usize,
    /// Mean cell magnitude (pixels) below which the scene counts as static.
    pub min_motion: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            levels: 3,
            alpha: 10.0,
            iterations: 40,
            min_motion: 1e-3,
        }
    }
}

impl FlowParams {
    pub(crate) fn validate(&self) -> RetinaResult<()> {
        if self.levels == 0 {
            return Err(RetinaError::config("flow.levels", "must be >= 1"));
        }
        if self.iterations == 0 {
            return Err(RetinaError::config("flow.iterations", "must be >= 1"));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(RetinaError::config("flow.alpha", "must be finite and > 0"));
        }
        if !self.min_motion.is_finite() || self.min_motion < 0.0 {
            return Err(RetinaError::config(
                "flow.min_motion",
                "must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Dense per-pixel motion field `(u, v)` in pixels, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    width: usize,
    height: usize,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl FlowField {
    pub(crate) fn new(width: usize, height: usize, u: Vec<f32>, v: Vec<f32>) -> Self {
        Self {
            width,
            height,
            u,
            v,
        }
    }

    /// Returns the field width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the field height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the `(u, v)` vector at `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        Some((self.u[idx], self.v[idx]))
    }

    /// Per-pixel flow magnitude.
    pub fn magnitude(&self) -> Vec<f32> {
        self.u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| u.hypot(*v))
            .collect()
    }

    /// Per-pixel `(magnitude, angle)` with angles in radians in `[0, 2π)`.
    pub fn to_polar(&self) -> (Vec<f32>, Vec<f32>) {
        let angle = self
            .u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| wrap_tau(v.atan2(*u)))
            .collect();
        (self.magnitude(), angle)
    }
}
