//! Coarse-to-fine Horn-Schunck flow.
//!
//! At each level the next frame is warped toward the previous one by the
//! current estimate, and an increment is solved with Jacobi iterations of
//!
//! `du = u_avg - Ix (Ix u_avg + Iy v_avg + It) / (alpha^2 + Ix^2 + Iy^2)`
//!
//! Borders replicate edge samples.

use crate::flow::{FlowField, FlowParams};
use crate::image::{GrayImage, ImagePyramid, ImageView};
use crate::pipeline::Deadline;
use crate::trace::trace_span;
use crate::util::{RetinaError, RetinaResult};

struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Plane {
    fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    fn from_gray(img: &GrayImage) -> Self {
        Self {
            data: img.data().iter().map(|&v| v as f32).collect(),
            width: img.width(),
            height: img.height(),
        }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Clamped-border sample at integer offsets from `(x, y)`.
    #[inline]
    fn at_clamped(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.at(x, y)
    }

    /// Bilinear sample with edge replication.
    fn sample(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;
        (1.0 - fx) * (1.0 - fy) * self.at(x0, y0)
            + fx * (1.0 - fy) * self.at(x1, y0)
            + (1.0 - fx) * fy * self.at(x0, y1)
            + fx * fy * self.at(x1, y1)
    }

    /// Resamples to `(width, height)` and multiplies every value by `scale`.
    fn upsample(&self, width: usize, height: usize, scale: f32) -> Self {
        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let src_y = (y as f32 + 0.5) * sy - 0.5;
            for x in 0..width {
                let src_x = (x as f32 + 0.5) * sx - 0.5;
                data.push(self.sample(src_x, src_y) * scale);
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Mean of the four direct neighbours.
    #[inline]
    fn neighbour_mean(&self, x: usize, y: usize) -> f32 {
        let (x, y) = (x as isize, y as isize);
        0.25 * (self.at_clamped(x - 1, y)
            + self.at_clamped(x + 1, y)
            + self.at_clamped(x, y - 1)
            + self.at_clamped(x, y + 1))
    }
}

/// Estimates dense flow from `prev` to `next`.
///
/// Both views must have the same dimensions. Identical inputs produce an
/// all-zero field.
pub fn dense_flow(
    prev: ImageView<'_, u8>,
    next: ImageView<'_, u8>,
    params: &FlowParams,
) -> RetinaResult<FlowField> {
    dense_flow_within(prev, next, params, None)
}

/// `dense_flow` that gives up with `Timeout` once `deadline` passes.
///
/// The budget is checked before every Jacobi sweep.
pub(crate) fn dense_flow_within(
    prev: ImageView<'_, u8>,
    next: ImageView<'_, u8>,
    params: &FlowParams,
    deadline: Option<&Deadline>,
) -> RetinaResult<FlowField> {
    if prev.width() != next.width() || prev.height() != next.height() {
        return Err(RetinaError::InvalidDimensions {
            width: next.width(),
            height: next.height(),
        });
    }
    params.validate()?;
    let _span = trace_span!("dense_flow", width = prev.width(), height = prev.height()).entered();

    let pyr_prev = ImagePyramid::build_u8(prev, params.levels)?;
    let pyr_next = ImagePyramid::build_u8(next, params.levels)?;
    let num_levels = pyr_prev.levels().len().min(pyr_next.levels().len());
    let alpha2 = params.alpha * params.alpha;

    let mut flow: Option<(Plane, Plane)> = None;
    for level in (0..num_levels).rev() {
        let a = Plane::from_gray(&pyr_prev.levels()[level]);
        let b = Plane::from_gray(&pyr_next.levels()[level]);
        let (width, height) = (a.width, a.height);

        let (mut u, mut v) = match flow.take() {
            None => (Plane::zeros(width, height), Plane::zeros(width, height)),
            Some((u, v)) => {
                let scale_x = width as f32 / u.width as f32;
                let scale_y = height as f32 / u.height as f32;
                (
                    u.upsample(width, height, scale_x),
                    v.upsample(width, height, scale_y),
                )
            }
        };

        let mut warped = Plane::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                warped.data[idx] = b.sample(x as f32 + u.data[idx], y as f32 + v.data[idx]);
            }
        }

        let n = width * height;
        let mut ix = vec![0.0f32; n];
        let mut iy = vec![0.0f32; n];
        let mut it = vec![0.0f32; n];
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let (xi, yi) = (x as isize, y as isize);
                let gx = |p: &Plane| 0.5 * (p.at_clamped(xi + 1, yi) - p.at_clamped(xi - 1, yi));
                let gy = |p: &Plane| 0.5 * (p.at_clamped(xi, yi + 1) - p.at_clamped(xi, yi - 1));
                ix[idx] = 0.5 * (gx(&a) + gx(&warped));
                iy[idx] = 0.5 * (gy(&a) + gy(&warped));
                it[idx] = warped.data[idx] - a.data[idx];
            }
        }

        let mut du = Plane::zeros(width, height);
        let mut dv = Plane::zeros(width, height);
        let mut next_du = Plane::zeros(width, height);
        let mut next_dv = Plane::zeros(width, height);
        for _ in 0..params.iterations {
            Deadline::check(deadline, "dense_flow")?;
            for y in 0..height {
                for x in 0..width {
                    let idx = y * width + x;
                    let u_avg = du.neighbour_mean(x, y);
                    let v_avg = dv.neighbour_mean(x, y);
                    let (gx, gy, gt) = (ix[idx], iy[idx], it[idx]);
                    let t = (gx * u_avg + gy * v_avg + gt) / (alpha2 + gx * gx + gy * gy);
                    next_du.data[idx] = u_avg - gx * t;
                    next_dv.data[idx] = v_avg - gy * t;
                }
            }
            std::mem::swap(&mut du, &mut next_du);
            std::mem::swap(&mut dv, &mut next_dv);
        }

        for idx in 0..n {
            u.data[idx] += du.data[idx];
            v.data[idx] += dv.data[idx];
        }
        flow = Some((u, v));
    }

    let (u, v) = flow.ok_or(RetinaError::Computation {
        stage: "dense_flow",
        reason: "pyramid produced no levels".to_string(),
    })?;
    if u.data.iter().chain(&v.data).any(|value| !value.is_finite()) {
        return Err(RetinaError::Computation {
            stage: "dense_flow",
            reason: "non-finite flow vector".to_string(),
        });
    }
    Ok(FlowField::new(u.width, u.height, u.data, v.data))
}
