//! Cortical magnification warp.
//!
//! Pixel coordinates are normalized to `[-1, 1]` along each axis with
//! `n = 2 * x / (w - 1) - 1`. For a destination pixel at offset `(dx, dy)`
//! from the normalized center `c`, with `d = clamp(|(dx, dy)|, 1e-6, 1)`:
//!
//! `m(d) = 1 + strength * exp(-(d / radius)^2)`
//!
//! and the source is sampled at `(dx, dy) / m(d) + c` with bilinear
//! interpolation. Magnification is largest at the fixation point and fades
//! toward the edges. Samples outside the source are filled with 0.

use crate::image::ProcessedImage;
use crate::util::math::round_u16;
use crate::util::{RetinaError, RetinaResult};

fn normalize(p: f32, extent: usize) -> f32 {
    if extent <= 1 {
        0.0
    } else {
        2.0 * p / (extent as f32 - 1.0) - 1.0
    }
}

fn denormalize(n: f32, extent: usize) -> f32 {
    (n + 1.0) * 0.5 * (extent as f32 - 1.0).max(0.0)
}

/// Magnification factor at normalized distance `d`.
pub fn magnification_factor(d: f32, strength: f32, radius: f32) -> f32 {
    let d = d.clamp(1e-6, 1.0);
    1.0 + strength * (-(d / radius).powi(2)).exp()
}

/// Remaps `image` so the region around `center` is magnified.
///
/// A zero strength is an exact identity for any center.
pub fn cortical_magnification(
    image: &ProcessedImage,
    center: (i32, i32),
    strength: f32,
    radius: f32,
) -> RetinaResult<ProcessedImage> {
    if !strength.is_finite() || strength < 0.0 {
        return Err(RetinaError::config(
            "magnification.strength",
            "must be finite and >= 0",
        ));
    }
    if !radius.is_finite() || radius <= 0.0 || radius > 1.0 {
        return Err(RetinaError::config("magnification.radius", "must lie in (0, 1]"));
    }
    if strength == 0.0 {
        return Ok(image.clone());
    }

    let width = image.width();
    let height = image.height();
    let cx = normalize(center.0 as f32, width);
    let cy = normalize(center.1 as f32, height);
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;
    let epsilon = 1e-4;

    let out = ProcessedImage::from_fn(width, height, |x, y| {
        let dx = normalize(x as f32, width) - cx;
        let dy = normalize(y as f32, height) - cy;
        let m = magnification_factor(dx.hypot(dy), strength, radius);
        let src_x = denormalize(dx / m + cx, width);
        let src_y = denormalize(dy / m + cy, height);

        if !src_x.is_finite()
            || !src_y.is_finite()
            || src_x < -epsilon
            || src_y < -epsilon
            || src_x > max_x + epsilon
            || src_y > max_y + epsilon
        {
            return [0; 3];
        }

        let src_x = src_x.clamp(0.0, max_x);
        let src_y = src_y.clamp(0.0, max_y);
        let x0 = src_x.floor() as usize;
        let y0 = src_y.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let fx = src_x - x0 as f32;
        let fy = src_y - y0 as f32;

        let a = image.pixel(x0, y0);
        let b = image.pixel(x1, y0);
        let c = image.pixel(x0, y1);
        let d = image.pixel(x1, y1);
        let w00 = (1.0 - fx) * (1.0 - fy);
        let w10 = fx * (1.0 - fy);
        let w01 = (1.0 - fx) * fy;
        let w11 = fx * fy;
        let mix = |i: usize| {
            round_u16(
                a[i] as f32 * w00 + b[i] as f32 * w10 + c[i] as f32 * w01 + d[i] as f32 * w11,
            )
        };
        [mix(0), mix(1), mix(2)]
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{denormalize, magnification_factor, normalize};

    #[test]
    fn normalization_round_trips_pixel_centers() {
        for x in [0usize, 7, 63] {
            let n = normalize(x as f32, 64);
            assert!((denormalize(n, 64) - x as f32).abs() < 1e-4);
        }
        assert!((normalize(0.0, 64) + 1.0).abs() < 1e-6);
        assert!((normalize(63.0, 64) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn factor_peaks_at_center_and_decays() {
        let near = magnification_factor(0.0, 2.0, 0.3);
        let far = magnification_factor(1.0, 2.0, 0.3);
        assert!((near - 3.0).abs() < 1e-4);
        assert!(far < 1.01);
        assert!((magnification_factor(0.5, 0.0, 0.3) - 1.0).abs() < 1e-7);
    }
}
