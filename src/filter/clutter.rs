//! Per-pixel radial distortion ("visual clutter").
//!
//! Every destination pixel copies a source pixel displaced by a random polar
//! offset `(rho, theta)` with `rho ~ U(0, max_distortion * intensity)` and
//! `theta ~ U(0, 2π)`. Offsets are independent per pixel; reads always come
//! from the undistorted input.

use crate::image::Frame;
use rand::Rng;
use std::f32::consts::TAU;

/// Applies radial pixel distortion, returning a new frame.
///
/// A non-positive `max_distortion * intensity` returns an unchanged copy. A
/// product too large for `f32` is treated as `f32::MAX`; offsets that leave
/// the frame clamp to its edge.
pub fn radial_pixel_distortion<R: Rng>(
    frame: &Frame,
    max_distortion: f32,
    intensity: f32,
    rng: &mut R,
) -> Frame {
    let reach = max_distortion * intensity;
    if reach.is_nan() || reach <= 0.0 {
        return frame.clone();
    }
    let reach = reach.min(f32::MAX);

    let max_x = frame.width().saturating_sub(1) as f32;
    let max_y = frame.height().saturating_sub(1) as f32;
    Frame::from_fn(frame.width(), frame.height(), |x, y| {
        let rho: f32 = rng.random_range(0.0..reach);
        let theta: f32 = rng.random_range(0.0..TAU);
        let (sin, cos) = theta.sin_cos();
        let sx = (x as f32 + (rho * cos).round()).clamp(0.0, max_x) as usize;
        let sy = (y as f32 + (rho * sin).round()).clamp(0.0, max_y) as usize;
        frame.pixel(sx, sy)
    })
}

#[cfg(test)]
mod tests {
    use super::radial_pixel_distortion;
    use crate::image::Frame;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_intensity_is_identity() {
        let frame = Frame::from_fn(8, 8, |x, y| [(x * 30) as u8, (y * 30) as u8, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(radial_pixel_distortion(&frame, 10.0, 0.0, &mut rng), frame);
    }

    #[test]
    fn pixels_come_from_within_reach() {
        // Encode coordinates in the channels so every output names its source.
        let frame = Frame::from_fn(40, 40, |x, y| [x as u8, y as u8, 0]);
        let mut rng = StdRng::seed_from_u64(7);
        let out = radial_pixel_distortion(&frame, 10.0, 0.5, &mut rng);
        let mut moved = 0;
        for y in 0..40 {
            for x in 0..40 {
                let [sx, sy, _] = out.pixel(x, y);
                let dx = sx as i64 - x as i64;
                let dy = sy as i64 - y as i64;
                assert!(dx.abs() <= 5 && dy.abs() <= 5);
                if dx != 0 || dy != 0 {
                    moved += 1;
                }
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn huge_reach_clamps_to_frame_edges() {
        let frame = Frame::from_fn(16, 16, |x, y| [x as u8, y as u8, 0]);
        let mut rng = StdRng::seed_from_u64(3);
        for (max_distortion, intensity) in [(30.0, 1e20), (f32::MAX, 10.0)] {
            let out = radial_pixel_distortion(&frame, max_distortion, intensity, &mut rng);
            assert_eq!((out.width(), out.height()), (16, 16));
            // Every read lands on the border once offsets dwarf the frame.
            for y in 0..16 {
                for x in 0..16 {
                    let [sx, sy, _] = out.pixel(x, y);
                    assert!(
                        sx == 0 || sx == 15 || sy == 0 || sy == 15,
                        "({x}, {y}) read ({sx}, {sy})"
                    );
                }
            }
        }
    }
}
