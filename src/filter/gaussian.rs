//! Gaussian blur through `imageproc`.
//!
//! Kernel sizes are `(width, height)` and must be odd; a size of 1 along an
//! axis leaves that axis untouched. A sigma of `0.0` is derived per axis from
//! the kernel size as `0.3 * ((k - 1) * 0.5 - 1) + 0.8`. Borders replicate
//! the edge pixel.

use crate::image::Frame;
use crate::mask::Mask;
use crate::util::math::{axis_sigma, gaussian_kernel, round_u8};
use ::image::{ImageBuffer, Luma, Rgb};
use imageproc::filter::{gaussian_blur_f32, separable_filter};

/// Blurs an RGB frame, rounding back to 8 bits.
///
/// The taps come from the kernel size, so the support matches `kernel`
/// exactly on both axes.
pub fn gaussian_blur_frame(frame: &Frame, kernel: (usize, usize), sigma: f32) -> Frame {
    let (width, height) = (frame.width(), frame.height());
    if kernel == (1, 1) || width == 0 || height == 0 {
        return frame.clone();
    }
    let data: Vec<f32> = frame.as_raw().iter().map(|&v| f32::from(v)).collect();
    let Some(rgb) = ImageBuffer::<Rgb<f32>, Vec<f32>>::from_raw(width as u32, height as u32, data)
    else {
        return frame.clone();
    };

    let kx = gaussian_kernel(kernel.0, sigma);
    let ky = gaussian_kernel(kernel.1, sigma);
    let blurred = separable_filter(&rgb, &kx, &ky);
    let data = blurred.into_raw().into_iter().map(round_u8).collect();
    Frame::from_parts(data, width, height)
}

/// Blurs a mask, keeping full `f32` precision.
///
/// Square kernels go through `gaussian_blur_f32`, which sizes its own support
/// from sigma; anisotropic kernels fall back to explicit per-axis taps.
pub fn gaussian_blur_mask(mask: &Mask, kernel: (usize, usize), sigma: f32) -> Mask {
    let (width, height) = (mask.width(), mask.height());
    if kernel == (1, 1) || width == 0 || height == 0 {
        return mask.clone();
    }
    let Some(plane) = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(
        width as u32,
        height as u32,
        mask.data().to_vec(),
    ) else {
        return mask.clone();
    };

    let blurred = if kernel.0 == kernel.1 {
        gaussian_blur_f32(&plane, axis_sigma(kernel.0, sigma))
    } else {
        let kx = gaussian_kernel(kernel.0, sigma);
        let ky = gaussian_kernel(kernel.1, sigma);
        separable_filter(&plane, &kx, &ky)
    };
    Mask::from_vec(blurred.into_raw(), width, height)
}

#[cfg(test)]
mod tests {
    use super::{gaussian_blur_frame, gaussian_blur_mask};
    use crate::image::Frame;
    use crate::mask::build_retina_masks;

    #[test]
    fn unit_kernel_is_identity() {
        let frame = Frame::from_fn(5, 4, |x, y| [(x * 40) as u8, (y * 50) as u8, 7]);
        assert_eq!(gaussian_blur_frame(&frame, (1, 1), 0.0), frame);
    }

    #[test]
    fn constant_frame_is_unchanged() {
        let frame = Frame::from_fn(9, 9, |_, _| [120, 30, 200]);
        assert_eq!(gaussian_blur_frame(&frame, (5, 5), 0.0), frame);
    }

    #[test]
    fn one_axis_kernel_leaves_columns_alone() {
        // Values vary only along y, so a horizontal-only blur changes nothing.
        let frame = Frame::from_fn(7, 6, |_, y| [(y * 40) as u8, 9, 250]);
        assert_eq!(gaussian_blur_frame(&frame, (5, 1), 0.0), frame);
        assert_ne!(gaussian_blur_frame(&frame, (1, 5), 0.0), frame);
    }

    #[test]
    fn blurred_mask_softens_edge_and_stays_in_range() {
        let masks = build_retina_masks(32, (16, 16), 6).unwrap();
        let soft = gaussian_blur_mask(&masks.fovea, (9, 9), 0.0);
        assert!(soft.data().iter().all(|&v| (-1e-6..=1.0 + 1e-6).contains(&v)));
        let edge = soft.get(22, 16).unwrap();
        assert!(edge > 0.0 && edge < 1.0, "edge value {edge}");
        assert!(soft.get(16, 16).unwrap() > 0.99);

        let wide = gaussian_blur_mask(&masks.fovea, (9, 3), 0.0);
        let edge = wide.get(22, 16).unwrap();
        assert!(edge > 0.0 && edge < 1.0, "edge value {edge}");
    }
}
