//! Numeric helpers shared by the filters and the flow estimator.

use std::f32::consts::TAU;

/// Rec.601 luma of an RGB triple, unrounded.
pub(crate) fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Gaussian sigma derived from an odd kernel size when none is given.
pub(crate) fn auto_sigma(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// `sigma` when positive, otherwise the size-derived default.
pub(crate) fn axis_sigma(ksize: usize, sigma: f32) -> f32 {
    if sigma > 0.0 {
        sigma
    } else {
        auto_sigma(ksize)
    }
}

/// Normalized 1D Gaussian kernel of odd length `ksize`.
pub(crate) fn gaussian_kernel(ksize: usize, sigma: f32) -> Vec<f32> {
    if ksize <= 1 {
        return vec![1.0];
    }
    let sigma = axis_sigma(ksize, sigma);
    let half = (ksize / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Rounds and clamps to the 8-bit range.
pub(crate) fn round_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Rounds and clamps to the 16-bit range.
pub(crate) fn round_u16(value: f32) -> u16 {
    value.round().clamp(0.0, u16::MAX as f32) as u16
}

/// Wraps an angle in radians to `[0, 2π)`.
pub(crate) fn wrap_tau(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::{auto_sigma, axis_sigma, gaussian_kernel, luma, round_u8, wrap_tau};

    #[test]
    fn luma_of_gray_is_identity() {
        assert!((luma(100.0, 100.0, 100.0) - 100.0).abs() < 1e-4);
        assert!((luma(255.0, 0.0, 0.0) - 76.245).abs() < 1e-3);
    }

    #[test]
    fn auto_sigma_matches_kernel_size_rule() {
        assert!((auto_sigma(21) - 3.5).abs() < 1e-6);
        assert!((auto_sigma(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(7, 0.0);
        assert_eq!(k.len(), 7);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..3 {
            assert!((k[i] - k[6 - i]).abs() < 1e-7);
        }
        assert!(k[3] > k[2]);
        assert_eq!(gaussian_kernel(1, 0.0), vec![1.0]);
    }

    #[test]
    fn explicit_sigma_overrides_kernel_size() {
        assert_eq!(axis_sigma(21, 2.0), 2.0);
        assert!((axis_sigma(21, 0.0) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn round_u8_clamps() {
        assert_eq!(round_u8(-3.0), 0);
        assert_eq!(round_u8(254.6), 255);
        assert_eq!(round_u8(300.0), 255);
    }

    #[test]
    fn wrap_tau_maps_to_expected_range() {
        let a = wrap_tau(-std::f32::consts::FRAC_PI_2);
        assert!((a - 1.5 * std::f32::consts::PI).abs() < 1e-5);
        assert!(wrap_tau(0.0).abs() < 1e-7);
    }
}
