//! Foveation compositor.
//!
//! The compositor blends the untouched frame (foveal treatment) with a
//! degraded copy (peripheral treatment) using a soft alpha derived from the
//! fovea mask:
//!
//! `out = frame * alpha + degraded * (1 - alpha)`
//!
//! The degraded copy is built in a fixed order because each stage reads the
//! previous one: Gaussian blur, radial distortion, then grayscale. The alpha
//! is the fovea mask blurred with the blend kernel when peripheral blur is
//! enabled and the hard mask otherwise.

use crate::config::RetinaConfig;
use crate::filter::{
    gaussian_blur_frame, gaussian_blur_mask, grayscale_frame, radial_pixel_distortion,
};
use crate::image::{Frame, ProcessedImage};
use crate::mask::Mask;
use crate::trace::trace_span;
use crate::util::math::round_u16;
use crate::util::{RetinaError, RetinaResult};
use rand::Rng;

/// Returns the blend alpha for `fovea` under `config`.
pub fn blend_alpha(fovea: &Mask, config: &RetinaConfig) -> Mask {
    if config.blur.enabled {
        gaussian_blur_mask(fovea, config.blur.blend_kernel, 0.0)
    } else {
        fovea.clone()
    }
}

/// Builds the peripheral treatment of `frame`.
pub fn degrade_periphery<R: Rng>(frame: &Frame, config: &RetinaConfig, rng: &mut R) -> Frame {
    let mut img = if config.blur.enabled {
        gaussian_blur_frame(frame, config.blur.kernel, config.blur.sigma)
    } else {
        frame.clone()
    };
    if config.clutter.enabled {
        img = radial_pixel_distortion(
            &img,
            config.clutter.max_distortion,
            config.clutter.intensity,
            rng,
        );
    }
    if config.peripheral_grayscale {
        img = grayscale_frame(&img);
    }
    img
}

/// Alpha-blends `fovea_img` over `periphery_img`.
pub fn blend(
    fovea_img: &Frame,
    periphery_img: &Frame,
    alpha: &Mask,
) -> RetinaResult<ProcessedImage> {
    if !fovea_img.same_size(periphery_img)
        || alpha.width() != fovea_img.width()
        || alpha.height() != fovea_img.height()
    {
        return Err(RetinaError::InvalidDimensions {
            width: alpha.width(),
            height: alpha.height(),
        });
    }

    let data = fovea_img
        .as_raw()
        .chunks_exact(3)
        .zip(periphery_img.as_raw().chunks_exact(3))
        .zip(alpha.data())
        .flat_map(|((f, p), &a)| {
            let a = a.clamp(0.0, 1.0);
            let mix = |i: usize| round_u16(f[i] as f32 * a + p[i] as f32 * (1.0 - a));
            [mix(0), mix(1), mix(2)]
        })
        .collect();
    ProcessedImage::new(data, fovea_img.width(), fovea_img.height())
}

/// Runs the full compositor for one frame and its hard fovea mask.
pub fn composite_foveated<R: Rng>(
    frame: &Frame,
    fovea: &Mask,
    config: &RetinaConfig,
    rng: &mut R,
) -> RetinaResult<ProcessedImage> {
    let _span = trace_span!("composite", width = frame.width(), height = frame.height()).entered();
    let alpha = blend_alpha(fovea, config);
    let degraded = degrade_periphery(frame, config, rng);
    blend(frame, &degraded, &alpha)
}
