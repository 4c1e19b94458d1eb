//! Photoreceptor sampler.
//!
//! A percentage of the nonzero pixels of a mask is drawn uniformly without
//! replacement. Selected fovea pixels become "active rods" (converted to their
//! own luminance); selected periphery pixels become "active cones" (restored
//! to the original frame color).

use crate::image::{Frame, ProcessedImage};
use crate::mask::Mask;
use crate::util::math::{luma, round_u16};
use crate::util::{RetinaError, RetinaResult};
use rand::seq::index;
use rand::Rng;
use std::str::FromStr;

/// Effect applied to sampled pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelEffect {
    /// Replace the pixel with its own luminance.
    Grayscale,
    /// Restore the pixel from the original frame.
    Color,
}

impl FromStr for PixelEffect {
    type Err = RetinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grayscale" => Ok(Self::Grayscale),
            "color" => Ok(Self::Color),
            _ => Err(RetinaError::UnsupportedEffect {
                name: s.to_string(),
            }),
        }
    }
}

/// Number of pixels selected for `percentage` of `available` nonzero pixels.
pub fn sample_count(percentage: f32, available: usize) -> usize {
    let n = (f64::from(percentage) / 100.0 * available as f64).floor();
    (n.max(0.0) as usize).min(available)
}

/// Draws `floor(percentage / 100 * nonzero(mask))` distinct nonzero coordinates.
///
/// Coordinates are `(x, y)`. A percentage of 0 yields an empty selection and
/// 100 yields every nonzero coordinate exactly once.
pub fn select_random_pixels<R: Rng>(
    percentage: f32,
    mask: &Mask,
    rng: &mut R,
) -> RetinaResult<Vec<(usize, usize)>> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(RetinaError::config("percentage", "must lie in [0, 100]"));
    }
    let candidates = mask.nonzero_coords();
    let amount = sample_count(percentage, candidates.len());
    if amount == 0 {
        return Ok(Vec::new());
    }
    if amount == candidates.len() {
        return Ok(candidates);
    }
    Ok(index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|i| candidates[i])
        .collect())
}

/// Applies `effect` at every selected coordinate of `image`.
pub fn apply_pixel_effect(
    image: &mut ProcessedImage,
    original: &Frame,
    selected: &[(usize, usize)],
    effect: PixelEffect,
) -> RetinaResult<()> {
    if !image.same_size(original) {
        return Err(RetinaError::InvalidDimensions {
            width: original.width(),
            height: original.height(),
        });
    }
    for &(x, y) in selected {
        if x >= image.width() || y >= image.height() {
            return Err(RetinaError::Computation {
                stage: "pixel_effect",
                reason: format!("coordinate ({x}, {y}) outside image"),
            });
        }
        let value = match effect {
            PixelEffect::Grayscale => {
                let [r, g, b] = image.pixel(x, y);
                let l = round_u16(luma(r as f32, g as f32, b as f32));
                [l, l, l]
            }
            PixelEffect::Color => original.pixel(x, y).map(u16::from),
        };
        image.set_pixel(x, y, value);
    }
    Ok(())
}
