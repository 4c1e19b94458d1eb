//! Per-image retina pipeline.
//!
//! `process_frames` is a pure function of the configuration, the frames and
//! an RNG stream: preprocess is done by the caller, then the fixation is
//! (optionally) relocated, masks are rebuilt for that fixation, the
//! compositor runs, photoreceptors are sampled, and the cortical warp is
//! applied last. `Retina` adds file loading on top and can be shared across
//! threads because it holds nothing but the validated configuration.

use crate::composite::composite_foveated;
use crate::config::{Foveation, RetinaConfig};
use crate::flow::locate_fixation_within;
use crate::image::io::load_frame;
use crate::image::{Frame, ProcessedImage};
use crate::mask::build_retina_masks;
use crate::sampler::{apply_pixel_effect, select_random_pixels, PixelEffect};
use crate::trace::{trace_event, trace_span};
use crate::util::{RetinaError, RetinaResult};
use crate::warp::cortical_magnification;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::{Duration, Instant};

/// Time budget for one image.
///
/// Checked between pipeline stages and before every Jacobi sweep of the flow
/// estimator. Decoding a file and the single-pass stages (compositing,
/// sampling, warping) run to completion once started.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Starts a budget that runs from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub(crate) fn check(deadline: Option<&Deadline>, stage: &'static str) -> RetinaResult<()> {
        match deadline {
            Some(d) if d.start.elapsed() > d.budget => Err(RetinaError::Timeout {
                stage,
                budget_ms: d.budget.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}

/// Result of one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct RetinaOutput {
    pub image: ProcessedImage,
    /// Fixation center used for masks and magnification.
    pub center: (i32, i32),
    /// Number of fovea pixels turned into active rods.
    pub active_rods: usize,
    /// Number of periphery pixels turned into active cones.
    pub active_cones: usize,
}

/// Per-image RNG stream: seeded from `seed` and `index`, or from the OS.
pub fn image_rng(seed: Option<u64>, index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_os_rng(),
    }
}

/// Runs the pipeline on already-preprocessed frames.
///
/// `current` must be `P x P`. Under dynamic foveation a missing or
/// mismatched `next` frame, or a failed flow estimate, keeps the configured
/// center.
pub fn process_frames<R: Rng>(
    config: &RetinaConfig,
    current: &Frame,
    next: Option<&Frame>,
    rng: &mut R,
    deadline: Option<&Deadline>,
) -> RetinaResult<RetinaOutput> {
    config.validate()?;
    let p = config.resolution;
    if current.width() != p || current.height() != p {
        return Err(RetinaError::InvalidDimensions {
            width: current.width(),
            height: current.height(),
        });
    }

    let center = match &config.foveation {
        Foveation::Static => config.fovea_center,
        Foveation::Dynamic { grid, flow } => {
            Deadline::check(deadline, "fixation")?;
            match next {
                Some(next) if current.same_size(next) => {
                    match locate_fixation_within(
                        current,
                        next,
                        *grid,
                        flow,
                        config.fovea_center,
                        deadline,
                    ) {
                        Ok(fixation) => fixation.center,
                        Err(err @ RetinaError::Timeout { .. }) => return Err(err),
                        Err(err) => {
                            trace_event!(
                                warn: "fixation_fallback",
                                reason = err.to_string().as_str()
                            );
                            config.fovea_center
                        }
                    }
                }
                _ => {
                    trace_event!(
                        warn: "fixation_fallback",
                        reason = RetinaError::MissingNextFrame.to_string().as_str()
                    );
                    config.fovea_center
                }
            }
        }
    };

    let masks = build_retina_masks(p, center, config.fovea_radius)?;

    Deadline::check(deadline, "composite")?;
    let mut image = composite_foveated(current, &masks.fovea, config, rng)?;

    Deadline::check(deadline, "photoreceptors")?;
    let rods = select_random_pixels(config.fovea_active_rods, &masks.fovea, rng)?;
    apply_pixel_effect(&mut image, current, &rods, PixelEffect::Grayscale)?;
    let cones = select_random_pixels(config.peripheral_active_cones, &masks.periphery, rng)?;
    apply_pixel_effect(&mut image, current, &cones, PixelEffect::Color)?;
    trace_event!(
        "photoreceptors",
        active_rods = rods.len(),
        active_cones = cones.len()
    );

    if config.magnification.enabled {
        Deadline::check(deadline, "magnification")?;
        image = cortical_magnification(
            &image,
            center,
            config.magnification.strength,
            config.magnification.radius,
        )?;
    }

    Ok(RetinaOutput {
        image,
        center,
        active_rods: rods.len(),
        active_cones: cones.len(),
    })
}

/// A validated retina configuration with file-based entry points.
#[derive(Clone, Debug)]
pub struct Retina {
    config: RetinaConfig,
}

impl Retina {
    /// Validates `config` and wraps it.
    pub fn new(config: RetinaConfig) -> RetinaResult<Self> {
        config.validate()?;
        trace_event!(debug: "retina_config", summary = config.to_string().as_str());
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetinaConfig {
        &self.config
    }

    /// Loads and resizes a frame to `P x P`.
    pub fn preprocess(&self, path: &Path) -> RetinaResult<Frame> {
        load_frame(path, self.config.resolution)
    }

    /// Processes one image file.
    ///
    /// `next_frame_path` is only read under dynamic foveation; when it is
    /// absent or unreadable the configured center is kept.
    pub fn apply(
        &self,
        image_path: &Path,
        next_frame_path: Option<&Path>,
    ) -> RetinaResult<ProcessedImage> {
        let mut rng = image_rng(self.config.seed, 0);
        self.apply_with(image_path, next_frame_path, &mut rng, None)
            .map(|out| out.image)
    }

    /// Processes one image file with an explicit RNG stream and time budget.
    pub fn apply_with<R: Rng>(
        &self,
        image_path: &Path,
        next_frame_path: Option<&Path>,
        rng: &mut R,
        deadline: Option<&Deadline>,
    ) -> RetinaResult<RetinaOutput> {
        let _span = trace_span!("retina_apply", path = image_path.display().to_string().as_str())
            .entered();
        let current = self.preprocess(image_path)?;

        let next = match (&self.config.foveation, next_frame_path) {
            (Foveation::Dynamic { .. }, Some(path)) => match self.preprocess(path) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    trace_event!(
                        warn: "next_frame_unavailable",
                        reason = err.to_string().as_str()
                    );
                    None
                }
            },
            _ => None,
        };

        process_frames(&self.config, &current, next.as_ref(), rng, deadline)
    }
}
