//! Retina configuration.
//!
//! `RetinaConfig` is an immutable value shared read-only by every image of a
//! batch. It carries no serialization; callers that persist settings map their
//! own key/value document onto these fields.

use crate::flow::FlowParams;
use crate::util::{RetinaError, RetinaResult};
use std::fmt;
use std::str::FromStr;

/// Peripheral Gaussian blur settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeripheralBlur {
    /// Blur the periphery and soften the fovea mask.
    pub enabled: bool,
    /// Odd kernel size `(width, height)` for the frame blur.
    pub kernel: (usize, usize),
    /// Gaussian sigma; `0.0` derives it from the kernel size.
    pub sigma: f32,
    /// Odd kernel size used to soften the fovea mask into a blend alpha.
    pub blend_kernel: (usize, usize),
}

impl Default for PeripheralBlur {
    fn default() -> Self {
        Self {
            enabled: true,
            kernel: (21, 21),
            sigma: 0.0,
            blend_kernel: (121, 121),
        }
    }
}

/// Per-pixel radial distortion ("visual clutter") settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualClutter {
    pub enabled: bool,
    /// Scales `max_distortion`; `0.0` disables displacement.
    pub intensity: f32,
    /// Largest displacement in pixels at intensity 1.
    pub max_distortion: f32,
}

impl Default for VisualClutter {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.5,
            max_distortion: 10.0,
        }
    }
}

/// Cortical magnification warp settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorticalMagnification {
    pub enabled: bool,
    /// Peak magnification added at the fixation point.
    pub strength: f32,
    /// Gaussian falloff radius as a fraction of the normalized half-extent.
    pub radius: f32,
}

impl Default for CorticalMagnification {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0.5,
            radius: 0.3,
        }
    }
}

/// Foveation mode tag, parsed from persisted settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoveationKind {
    Static,
    Dynamic,
}

impl FromStr for FoveationKind {
    type Err = RetinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            _ => Err(RetinaError::UnsupportedMode {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FoveationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// How the fixation point is chosen for each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Foveation {
    /// The configured center is used for every frame.
    Static,
    /// The center follows the strongest optical flow between frame `t` and `t+1`.
    Dynamic {
        /// Grid `(rows, cols)` over which mean flow magnitude is compared.
        grid: (usize, usize),
        flow: FlowParams,
    },
}

impl Foveation {
    /// Dynamic foveation with default flow parameters.
    pub fn dynamic(rows: usize, cols: usize) -> Self {
        Self::Dynamic {
            grid: (rows, cols),
            flow: FlowParams::default(),
        }
    }

    pub fn kind(&self) -> FoveationKind {
        match self {
            Self::Static => FoveationKind::Static,
            Self::Dynamic { .. } => FoveationKind::Dynamic,
        }
    }
}

/// Full parameter bundle for one retina pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct RetinaConfig {
    /// Side length `P` every frame is resized to.
    pub resolution: usize,
    /// Fovea center `(x, y)` in pixels; may lie outside the canvas.
    pub fovea_center: (i32, i32),
    /// Fovea radius in pixels, must be positive.
    pub fovea_radius: u32,
    /// Percentage of periphery pixels restored to full color.
    pub peripheral_active_cones: f32,
    /// Percentage of fovea pixels converted to luminance.
    pub fovea_active_rods: f32,
    pub blur: PeripheralBlur,
    /// Desaturate the periphery.
    pub peripheral_grayscale: bool,
    pub foveation: Foveation,
    pub clutter: VisualClutter,
    pub magnification: CorticalMagnification,
    /// Seed for the stochastic stages; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for RetinaConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            fovea_center: (128, 128),
            fovea_radius: 50,
            peripheral_active_cones: 0.0,
            fovea_active_rods: 0.0,
            blur: PeripheralBlur::default(),
            peripheral_grayscale: true,
            foveation: Foveation::Static,
            clutter: VisualClutter::default(),
            magnification: CorticalMagnification::default(),
            seed: None,
        }
    }
}

impl RetinaConfig {
    /// Checks every field range; run once before any image is processed.
    pub fn validate(&self) -> RetinaResult<()> {
        if self.resolution == 0 {
            return Err(RetinaError::config("resolution", "must be > 0"));
        }
        if self.fovea_radius == 0 {
            return Err(RetinaError::config("fovea_radius", "must be > 0"));
        }
        check_percentage("peripheral_active_cones", self.peripheral_active_cones)?;
        check_percentage("fovea_active_rods", self.fovea_active_rods)?;

        if self.blur.enabled {
            check_odd_kernel("blur.kernel", self.blur.kernel)?;
            check_odd_kernel("blur.blend_kernel", self.blur.blend_kernel)?;
            if !self.blur.sigma.is_finite() || self.blur.sigma < 0.0 {
                return Err(RetinaError::config("blur.sigma", "must be finite and >= 0"));
            }
        }

        if self.clutter.enabled {
            if !self.clutter.intensity.is_finite() || self.clutter.intensity < 0.0 {
                return Err(RetinaError::config(
                    "clutter.intensity",
                    "must be finite and >= 0",
                ));
            }
            if !self.clutter.max_distortion.is_finite() || self.clutter.max_distortion < 0.0 {
                return Err(RetinaError::config(
                    "clutter.max_distortion",
                    "must be finite and >= 0",
                ));
            }
        }

        if self.magnification.enabled {
            let m = &self.magnification;
            if !m.strength.is_finite() || m.strength < 0.0 {
                return Err(RetinaError::config(
                    "magnification.strength",
                    "must be finite and >= 0",
                ));
            }
            if !m.radius.is_finite() || m.radius <= 0.0 || m.radius > 1.0 {
                return Err(RetinaError::config(
                    "magnification.radius",
                    "must lie in (0, 1]",
                ));
            }
        }

        if let Foveation::Dynamic { grid, flow } = &self.foveation {
            if grid.0 == 0 || grid.1 == 0 {
                return Err(RetinaError::config("foveation.grid", "dimensions must be > 0"));
            }
            if grid.0 > self.resolution || grid.1 > self.resolution {
                return Err(RetinaError::config(
                    "foveation.grid",
                    "dimensions must not exceed the resolution",
                ));
            }
            flow.validate()?;
        }

        Ok(())
    }
}

fn check_percentage(field: &'static str, value: f32) -> RetinaResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(RetinaError::config(field, "must lie in [0, 100]"));
    }
    Ok(())
}

fn check_odd_kernel(field: &'static str, kernel: (usize, usize)) -> RetinaResult<()> {
    if kernel.0 == 0 || kernel.1 == 0 || kernel.0 % 2 == 0 || kernel.1 % 2 == 0 {
        return Err(RetinaError::config(field, "kernel sizes must be odd and positive"));
    }
    Ok(())
}

impl fmt::Display for RetinaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image size: {0}x{0}", self.resolution)?;
        writeln!(
            f,
            "Fovea: center {:?}, radius {}, active rods {}%",
            self.fovea_center, self.fovea_radius, self.fovea_active_rods
        )?;
        writeln!(
            f,
            "Periphery: active cones {}%, grayscale {}",
            self.peripheral_active_cones, self.peripheral_grayscale
        )?;
        writeln!(
            f,
            "Blur: {} (kernel {:?}, sigma {}, blend kernel {:?})",
            self.blur.enabled, self.blur.kernel, self.blur.sigma, self.blur.blend_kernel
        )?;
        match &self.foveation {
            Foveation::Static => writeln!(f, "Foveation: static")?,
            Foveation::Dynamic { grid, .. } => writeln!(f, "Foveation: dynamic, grid {grid:?}")?,
        }
        writeln!(
            f,
            "Visual clutter: {} (intensity {})",
            self.clutter.enabled, self.clutter.intensity
        )?;
        write!(
            f,
            "Cortical magnification: {} (strength {}, radius {})",
            self.magnification.enabled, self.magnification.strength, self.magnification.radius
        )
    }
}
