//! Foveate simulates non-uniform retinal sampling on images and video frames.
//!
//! A sharp, color fovea is blended into a blurred, desaturated and optionally
//! distorted periphery. Photoreceptor activation is perturbed stochastically,
//! the fixation can follow optical flow between consecutive frames, and a
//! radially varying remap caricatures cortical magnification. The batch
//! orchestrator applies the pipeline across a folder of frames, sequentially
//! or on a worker pool.

pub mod batch;
pub mod composite;
pub mod config;
pub mod filter;
pub mod flow;
pub mod image;
pub mod mask;
pub mod pipeline;
pub mod sampler;
mod trace;
pub mod util;
pub mod warp;

pub use batch::{
    run_batch, BatchObserver, BatchOptions, BatchOrchestrator, BatchResult, BatchState,
    CancelHandle, FrameOutcome,
};
pub use composite::composite_foveated;
pub use config::{
    CorticalMagnification, Foveation, FoveationKind, PeripheralBlur, RetinaConfig, VisualClutter,
};
pub use flow::{dense_flow, locate_fixation, Fixation, FlowField, FlowParams};
pub use image::{Frame, ImageView, ProcessedImage, RgbBuffer};
pub use mask::{build_retina_masks, Mask, RetinaMasks};
pub use pipeline::{image_rng, process_frames, Deadline, Retina, RetinaOutput};
pub use sampler::{apply_pixel_effect, select_random_pixels, PixelEffect};
pub use util::{RetinaError, RetinaResult};
pub use warp::cortical_magnification;
