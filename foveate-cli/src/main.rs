use clap::Parser;
use foveate::image::io::save_processed;
use foveate::{
    BatchObserver, BatchOptions, BatchOrchestrator, CorticalMagnification, FlowParams, Foveation,
    FoveationKind, FrameOutcome, PeripheralBlur, RetinaConfig, VisualClutter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str = r#"{
  "input_dir": "frames",
  "output_dir": "frames_retina",
  "parallel": true,
  "workers": 4,
  "timeout_ms": 5000,
  "resolution": 256,
  "fovea_center": [128, 128],
  "fovea_radius": 50,
  "peripheral_active_cones": 5.0,
  "fovea_active_rods": 5.0,
  "peripheral_grayscale": true,
  "blur": { "enabled": true, "kernel": [21, 21], "sigma": 0.0, "blend_kernel": [121, 121] },
  "foveation": { "mode": "dynamic", "grid": [4, 4] },
  "clutter": { "enabled": true, "intensity": 0.5, "max_distortion": 10.0 },
  "magnification": { "enabled": false, "strength": 0.5, "radius": 0.3 },
  "seed": 42
}"#;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Foveate CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BlurJson {
    enabled: bool,
    kernel: (usize, usize),
    sigma: f32,
    blend_kernel: (usize, usize),
}

impl Default for BlurJson {
    fn default() -> Self {
        let cfg = PeripheralBlur::default();
        Self {
            enabled: cfg.enabled,
            kernel: cfg.kernel,
            sigma: cfg.sigma,
            blend_kernel: cfg.blend_kernel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FoveationJson {
    mode: String,
    grid: (usize, usize),
    levels: usize,
    alpha: f32,
    iterations: usize,
    min_motion: f32,
}

impl Default for FoveationJson {
    fn default() -> Self {
        let flow = FlowParams::default();
        Self {
            mode: FoveationKind::Static.to_string(),
            grid: (10, 10),
            levels: flow.levels,
            alpha: flow.alpha,
            iterations: flow.iterations,
            min_motion: flow.min_motion,
        }
    }
}

impl FoveationJson {
    fn to_foveation(&self) -> Result<Foveation, foveate::RetinaError> {
        Ok(match self.mode.parse::<FoveationKind>()? {
            FoveationKind::Static => Foveation::Static,
            FoveationKind::Dynamic => Foveation::Dynamic {
                grid: self.grid,
                flow: FlowParams {
                    levels: self.levels,
                    alpha: self.alpha,
                    iterations: self.iterations,
                    min_motion: self.min_motion,
                },
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClutterJson {
    enabled: bool,
    intensity: f32,
    max_distortion: f32,
}

impl Default for ClutterJson {
    fn default() -> Self {
        let cfg = VisualClutter::default();
        Self {
            enabled: cfg.enabled,
            intensity: cfg.intensity,
            max_distortion: cfg.max_distortion,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MagnificationJson {
    enabled: bool,
    strength: f32,
    radius: f32,
}

impl Default for MagnificationJson {
    fn default() -> Self {
        let cfg = CorticalMagnification::default();
        Self {
            enabled: cfg.enabled,
            strength: cfg.strength,
            radius: cfg.radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    input_dir: String,
    output_dir: Option<String>,
    parallel: bool,
    workers: usize,
    timeout_ms: Option<u64>,
    resolution: usize,
    fovea_center: (i32, i32),
    fovea_radius: u32,
    peripheral_active_cones: f32,
    fovea_active_rods: f32,
    peripheral_grayscale: bool,
    blur: BlurJson,
    foveation: FoveationJson,
    clutter: ClutterJson,
    magnification: MagnificationJson,
    seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = RetinaConfig::default();
        let opts = BatchOptions::default();
        Self {
            input_dir: String::new(),
            output_dir: None,
            parallel: opts.parallel,
            workers: opts.workers,
            timeout_ms: None,
            resolution: cfg.resolution,
            fovea_center: cfg.fovea_center,
            fovea_radius: cfg.fovea_radius,
            peripheral_active_cones: cfg.peripheral_active_cones,
            fovea_active_rods: cfg.fovea_active_rods,
            peripheral_grayscale: cfg.peripheral_grayscale,
            blur: BlurJson::default(),
            foveation: FoveationJson::default(),
            clutter: ClutterJson::default(),
            magnification: MagnificationJson::default(),
            seed: cfg.seed,
        }
    }
}

impl Config {
    fn retina_config(&self) -> Result<RetinaConfig, foveate::RetinaError> {
        Ok(RetinaConfig {
            resolution: self.resolution,
            fovea_center: self.fovea_center,
            fovea_radius: self.fovea_radius,
            peripheral_active_cones: self.peripheral_active_cones,
            fovea_active_rods: self.fovea_active_rods,
            blur: PeripheralBlur {
                enabled: self.blur.enabled,
                kernel: self.blur.kernel,
                sigma: self.blur.sigma,
                blend_kernel: self.blur.blend_kernel,
            },
            peripheral_grayscale: self.peripheral_grayscale,
            foveation: self.foveation.to_foveation()?,
            clutter: VisualClutter {
                enabled: self.clutter.enabled,
                intensity: self.clutter.intensity,
                max_distortion: self.clutter.max_distortion,
            },
            magnification: CorticalMagnification {
                enabled: self.magnification.enabled,
                strength: self.magnification.strength,
                radius: self.magnification.radius,
            },
            seed: self.seed,
        })
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            parallel: self.parallel,
            workers: self.workers,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Prints progress lines to stderr.
struct ConsoleProgress;

impl BatchObserver for ConsoleProgress {
    fn progress(&mut self, completed: usize, total: usize) {
        eprint!("\rprocessed {completed}/{total}");
    }

    fn estimated_time_remaining(&mut self, remaining: Duration) {
        eprint!(" (eta {:.1}s)   ", remaining.as_secs_f64());
    }

    fn total_elapsed(&mut self, elapsed: Duration) {
        eprintln!("\ndone in {:.2}s", elapsed.as_secs_f64());
    }
}

#[derive(Debug, Serialize)]
struct FailureRecord {
    file: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    processed: usize,
    failed: Vec<FailureRecord>,
    cancelled: usize,
    elapsed_ms: u64,
}

fn list_images(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("foveate=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_dir.is_empty() {
        return Err("input_dir must be set in the config".into());
    }

    let input_dir = PathBuf::from(&config.input_dir);
    let output_dir = config
        .output_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| input_dir.join("retina"));
    fs::create_dir_all(&output_dir)?;

    let files = list_images(&input_dir)?;
    if files.is_empty() {
        return Err(format!("no images found in {}", input_dir.display()).into());
    }

    let mut orchestrator =
        BatchOrchestrator::new(config.retina_config()?, config.batch_options())?;
    let result = orchestrator.run(&input_dir, &files, &mut ConsoleProgress)?;

    let mut failed = Vec::new();
    for (name, outcome) in files.iter().zip(result.outcomes()) {
        match outcome {
            FrameOutcome::Processed(image) => {
                let stem = Path::new(name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(name.as_str());
                save_processed(output_dir.join(format!("{stem}_retina.png")), image)?;
            }
            FrameOutcome::Failed { file, error } => failed.push(FailureRecord {
                file: file.display().to_string(),
                error: error.to_string(),
            }),
            FrameOutcome::Cancelled => {}
        }
    }

    let summary = Summary {
        processed: result.succeeded(),
        failed,
        cancelled: result.cancelled(),
        elapsed_ms: result.elapsed().as_millis() as u64,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
