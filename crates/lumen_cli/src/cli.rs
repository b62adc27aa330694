use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Where frames are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    /// Whole frame on the CPU, one task per row
    Direct,
    /// Bucket by bucket on the CPU
    Cpu,
    /// Bucket by bucket on a wgpu compute device
    Gpu,
}

impl DeviceKind {
    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Direct => "direct",
            DeviceKind::Cpu => "cpu",
            DeviceKind::Gpu => "gpu",
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Debug, Parser)]
#[command(name = "lumen")]
#[command(about = "Whitted-style ray tracer with tiled CPU and GPU rendering")]
pub struct Args {
    /// Scene file (.txt sectioned format or .json)
    #[arg(short, long, default_value = "scenes/allmaterials.txt")]
    pub input: PathBuf,

    /// Image size in pixels
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [1024, 1024])]
    pub size: Vec<u32>,

    /// Anti-aliasing level; each pixel traces SAMPLES x SAMPLES rays
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub samples: u32,

    /// Output image (.bmp or .png). Defaults to Outputs/<scene>_<W>x<H>x<samples>_<device>.bmp
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render the frame this many times and report timing
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Write a coordinate gradient instead of tracing rays
    #[arg(long)]
    pub test_mode: bool,

    /// Bucket edge length for tiled devices
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(1..))]
    pub block_size: u32,

    #[arg(long, value_enum, default_value_t = DeviceKind::Direct)]
    pub device: DeviceKind,

    /// Maximum reflections and refractions followed per camera ray
    #[arg(long, default_value_t = 10)]
    pub max_rays: u32,

    /// Set the logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log a summary of the loaded scene
    #[arg(long)]
    pub info: bool,
}

impl Args {
    pub fn resolution(&self) -> (u32, u32) {
        match self.size.as_slice() {
            [width, height] => (*width, *height),
            _ => (1024, 1024),
        }
    }

    /// The output path, derived from the scene and settings unless given.
    pub fn output_path(&self, scene_name: &str) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let (width, height) = self.resolution();
        Path::new("Outputs").join(format!(
            "{}_{}x{}x{}_{}.bmp",
            scene_name,
            width,
            height,
            self.samples,
            self.device.label()
        ))
    }
}
