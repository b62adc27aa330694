//! `lumen`: render a scene file to an image.

mod cli;
mod output;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, DeviceKind};
use lumen_core::{load_scene, Scene};
use lumen_renderer::device::CpuDevice;
#[cfg(feature = "gpu")]
use lumen_renderer::device::{GpuDevice, SceneBuffers};
use lumen_renderer::{render, render_tiled, RenderConfig, RenderOutput};

/// A device opened once and reused for every run.
enum Backend<'a> {
    Direct,
    Cpu(CpuDevice<'a>),
    #[cfg(feature = "gpu")]
    Gpu(GpuDevice),
}

impl<'a> Backend<'a> {
    fn open(kind: DeviceKind, scene: &'a Scene, config: RenderConfig) -> Result<Self> {
        match kind {
            DeviceKind::Direct => Ok(Backend::Direct),
            DeviceKind::Cpu => Ok(Backend::Cpu(CpuDevice::new(scene, config))),
            #[cfg(feature = "gpu")]
            DeviceKind::Gpu => {
                let buffers = SceneBuffers::from_scene(scene);
                let device = GpuDevice::new(&buffers, &config)
                    .context("failed to initialise the GPU device")?;
                Ok(Backend::Gpu(device))
            }
            #[cfg(not(feature = "gpu"))]
            DeviceKind::Gpu => anyhow::bail!("lumen was built without the `gpu` feature"),
        }
    }

    fn render_frame(&mut self, scene: &Scene, config: &RenderConfig) -> Result<RenderOutput> {
        let output = match self {
            Backend::Direct => render(scene, config),
            Backend::Cpu(device) => render_tiled(config, device)?,
            #[cfg(feature = "gpu")]
            Backend::Gpu(device) => render_tiled(config, device)?,
        };
        Ok(output)
    }
}

fn log_timing(first: Duration, rest: Duration, runs: u32) {
    let first_ms = first.as_millis();
    if runs > 1 {
        let average = rest.as_secs_f64() * 1000.0 / (runs - 1) as f64;
        log::info!(
            "first run time: {}ms, subsequent average time taken ({} run(s)): {:.1}ms",
            first_ms,
            runs - 1,
            average
        );
    } else {
        log::info!(
            "first run time: {}ms, subsequent average time taken (0 run(s)): N/A",
            first_ms
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let scene = load_scene(&args.input)
        .with_context(|| format!("failed to read scene {}", args.input.display()))?;
    if args.info {
        scene.log_summary();
    }

    let (width, height) = args.resolution();
    let config = RenderConfig::default()
        .with_resolution(width, height)
        .with_aa_level(args.samples)
        .with_max_rays_cast(args.max_rays)
        .with_tile_size(args.block_size)
        .with_test_mode(args.test_mode);

    let mut backend = Backend::open(args.device, &scene, config)?;
    log::info!(
        "Rendering {}x{} at {} sample(s) per pixel on {}",
        width,
        height,
        config.samples_per_pixel(),
        args.device.label()
    );

    let mut first = Duration::ZERO;
    let mut rest = Duration::ZERO;
    let mut last = None;
    for run in 0..args.runs {
        let start = Instant::now();
        let output = backend
            .render_frame(&scene, &config)
            .with_context(|| format!("render failed on run {}", run + 1))?;
        let elapsed = start.elapsed();

        if run == 0 {
            first = elapsed;
        } else {
            rest += elapsed;
        }
        last = Some(output);
    }
    log_timing(first, rest, args.runs);

    let output = last.context("no frame was rendered")?;
    log::info!("{} samples rendered", output.samples_rendered);

    let path = args.output_path(&scene.name);
    output::write_image(&path, &output.framebuffer)?;
    log::info!("Wrote {}", path.display());

    Ok(())
}
