//! Compute-shader tile device built on wgpu.
//!
//! The scene is uploaded once as read-only storage buffers. Each tile then
//! rewrites the parameter uniform, dispatches `raytrace.wgsl` over the tile
//! in 8x8 workgroups, copies the result into a staging buffer and blocks
//! until it can be mapped and read back.

use super::buffers::{GpuParams, SceneBuffers};
use super::{DeviceError, TileDevice};
use crate::bucket::Bucket;
use crate::renderer::RenderConfig;
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 8;

pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    output_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    header: GpuParams,
    config: RenderConfig,
    adapter_name: String,
}

impl GpuDevice {
    /// Open the default high-performance adapter and upload the scene.
    pub fn new(buffers: &SceneBuffers, config: &RenderConfig) -> Result<Self, DeviceError> {
        pollster::block_on(Self::new_async(buffers, config))
    }

    async fn new_async(buffers: &SceneBuffers, config: &RenderConfig) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Compute adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lumen Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| DeviceError::RequestDevice(e.to_string()))?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raytrace Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("raytrace.wgsl").into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Raytrace Pipeline"),
            layout: None,
            module: &shader,
            entry_point: "main",
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = device.pop_error_scope().await {
            return Err(DeviceError::Shader(err.to_string()));
        }

        let storage = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::STORAGE,
            })
        };
        let material_buffer = storage("Material Buffer", bytemuck::cast_slice(&buffers.materials));
        let light_buffer = storage("Light Buffer", bytemuck::cast_slice(&buffers.lights));
        let sphere_buffer = storage("Sphere Buffer", bytemuck::cast_slice(&buffers.spheres));
        let plane_buffer = storage("Plane Buffer", bytemuck::cast_slice(&buffers.planes));
        let cylinder_buffer = storage("Cylinder Buffer", bytemuck::cast_slice(&buffers.cylinders));

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Params Buffer"),
            contents: bytemuck::cast_slice(&[buffers.header]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Large enough for a full tile; edge tiles use a prefix
        let tile = config.tile_size.max(1) as u64;
        let output_size = tile * tile * std::mem::size_of::<u32>() as u64;
        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tile Output Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tile Staging Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raytrace Bind Group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: sphere_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: plane_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: cylinder_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "Uploaded {} materials, {} lights, {} objects",
            buffers.header.num_materials,
            buffers.header.num_lights,
            buffers.header.num_spheres + buffers.header.num_planes + buffers.header.num_cylinders
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            params_buffer,
            output_buffer,
            staging_buffer,
            header: buffers.header,
            config: *config,
            adapter_name: info.name,
        })
    }

    fn read_back(&self, bytes: u64) -> Result<Vec<u32>, DeviceError> {
        let slice = self.staging_buffer.slice(..bytes);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| DeviceError::Map(e.to_string()))?
            .map_err(|e| DeviceError::Map(e.to_string()))?;

        let pixels = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, u32>(&data).to_vec()
        };
        self.staging_buffer.unmap();
        Ok(pixels)
    }
}

impl TileDevice for GpuDevice {
    fn name(&self) -> String {
        format!("gpu ({})", self.adapter_name)
    }

    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn render_tile(&mut self, bucket: &Bucket) -> Result<Vec<u32>, DeviceError> {
        let tile = self.config.tile_size.max(1);
        if !bucket.fits(self.config.width, self.config.height)
            || bucket.width > tile
            || bucket.height > tile
        {
            return Err(DeviceError::TileOutOfBounds {
                index: bucket.index,
                x: bucket.x,
                y: bucket.y,
                width: bucket.width,
                height: bucket.height,
            });
        }
        if bucket.pixel_count() == 0 {
            return Ok(Vec::new());
        }

        let params = self.header.for_tile(&self.config, bucket);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Raytrace Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Raytrace Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(
                bucket.width.div_ceil(WORKGROUP_SIZE),
                bucket.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }

        let bytes = bucket.pixel_count() as u64 * std::mem::size_of::<u32>() as u64;
        encoder.copy_buffer_to_buffer(&self.output_buffer, 0, &self.staging_buffer, 0, bytes);
        self.queue.submit(Some(encoder.finish()));

        self.read_back(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{render, render_tiled};
    use lumen_core::{Camera, Cylinder, Light, Material, MaterialKind, Plane, Scene, Sphere};
    use lumen_math::{pixel_to_rgb, Color, Vec3};

    /// Every material kind and primitive, lit, with mirrors and glass.
    fn traced_scene() -> Scene {
        let mut scene = Scene::new("gpu-traced");
        scene.camera = Camera {
            position: Vec3::new(0.0, 1.5, -7.0),
            rotation: -0.15,
            field_of_view: 60.0,
        };
        scene.skybox_material_id =
            scene.add_material(Material::diffuse(Color::new(0.3, 0.4, 0.7)));
        let floor = scene.add_material(Material::pattern(
            MaterialKind::Checkerboard,
            Color::splat(0.9),
            Color::splat(0.1),
            1.3,
        ));
        let mirror = scene.add_material(
            Material::diffuse(Color::splat(0.1))
                .with_specular(Color::ONE, 50.0)
                .with_reflection(0.7),
        );
        let glass = scene.add_material(
            Material::default()
                .with_specular(Color::splat(0.6), 80.0)
                .with_refraction(0.9, 1.5),
        );
        let wood = scene.add_material(
            Material::pattern(
                MaterialKind::Wood,
                Color::new(0.6, 0.4, 0.2),
                Color::new(0.3, 0.2, 0.1),
                0.3,
            )
            .with_offset(Vec3::new(2.0, 0.0, 1.0)),
        );
        let rings = scene.add_material(Material::pattern(
            MaterialKind::Circles,
            Color::new(0.8, 0.1, 0.1),
            Color::ONE,
            0.25,
        ));

        scene.planes.push(Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, floor));
        scene.spheres.push(Sphere::new(Vec3::new(-1.2, 0.0, 2.0), 1.0, mirror));
        scene.spheres.push(Sphere::new(Vec3::new(0.8, -0.2, -0.5), 0.8, glass));
        scene.spheres.push(Sphere::new(Vec3::new(-2.5, -0.3, -0.5), 0.7, rings));
        scene.cylinders.push(Cylinder::new(
            Vec3::new(2.0, -1.0, 1.0),
            Vec3::new(2.0, 1.5, 1.0),
            0.5,
            wood,
        ));
        scene.lights.push(Light::new(Vec3::new(4.0, 8.0, -6.0), Color::splat(0.8)));
        scene.lights.push(Light::new(Vec3::new(-5.0, 4.0, -3.0), Color::new(0.3, 0.3, 0.4)));
        scene
    }

    fn open(scene: &Scene, config: &RenderConfig) -> Option<GpuDevice> {
        match GpuDevice::new(&SceneBuffers::from_scene(scene), config) {
            Ok(device) => Some(device),
            Err(DeviceError::NoAdapter) | Err(DeviceError::RequestDevice(_)) => {
                eprintln!("no compute adapter, skipping");
                None
            }
            Err(e) => panic!("device setup failed: {}", e),
        }
    }

    #[test]
    fn test_gpu_test_mode_matches_cpu() {
        let scene = Scene::new("gpu");
        let config = RenderConfig::default()
            .with_resolution(70, 45)
            .with_tile_size(32)
            .with_test_mode(true);
        let Some(mut device) = open(&scene, &config) else {
            return;
        };

        let tiled = render_tiled(&config, &mut device).unwrap();
        assert_eq!(tiled, render(&scene, &config));
    }

    #[test]
    fn test_gpu_traced_frame_matches_cpu() {
        let scene = traced_scene();
        let config = RenderConfig::default()
            .with_resolution(96, 64)
            .with_aa_level(2)
            .with_tile_size(32);
        let Some(mut device) = open(&scene, &config) else {
            return;
        };

        let gpu = render_tiled(&config, &mut device).unwrap().framebuffer;
        let cpu = render(&scene, &config).framebuffer;

        // Float differences can flip a grazing silhouette or pattern-edge
        // sample, so a few pixels may differ by more than rounding.
        let off = cpu
            .pixels
            .iter()
            .zip(&gpu.pixels)
            .filter(|&(&c, &g)| {
                pixel_to_rgb(c)
                    .iter()
                    .zip(pixel_to_rgb(g))
                    .any(|(&a, b)| a.abs_diff(b) > 2)
            })
            .count();
        assert!(
            off * 100 <= cpu.pixels.len(),
            "{} of {} pixels differ by more than 2",
            off,
            cpu.pixels.len()
        );
    }

    #[test]
    fn test_gpu_rejects_oversized_bucket() {
        let scene = Scene::new("gpu");
        let config = RenderConfig::default().with_resolution(64, 64).with_tile_size(16);
        let Some(mut device) = open(&scene, &config) else {
            return;
        };

        let err = device.render_tile(&Bucket::new(0, 0, 32, 32, 0)).unwrap_err();
        assert!(matches!(err, DeviceError::TileOutOfBounds { .. }));
    }
}
