//! The wgpu implementation of [`Backend`].
//!
//! A frame renders the scene into an offscreen colour target at the
//! viewport's render size, optionally extracts and blurs its highlights, and
//! composites the result onto the output: a window or canvas surface, or a
//! readable texture when running offscreen.

pub mod context;
pub mod mesh;
pub mod pipelines;
pub mod post;
pub mod texture;

use std::iter;
use std::time::Duration;

use anyhow::{Context as _, anyhow, bail};
use wgpu::util::DeviceExt;

use crate::gpu::context::GpuContext;
use crate::gpu::mesh::{GpuGeometry, GpuMaterial};
use crate::gpu::pipelines::Pipelines;
use crate::gpu::post::GpuPass;
use crate::gpu::texture::RenderTarget;
use crate::scene::backend::{Backend, DrawBatch, Globals, PassStage, Resources, Viewport};
use crate::scene::builder::MaterialDesc;
use crate::scene::geometry::MeshData;
use crate::scene::instance::InstanceRaw;

const INITIAL_INSTANCE_CAPACITY: usize = 256;

enum Output {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen(RenderTarget),
    Detached,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    output: Output,
    viewport: Viewport,
    pipelines: Pipelines,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    black: RenderTarget,
    on_detach: Option<Box<dyn FnOnce()>>,
    disposed: bool,
}

impl WgpuBackend {
    /// Renders into a window or canvas.
    pub async fn with_surface(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> anyhow::Result<Self> {
        let instance = context::instance();
        let surface = instance.create_surface(target).context("creating surface")?;
        let gpu = GpuContext::new(&instance, Some(&surface)).await?;
        let viewport = gpu.fit(viewport);

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        // The shaders write linear colour and rely on an sRGB target to
        // encode it; other formats come out darker.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width.max(1),
            height: viewport.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        Ok(Self::assemble(gpu, Output::Surface { surface, config }, format, viewport))
    }

    /// Renders into a texture that [`read_pixels`](Self::read_pixels) can copy back.
    pub async fn offscreen(viewport: Viewport) -> anyhow::Result<Self> {
        let instance = context::instance();
        let gpu = GpuContext::new(&instance, None).await?;
        let viewport = gpu.fit(viewport);
        let format = RenderTarget::COLOR_FORMAT;
        let target = RenderTarget::readable(&gpu.device, (viewport.width, viewport.height), format, "offscreen_output");
        Ok(Self::assemble(gpu, Output::Offscreen(target), format, viewport))
    }

    fn assemble(gpu: GpuContext, output: Output, format: wgpu::TextureFormat, viewport: Viewport) -> Self {
        let device = &gpu.device;
        let pipelines = Pipelines::new(device, format);
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[<Globals as bytemuck::Zeroable>::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipelines.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });
        let instance_buffer = instance_buffer(device, INITIAL_INSTANCE_CAPACITY);
        let linear_sampler = texture::sampler(device, wgpu::FilterMode::Linear, "linear_sampler");
        let nearest_sampler = texture::sampler(device, wgpu::FilterMode::Nearest, "nearest_sampler");
        let black = RenderTarget::black(device, &gpu.queue);
        Self {
            output,
            viewport,
            pipelines,
            globals_buffer,
            globals_bind_group,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            linear_sampler,
            nearest_sampler,
            black,
            on_detach: None,
            disposed: false,
            gpu,
        }
    }

    /// Runs `hook` when the output is detached, e.g. to take the canvas out
    /// of the page.
    pub fn on_detach(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_detach = Some(Box::new(hook));
        self
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }

    fn reserve_instances(&mut self, count: usize) {
        if count <= self.instance_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.instance_buffer.destroy();
        self.instance_buffer = instance_buffer(&self.gpu.device, capacity);
        self.instance_capacity = capacity;
        log::debug!("grew instance buffer to {capacity} instances");
    }

    /// Copies the offscreen output back as tightly packed RGBA8 rows.
    pub async fn read_pixels(&self) -> anyhow::Result<Vec<u8>> {
        let Output::Offscreen(target) = &self.output else {
            bail!("only an offscreen backend can be read back");
        };
        let (width, height) = target.size;
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;
        let output_buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("Readback Buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            target.extent(),
        );
        self.gpu.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.gpu
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .context("waiting for the readback copy")?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow!("readback channel closed"))?
            .context("mapping the readback buffer")?;
        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded as usize)
                .flat_map(|row| &row[..unpadded as usize])
                .copied()
                .collect()
        };
        output_buffer.unmap();
        output_buffer.destroy();
        Ok(pixels)
    }
}

fn instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl Backend for WgpuBackend {
    type Geometry = GpuGeometry;
    type Material = GpuMaterial;
    type Pass = GpuPass;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_geometry(&mut self, mesh: &MeshData) -> anyhow::Result<GpuGeometry> {
        if mesh.indices.is_empty() {
            bail!("mesh {:?} has no triangles", mesh.label);
        }
        Ok(GpuGeometry::new(&self.gpu.device, mesh))
    }

    fn create_material(&mut self, material: &MaterialDesc) -> anyhow::Result<GpuMaterial> {
        Ok(GpuMaterial::new(
            &self.gpu.device,
            &self.pipelines.material_layout,
            material,
        ))
    }

    fn create_pass(&mut self, stage: &PassStage) -> anyhow::Result<GpuPass> {
        Ok(GpuPass::new(
            &self.gpu.device,
            &self.gpu.queue,
            stage,
            self.viewport.render_size(),
        ))
    }

    fn resize(&mut self, viewport: Viewport, passes: &mut [GpuPass]) {
        let viewport = self.gpu.fit(viewport);
        self.viewport = viewport;
        let device = &self.gpu.device;
        match &mut self.output {
            Output::Surface { surface, config } => {
                config.width = viewport.width.max(1);
                config.height = viewport.height.max(1);
                surface.configure(device, config);
            }
            Output::Offscreen(target) => {
                target.destroy();
                *target = RenderTarget::readable(device, (viewport.width, viewport.height), target.texture.format(), "offscreen_output");
            }
            Output::Detached => return,
        }
        let render_size = viewport.render_size();
        for pass in passes {
            pass.resize(device, &self.gpu.queue, render_size);
        }
        log::debug!(
            "resized output to {}x{}, render targets to {}x{}",
            viewport.width,
            viewport.height,
            render_size.0,
            render_size.1
        );
    }

    fn draw(&mut self, globals: &Globals, batches: &[DrawBatch], resources: &Resources<Self>) -> anyhow::Result<()> {
        if self.disposed {
            bail!("backend already disposed");
        }
        let passes = resources.passes.as_slice();
        let scene = passes
            .iter()
            .find_map(GpuPass::as_scene)
            .ok_or_else(|| anyhow!("pass chain has no scene stage"))?;
        let bloom = passes.iter().find_map(GpuPass::as_bloom);
        let output = passes
            .iter()
            .find_map(GpuPass::as_output)
            .ok_or_else(|| anyhow!("pass chain has no output stage"))?;

        let (target_view, frame) = match &self.output {
            Output::Surface { surface, config } => match surface.get_current_texture() {
                Ok(frame) => (
                    frame.texture.create_view(&wgpu::TextureViewDescriptor::default()),
                    Some(frame),
                ),
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.gpu.device, config);
                    return Ok(());
                }
                Err(e) => return Err(e).context("acquiring the next surface texture"),
            },
            Output::Offscreen(target) => (target.view.clone(), None),
            Output::Detached => bail!("output already detached"),
        };

        let instance_count: usize = batches.iter().map(|b| b.instances.len()).sum();
        self.reserve_instances(instance_count);
        let instances: Vec<InstanceRaw> = batches
            .iter()
            .flat_map(|b| b.instances.iter().copied())
            .collect();
        let queue = &self.gpu.queue;
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[*globals]));
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let device = &self.gpu.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &scene.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &scene.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipelines.scene);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            let stride = std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
            let mut first = 0usize;
            for batch in batches {
                let count = batch.instances.len();
                let geometry = resources
                    .geometries
                    .get(batch.geometry)
                    .ok_or_else(|| anyhow!("batch references missing geometry {}", batch.geometry))?;
                let material = resources
                    .materials
                    .get(batch.material)
                    .ok_or_else(|| anyhow!("batch references missing material {}", batch.material))?;
                let range = (first as wgpu::BufferAddress * stride)..((first + count) as wgpu::BufferAddress * stride);
                render_pass.set_bind_group(1, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(range));
                render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..geometry.index_count, 0, 0..count as u32);
                first += count;
            }
        }

        if let Some(bloom) = bloom {
            bloom.encode(&mut encoder, device, &self.pipelines, &scene.color.view, &self.linear_sampler);
        }
        // a reduced render scale is upscaled without smoothing
        let upscale = if self.viewport.render_scale < 1.0 {
            &self.nearest_sampler
        } else {
            &self.linear_sampler
        };
        output.encode(
            &mut encoder,
            device,
            queue,
            &self.pipelines,
            &scene.color.view,
            bloom.map_or(&self.black.view, |b| b.result()),
            bloom.map_or(0.0, |b| b.params.strength),
            upscale,
            &target_view,
        );

        queue.submit(iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.globals_buffer.destroy();
        self.instance_buffer.destroy();
        self.black.destroy();
        if let Output::Offscreen(target) = &self.output {
            target.destroy();
        }
        log::debug!("disposed wgpu backend");
    }

    fn detach(&mut self) {
        self.output = Output::Detached;
        if let Some(hook) = self.on_detach.take() {
            hook();
        }
    }
}
