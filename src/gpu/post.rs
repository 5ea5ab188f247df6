//! The three stages of a frame: scene render, bloom and output composite.

use wgpu::util::DeviceExt;

use crate::gpu::pipelines::Pipelines;
use crate::gpu::texture::RenderTarget;
use crate::scene::backend::PassStage;
use crate::scene::dispose::Disposable;
use crate::scene::params::BloomParams;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FilterUniform {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    _padding: f32,
    pub direction: [f32; 2],
    pub texel: [f32; 2],
}

fn filter_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[FilterUniform::default()]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

#[derive(Debug)]
pub struct ScenePass {
    pub color: RenderTarget,
    pub depth: RenderTarget,
    pub clear: wgpu::Color,
}

/// Bright-pass into `ping`, then a separable blur `ping -> pong -> ping`.
#[derive(Debug)]
pub struct BloomPass {
    pub params: BloomParams,
    pub ping: RenderTarget,
    pub pong: RenderTarget,
    bright: wgpu::Buffer,
    horizontal: wgpu::Buffer,
    vertical: wgpu::Buffer,
}

#[derive(Debug)]
pub struct OutputPass {
    uniform: wgpu::Buffer,
}

#[derive(Debug)]
pub enum GpuPass {
    Scene(ScenePass),
    Bloom(BloomPass),
    Output(OutputPass),
}

fn bloom_size((width, height): (u32, u32)) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

impl GpuPass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, stage: &PassStage, render_size: (u32, u32)) -> Self {
        match stage {
            PassStage::Scene { background: [r, g, b] } => GpuPass::Scene(ScenePass {
                color: RenderTarget::color(device, render_size, "scene_color"),
                depth: RenderTarget::depth(device, render_size, "scene_depth"),
                clear: wgpu::Color {
                    r: *r as f64,
                    g: *g as f64,
                    b: *b as f64,
                    a: 1.0,
                },
            }),
            PassStage::Bloom(params) => {
                let size = bloom_size(render_size);
                let bloom = BloomPass {
                    params: params.clone(),
                    ping: RenderTarget::color(device, size, "bloom_ping"),
                    pong: RenderTarget::color(device, size, "bloom_pong"),
                    bright: filter_buffer(device, "Bloom Bright Buffer"),
                    horizontal: filter_buffer(device, "Bloom Horizontal Buffer"),
                    vertical: filter_buffer(device, "Bloom Vertical Buffer"),
                };
                bloom.write_uniforms(queue);
                GpuPass::Bloom(bloom)
            }
            PassStage::Output => GpuPass::Output(OutputPass {
                uniform: filter_buffer(device, "Output Buffer"),
            }),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, render_size: (u32, u32)) {
        match self {
            GpuPass::Scene(scene) => {
                scene.color.destroy();
                scene.depth.destroy();
                scene.color = RenderTarget::color(device, render_size, "scene_color");
                scene.depth = RenderTarget::depth(device, render_size, "scene_depth");
            }
            GpuPass::Bloom(bloom) => {
                let size = bloom_size(render_size);
                bloom.ping.destroy();
                bloom.pong.destroy();
                bloom.ping = RenderTarget::color(device, size, "bloom_ping");
                bloom.pong = RenderTarget::color(device, size, "bloom_pong");
                bloom.write_uniforms(queue);
            }
            GpuPass::Output(_) => {}
        }
    }

    pub fn as_scene(&self) -> Option<&ScenePass> {
        match self {
            GpuPass::Scene(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn as_bloom(&self) -> Option<&BloomPass> {
        match self {
            GpuPass::Bloom(bloom) => Some(bloom),
            _ => None,
        }
    }

    pub fn as_output(&self) -> Option<&OutputPass> {
        match self {
            GpuPass::Output(output) => Some(output),
            _ => None,
        }
    }
}

impl Disposable for GpuPass {
    fn dispose(&mut self) {
        match self {
            GpuPass::Scene(scene) => {
                scene.color.destroy();
                scene.depth.destroy();
            }
            GpuPass::Bloom(bloom) => {
                bloom.ping.destroy();
                bloom.pong.destroy();
                bloom.bright.destroy();
                bloom.horizontal.destroy();
                bloom.vertical.destroy();
            }
            GpuPass::Output(output) => output.uniform.destroy(),
        }
    }
}

/// Runs a fullscreen filter from `source` into `target`.
fn filter(
    encoder: &mut wgpu::CommandEncoder,
    device: &wgpu::Device,
    pipeline: &wgpu::RenderPipeline,
    layout: &wgpu::BindGroupLayout,
    entries: &[wgpu::BindGroupEntry],
    target: &wgpu::TextureView,
    label: &str,
) {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries,
        label: Some(label),
    });
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.draw(0..3, 0..1);
}

fn source_entries<'a>(
    source: &'a wgpu::TextureView,
    sampler: &'a wgpu::Sampler,
    uniform: &'a wgpu::Buffer,
) -> [wgpu::BindGroupEntry<'a>; 3] {
    [
        wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(source),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        },
        wgpu::BindGroupEntry {
            binding: 2,
            resource: uniform.as_entire_binding(),
        },
    ]
}

impl BloomPass {
    fn write_uniforms(&self, queue: &wgpu::Queue) {
        let texel = [1.0 / self.ping.size.0 as f32, 1.0 / self.ping.size.1 as f32];
        let base = FilterUniform {
            threshold: self.params.threshold,
            strength: self.params.strength,
            radius: self.params.radius,
            texel,
            ..Default::default()
        };
        queue.write_buffer(&self.bright, 0, bytemuck::cast_slice(&[base]));
        let horizontal = FilterUniform {
            direction: [1.0, 0.0],
            ..base
        };
        queue.write_buffer(&self.horizontal, 0, bytemuck::cast_slice(&[horizontal]));
        let vertical = FilterUniform {
            direction: [0.0, 1.0],
            ..base
        };
        queue.write_buffer(&self.vertical, 0, bytemuck::cast_slice(&[vertical]));
    }

    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        pipelines: &Pipelines,
        scene: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) {
        let layout = &pipelines.filter_layout;
        filter(
            encoder,
            device,
            &pipelines.bright,
            layout,
            &source_entries(scene, sampler, &self.bright),
            &self.ping.view,
            "Bloom Bright Pass",
        );
        filter(
            encoder,
            device,
            &pipelines.blur,
            layout,
            &source_entries(&self.ping.view, sampler, &self.horizontal),
            &self.pong.view,
            "Bloom Horizontal Blur",
        );
        filter(
            encoder,
            device,
            &pipelines.blur,
            layout,
            &source_entries(&self.pong.view, sampler, &self.vertical),
            &self.ping.view,
            "Bloom Vertical Blur",
        );
    }

    /// Final blurred highlights.
    pub fn result(&self) -> &wgpu::TextureView {
        &self.ping.view
    }
}

impl OutputPass {
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
        scene: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
        strength: f32,
        sampler: &wgpu::Sampler,
        target: &wgpu::TextureView,
    ) {
        let uniform = FilterUniform {
            strength,
            ..Default::default()
        };
        queue.write_buffer(&self.uniform, 0, bytemuck::cast_slice(&[uniform]));
        let [source, sampler, params] = source_entries(scene, sampler, &self.uniform);
        let entries = [
            source,
            sampler,
            params,
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(bloom),
            },
        ];
        filter(
            encoder,
            device,
            &pipelines.composite,
            &pipelines.composite_layout,
            &entries,
            target,
            "Output Composite Pass",
        );
    }
}
