//! GPU copies of geometries and materials.

use wgpu::util::DeviceExt;

use crate::scene::builder::{MaterialDesc, MaterialKind};
use crate::scene::dispose::Disposable;
use crate::scene::geometry::MeshData;

#[derive(Debug)]
pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuGeometry {
    pub fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

impl Disposable for GpuGeometry {
    fn dispose(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    color: [f32; 4],
    accent: [f32; 4],
    /// x: emissive strength, y: kind
    params: [f32; 4],
}

impl From<&MaterialDesc> for MaterialUniform {
    fn from(material: &MaterialDesc) -> Self {
        let kind = match material.kind {
            MaterialKind::Lit => 0.0,
            MaterialKind::Grid => 1.0,
            MaterialKind::Emissive => 2.0,
        };
        let [r, g, b] = material.color;
        let [ar, ag, ab] = material.accent;
        Self {
            color: [r, g, b, 1.0],
            accent: [ar, ag, ab, 1.0],
            params: [material.emissive, kind, 0.0, 0.0],
        }
    }
}

#[derive(Debug)]
pub struct GpuMaterial {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, material: &MaterialDesc) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", material.label)),
            contents: bytemuck::cast_slice(&[MaterialUniform::from(material)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&material.label),
        });
        Self { buffer, bind_group }
    }
}

impl Disposable for GpuMaterial {
    fn dispose(&mut self) {
        self.buffer.destroy();
    }
}
