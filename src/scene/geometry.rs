//! CPU-side meshes of the primitive shapes the city is made of.
//!
//! Every mesh is built around the origin at unit size; scene nodes scale and
//! place them through their [`Instance`](super::instance::Instance).

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

use crate::scene::path::ClosedPath;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub label: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn push(&mut self, position: Vector3<f32>, normal: Vector3<f32>) -> u32 {
        self.vertices.push(Vertex {
            position: position.into(),
            normal: normal.into(),
        });
        (self.vertices.len() - 1) as u32
    }

    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Unit cube centred on the origin, one flat normal per face.
pub fn cuboid() -> MeshData {
    let mut mesh = MeshData::new("cuboid");
    let faces = [
        (Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
        (-Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()),
        (Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
        (-Vector3::unit_y(), Vector3::unit_z(), Vector3::unit_x()),
        (Vector3::unit_z(), Vector3::unit_y(), Vector3::unit_x()),
        (-Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
    ];
    for (normal, u, v) in faces {
        let centre = normal * 0.5;
        let a = mesh.push(centre - u * 0.5 - v * 0.5, normal);
        let b = mesh.push(centre + u * 0.5 - v * 0.5, normal);
        let c = mesh.push(centre + u * 0.5 + v * 0.5, normal);
        let d = mesh.push(centre - u * 0.5 + v * 0.5, normal);
        mesh.quad(a, b, c, d);
    }
    mesh
}

/// Square of side `size` on the XZ plane, facing up.
pub fn plane(size: f32) -> MeshData {
    let mut mesh = MeshData::new("plane");
    let h = size * 0.5;
    let up = Vector3::unit_y();
    let a = mesh.push(Vector3::new(-h, 0.0, -h), up);
    let b = mesh.push(Vector3::new(-h, 0.0, h), up);
    let c = mesh.push(Vector3::new(h, 0.0, h), up);
    let d = mesh.push(Vector3::new(h, 0.0, -h), up);
    mesh.quad(a, b, c, d);
    mesh
}

/// Open cylinder of radius 1 and height 1 along Y, centred on the origin.
pub fn cylinder(radial_segments: u32) -> MeshData {
    let mut mesh = MeshData::new("cylinder");
    let segments = radial_segments.max(3);
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let normal = Vector3::new(angle.cos(), 0.0, angle.sin());
        mesh.push(normal + Vector3::new(0.0, -0.5, 0.0), normal);
        mesh.push(normal + Vector3::new(0.0, 0.5, 0.0), normal);
    }
    for i in 0..segments {
        let base = i * 2;
        mesh.quad(base, base + 2, base + 3, base + 1);
    }
    mesh
}

/// Tube of `radius` following a closed path.
pub fn tube(
    path: &ClosedPath,
    tubular_segments: u32,
    radius: f32,
    radial_segments: u32,
) -> MeshData {
    let mut mesh = MeshData::new("tube");
    let rings = tubular_segments.max(3);
    let sides = radial_segments.max(3);
    for ring in 0..rings {
        let u = ring as f32 / rings as f32;
        let centre = path.point_at(u);
        let tangent = path.tangent_at(u);
        let mut side = tangent.cross(Vector3::unit_y());
        if side.magnitude2() < 1e-6 {
            side = tangent.cross(Vector3::unit_x());
        }
        let side = side.normalize();
        let lift = side.cross(tangent).normalize();
        for s in 0..sides {
            let angle = s as f32 / sides as f32 * TAU;
            let normal = side * angle.cos() + lift * angle.sin();
            mesh.push(centre + normal * radius, normal);
        }
    }
    for ring in 0..rings {
        let next_ring = (ring + 1) % rings;
        for s in 0..sides {
            let next_side = (s + 1) % sides;
            mesh.quad(
                ring * sides + s,
                next_ring * sides + s,
                next_ring * sides + next_side,
                ring * sides + next_side,
            );
        }
    }
    mesh
}

/// Octahedron of radius 1 with flat faces; the drone hull.
pub fn octahedron() -> MeshData {
    let mut mesh = MeshData::new("octahedron");
    let tips = [
        Vector3::unit_x(),
        Vector3::unit_z(),
        -Vector3::unit_x(),
        -Vector3::unit_z(),
    ];
    for pole in [Vector3::unit_y(), -Vector3::unit_y()] {
        for i in 0..tips.len() {
            let a = tips[i];
            let b = tips[(i + 1) % tips.len()];
            let normal = (a + b + pole).normalize();
            let first = mesh.push(a, normal);
            mesh.push(b, normal);
            mesh.push(pole, normal);
            mesh.indices.extend_from_slice(&[first, first + 1, first + 2]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_six_faces() {
        let mesh = cuboid();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| c.abs() <= 0.5 + 1e-6));
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        let path = ClosedPath::new(vec![
            Vector3::new(5.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 5.0),
            Vector3::new(-5.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, -5.0),
        ])
        .unwrap();
        for mesh in [cuboid(), plane(4.0), cylinder(12), tube(&path, 64, 0.2, 8), octahedron()] {
            let count = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < count), "{}", mesh.label);
            assert_eq!(mesh.indices.len() % 3, 0, "{}", mesh.label);
        }
    }

    #[test]
    fn tube_surrounds_the_path() {
        let path = ClosedPath::new(vec![
            Vector3::new(5.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 5.0),
            Vector3::new(-5.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, -5.0),
        ])
        .unwrap();
        let mesh = tube(&path, 16, 0.5, 6);
        assert_eq!(mesh.vertices.len(), 16 * 6);
        let centre = path.point_at(0.0);
        for v in &mesh.vertices[..6] {
            let offset = Vector3::from(v.position) - centre;
            assert!((offset.magnitude() - 0.5).abs() < 1e-4);
        }
    }
}
