//! Procedural construction of the city.
//!
//! The builder only produces descriptors: meshes, materials and the nodes
//! that reference them by index. Nothing here touches the GPU, so the same
//! descriptor feeds the wgpu backend and the headless one.

use std::f32::consts::TAU;

use anyhow::{Context, ensure};
use cgmath::{InnerSpace, Quaternion, Rotation, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::scene::geometry::{self, MeshData};
use crate::scene::instance::Instance;
use crate::scene::params::{LightParams, SceneParams, TrackParams};
use crate::scene::path::ClosedPath;

const CYLINDER_SEGMENTS: u32 = 10;
const TUBE_SEGMENTS: u32 = 160;
const TUBE_SIDES: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    /// Phong-lit surface.
    Lit,
    /// Unlit glowing grid lines over a dark base.
    Grid,
    /// Unlit, full-brightness colour.
    Emissive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub label: String,
    pub color: [f32; 3],
    /// Window glow on lit surfaces, line colour on grids.
    pub accent: [f32; 3],
    /// Self-illumination added on top of lighting, 0 for none.
    pub emissive: f32,
    pub kind: MaterialKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Building,
    Ground,
    Pipe,
    Track,
    Train,
    Drone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub geometry: usize,
    pub material: usize,
    pub transform: Instance,
}

/// Animation anchor of one drone.
#[derive(Clone, Debug, PartialEq)]
pub struct DroneRig {
    pub node: usize,
    pub base: Vector3<f32>,
    /// Offset into the bobbing cycle, so the fleet does not move in lockstep.
    pub phase: f32,
}

/// Train riding the closed track.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainRig {
    pub node: usize,
    pub path: ClosedPath,
    pub speed: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescriptor {
    pub params: SceneParams,
    pub geometries: Vec<MeshData>,
    pub materials: Vec<MaterialDesc>,
    pub nodes: Vec<Node>,
    pub train: Option<TrainRig>,
    pub drones: Vec<DroneRig>,
    pub lights: LightParams,
}

impl SceneDescriptor {
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    fn add_geometry(&mut self, mesh: MeshData) -> usize {
        self.geometries.push(mesh);
        self.geometries.len() - 1
    }

    fn add_material(&mut self, material: MaterialDesc) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    fn add_node(&mut self, kind: NodeKind, geometry: usize, material: usize, transform: Instance) -> usize {
        self.nodes.push(Node {
            kind,
            geometry,
            material,
            transform,
        });
        self.nodes.len() - 1
    }
}

/// Builds the scene with the generator `params.seed` asks for.
pub fn build(params: &SceneParams) -> anyhow::Result<SceneDescriptor> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    build_with(params, &mut rng)
}

pub fn build_with<R: Rng + ?Sized>(params: &SceneParams, rng: &mut R) -> anyhow::Result<SceneDescriptor> {
    let mut scene = SceneDescriptor {
        params: params.clone(),
        geometries: Vec::new(),
        materials: Vec::new(),
        nodes: Vec::new(),
        train: None,
        drones: Vec::new(),
        lights: params.lights.clone(),
    };

    let cuboid = scene.add_geometry(geometry::cuboid());

    if let Some(ground) = &params.ground {
        let plane = scene.add_geometry(geometry::plane(ground.size));
        let material = scene.add_material(MaterialDesc {
            label: "ground".into(),
            color: ground.color,
            accent: ground.grid_color,
            emissive: 0.0,
            kind: MaterialKind::Grid,
        });
        scene.add_node(NodeKind::Ground, plane, material, Instance::new());
    }

    let buildings = &params.buildings;
    ensure!(!buildings.palette.is_empty(), "building palette is empty");
    let palette: Vec<usize> = buildings
        .palette
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let emissive = between(rng, buildings.emissive);
            scene.add_material(MaterialDesc {
                label: format!("building-{i}"),
                color: *color,
                accent: *color,
                emissive,
                kind: MaterialKind::Lit,
            })
        })
        .collect();
    let mut footprints = Vec::with_capacity(buildings.count);
    for _ in 0..buildings.count {
        let width = between(rng, buildings.width);
        let height = between(rng, buildings.height);
        let x = between(rng, (-buildings.half_extent, buildings.half_extent));
        let z = between(rng, (-buildings.half_extent, buildings.half_extent));
        let material = palette[rng.gen_range(0..palette.len())];
        let transform = Instance::at([x, height / 2.0, z]).with_scale([width, height, width]);
        scene.add_node(NodeKind::Building, cuboid, material, transform);
        footprints.push((Vector3::new(x, 0.0, z), height));
    }

    if let Some(pipes) = &params.pipes {
        ensure!(!pipes.palette.is_empty(), "pipe palette is empty");
        let cylinder = scene.add_geometry(geometry::cylinder(CYLINDER_SEGMENTS));
        let materials: Vec<usize> = pipes
            .palette
            .iter()
            .enumerate()
            .map(|(i, color)| {
                scene.add_material(MaterialDesc {
                    label: format!("pipe-{i}"),
                    color: *color,
                    accent: *color,
                    emissive: 1.0,
                    kind: MaterialKind::Emissive,
                })
            })
            .collect();
        if footprints.len() >= 2 {
            for _ in 0..pipes.count {
                let (a, a_height) = footprints[rng.gen_range(0..footprints.len())];
                let (b, b_height) = footprints[rng.gen_range(0..footprints.len())];
                // a pipe hangs between two towers, below the shorter roof
                let ceiling = a_height.min(b_height).min(pipes.height.1);
                let y = between(rng, (pipes.height.0.min(ceiling), ceiling));
                let span = b - a;
                let length = span.magnitude();
                if length < 1e-3 {
                    continue;
                }
                let rotation = Quaternion::from_arc(Vector3::unit_y(), span / length, None);
                let centre = (a + b) * 0.5 + Vector3::new(0.0, y, 0.0);
                let transform = Instance::at(centre)
                    .with_rotation(rotation)
                    .with_scale([pipes.radius, length, pipes.radius]);
                let material = materials[rng.gen_range(0..materials.len())];
                scene.add_node(NodeKind::Pipe, cylinder, material, transform);
            }
        }
    }

    if let Some(track) = &params.track {
        let path = track_path(track, rng)?;
        let tube = scene.add_geometry(geometry::tube(&path, TUBE_SEGMENTS, track.tube_radius, TUBE_SIDES));
        let rail = scene.add_material(MaterialDesc {
            label: "track".into(),
            color: track.color,
            accent: track.color,
            emissive: 1.0,
            kind: MaterialKind::Emissive,
        });
        scene.add_node(NodeKind::Track, tube, rail, Instance::new());

        let body = scene.add_material(MaterialDesc {
            label: "train".into(),
            color: track.train_color,
            accent: track.train_color,
            emissive: 1.0,
            kind: MaterialKind::Emissive,
        });
        let start = Instance::at(path.point_at(0.0)).with_scale(track.train_size);
        let node = scene.add_node(NodeKind::Train, cuboid, body, start);
        scene.train = Some(TrainRig {
            node,
            path,
            speed: track.train_speed,
        });
    }

    if let Some(drones) = &params.drones {
        let hull = scene.add_geometry(geometry::octahedron());
        let material = scene.add_material(MaterialDesc {
            label: "drone".into(),
            color: drones.color,
            accent: drones.color,
            emissive: 1.0,
            kind: MaterialKind::Emissive,
        });
        for _ in 0..drones.count {
            let base = Vector3::new(
                between(rng, (-drones.half_extent, drones.half_extent)),
                between(rng, drones.altitude),
                between(rng, (-drones.half_extent, drones.half_extent)),
            );
            let phase = rng.gen_range(0.0..TAU);
            let transform = Instance::at(base).with_scale([drones.size; 3]);
            let node = scene.add_node(NodeKind::Drone, hull, material, transform);
            scene.drones.push(DroneRig { node, base, phase });
        }
    }

    log::debug!(
        "built {:?} scene: {} nodes, {} geometries, {} materials",
        params.variant,
        scene.nodes.len(),
        scene.geometries.len(),
        scene.materials.len()
    );
    Ok(scene)
}

/// Jittered ring of control points around the origin.
fn track_path<R: Rng + ?Sized>(track: &TrackParams, rng: &mut R) -> anyhow::Result<ClosedPath> {
    let points = (0..track.control_points)
        .map(|i| {
            let angle = i as f32 / track.control_points as f32 * TAU;
            let radius = track.radius * (1.0 + between(rng, (-track.jitter, track.jitter)));
            Vector3::new(angle.cos() * radius, track.height, angle.sin() * radius)
        })
        .collect();
    ClosedPath::new(points).context("building the train track")
}

/// Uniform sample of `[lo, hi)`, or `lo` when the range is empty.
fn between<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::params::SceneVariant;

    #[test]
    fn pixel_scene_matches_the_voxel_city() {
        let scene = build(&SceneParams::pixel().with_seed(7)).unwrap();
        assert_eq!(scene.count(NodeKind::Building), 50);
        assert_eq!(scene.nodes.len(), 50);
        assert_eq!(scene.geometries.len(), 1);
        assert_eq!(scene.materials.len(), 1);
        assert!(scene.train.is_none());
        for node in &scene.nodes {
            let t = node.transform;
            assert!(t.position.x >= -5.0 && t.position.x < 5.0);
            assert!(t.position.z >= -5.0 && t.position.z < 5.0);
            assert!(t.scale.y >= 0.5 && t.scale.y < 2.5);
            // boxes stand on the ground
            assert!((t.position.y - t.scale.y / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn neon_scene_has_every_category() {
        let params = SceneParams::neon().with_seed(42);
        let scene = build(&params).unwrap();
        assert_eq!(scene.params.variant, SceneVariant::Neon);
        assert_eq!(scene.count(NodeKind::Building), params.buildings.count);
        assert_eq!(scene.count(NodeKind::Ground), 1);
        assert_eq!(scene.count(NodeKind::Track), 1);
        assert_eq!(scene.count(NodeKind::Train), 1);
        assert_eq!(scene.count(NodeKind::Drone), 10);
        assert_eq!(scene.drones.len(), 10);
        assert!(scene.count(NodeKind::Pipe) > 0);
        assert!(scene.count(NodeKind::Pipe) <= 18);
        let train = scene.train.as_ref().unwrap();
        assert_eq!(scene.nodes[train.node].kind, NodeKind::Train);
    }

    #[test]
    fn geometry_is_shared_between_buildings() {
        let scene = build(&SceneParams::neon().with_seed(1)).unwrap();
        let mut used: Vec<usize> = scene
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Building)
            .map(|n| n.geometry)
            .collect();
        used.dedup();
        assert_eq!(used.len(), 1);
        for node in &scene.nodes {
            assert!(node.geometry < scene.geometries.len());
            assert!(node.material < scene.materials.len());
        }
    }

    #[test]
    fn same_seed_same_scene() {
        let a = build(&SceneParams::neon().with_seed(99)).unwrap();
        let b = build(&SceneParams::neon().with_seed(99)).unwrap();
        assert_eq!(a, b);
        let c = build(&SceneParams::neon().with_seed(100)).unwrap();
        assert_ne!(a.nodes, c.nodes);
    }

    #[test]
    fn empty_palette_is_rejected() {
        let mut params = SceneParams::pixel();
        params.buildings.palette.clear();
        assert!(build(&params).is_err());
    }
}
