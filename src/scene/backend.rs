//! The seam between the scene view and whatever draws it.
//!
//! A [`Backend`] turns descriptors into its own resource handles and draws
//! batches of instances with them. [`SceneView`](super::view::SceneView) owns
//! those handles in [`Resources`] pools and decides when they are released.

use std::collections::HashMap;

use cgmath::EuclideanSpace;

use crate::scene::builder::{MaterialDesc, Node};
use crate::scene::camera::{Camera, Projection};
use crate::scene::dispose::{Disposable, ResourcePool};
use crate::scene::geometry::MeshData;
use crate::scene::instance::InstanceRaw;
use crate::scene::params::{BloomParams, LightParams, SceneParams};

/// Container size in physical pixels plus the factor the scene renders at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub render_scale: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, render_scale: f32) -> Self {
        Self {
            width,
            height,
            render_scale,
        }
    }

    /// Device-pixel size of a container measured in CSS pixels.
    pub fn from_css(css_width: i32, css_height: i32, device_pixel_ratio: f64, render_scale: f32) -> Self {
        let ratio = if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        let scale = |css: i32| (css.max(0) as f64 * ratio).round() as u32;
        Self::new(scale(css_width), scale(css_height), render_scale)
    }

    /// Shrinks the viewport, keeping its aspect ratio, until neither side
    /// exceeds `max_dimension`.
    pub fn clamped(self, max_dimension: u32) -> Self {
        let longest = self.width.max(self.height);
        if max_dimension == 0 || longest <= max_dimension {
            return self;
        }
        let scale = max_dimension as f64 / longest as f64;
        let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dimension);
        Self {
            width: fit(self.width),
            height: fit(self.height),
            ..self
        }
    }

    /// Size of the offscreen scene target, never below 1x1.
    pub fn render_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.render_scale).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One stage of the frame: the scene render, optional bloom, and the final
/// copy to the output.
#[derive(Clone, Debug, PartialEq)]
pub enum PassStage {
    Scene { background: [f32; 3] },
    Bloom(BloomParams),
    Output,
}

impl PassStage {
    pub fn chain(params: &SceneParams) -> Vec<PassStage> {
        let mut stages = vec![PassStage::Scene {
            background: params.background,
        }];
        if let Some(bloom) = &params.bloom {
            stages.push(PassStage::Bloom(bloom.clone()));
        }
        stages.push(PassStage::Output);
        stages
    }
}

/// Per-frame uniform shared by every shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    /// Direction the light travels, normalized.
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    /// x: elapsed seconds.
    pub time: [f32; 4],
}

impl Globals {
    pub fn new(camera: &Camera, projection: &Projection, lights: &LightParams, elapsed: f32) -> Self {
        use cgmath::InnerSpace;
        let view_proj = projection.calc_matrix() * camera.view_matrix();
        let light = cgmath::Vector3::from(lights.directional_position);
        let direction = if light.magnitude2() > 0.0 {
            -light.normalize()
        } else {
            -cgmath::Vector3::unit_y()
        };
        Self {
            view_proj: view_proj.into(),
            camera_position: camera.position.to_vec().extend(1.0).into(),
            ambient: rgba(lights.ambient),
            light_direction: direction.extend(0.0).into(),
            light_color: rgba(lights.directional_color),
            time: [elapsed, 0.0, 0.0, 0.0],
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.time[0]
    }
}

fn rgba([r, g, b]: [f32; 3]) -> [f32; 4] {
    [r, g, b, 1.0]
}

/// All instances sharing one geometry and one material.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch {
    pub geometry: usize,
    pub material: usize,
    pub instances: Vec<InstanceRaw>,
}

/// Groups nodes into batches, keeping the order in which pairs first appear.
pub fn batch(nodes: &[Node]) -> Vec<DrawBatch> {
    let mut batches: Vec<DrawBatch> = Vec::new();
    let mut index: HashMap<(usize, usize), usize> = HashMap::new();
    for node in nodes {
        let key = (node.geometry, node.material);
        let slot = *index.entry(key).or_insert_with(|| {
            batches.push(DrawBatch {
                geometry: node.geometry,
                material: node.material,
                instances: Vec::new(),
            });
            batches.len() - 1
        });
        batches[slot].instances.push(node.transform.to_raw());
    }
    batches
}

/// Resource handles of one mount.
pub struct Resources<B: Backend + ?Sized> {
    pub geometries: ResourcePool<B::Geometry>,
    pub materials: ResourcePool<B::Material>,
    pub passes: ResourcePool<B::Pass>,
}

/// How many handles a teardown released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseCounts {
    pub geometries: usize,
    pub materials: usize,
    pub passes: usize,
}

impl ReleaseCounts {
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.passes
    }
}

impl<B: Backend + ?Sized> Resources<B> {
    pub fn new() -> Self {
        Self {
            geometries: ResourcePool::new(),
            materials: ResourcePool::new(),
            passes: ResourcePool::new(),
        }
    }

    pub fn release_all(&mut self) -> ReleaseCounts {
        ReleaseCounts {
            passes: self.passes.release_all(),
            materials: self.materials.release_all(),
            geometries: self.geometries.release_all(),
        }
    }
}

impl<B: Backend + ?Sized> Default for Resources<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// A graphics implementation the scene view can drive.
pub trait Backend {
    type Geometry: Disposable;
    type Material: Disposable;
    type Pass: Disposable;

    /// Current container size, as the backend's output sees it.
    fn viewport(&self) -> Viewport;

    fn create_geometry(&mut self, mesh: &MeshData) -> anyhow::Result<Self::Geometry>;

    fn create_material(&mut self, material: &MaterialDesc) -> anyhow::Result<Self::Material>;

    fn create_pass(&mut self, stage: &PassStage) -> anyhow::Result<Self::Pass>;

    /// Resizes the output and every pass target.
    fn resize(&mut self, viewport: Viewport, passes: &mut [Self::Pass]);

    /// Renders one frame through the pass chain.
    fn draw(&mut self, globals: &Globals, batches: &[DrawBatch], resources: &Resources<Self>) -> anyhow::Result<()>;

    /// Frees backend-wide state such as shared buffers and pipelines.
    fn dispose(&mut self);

    /// Removes the output surface from its container.
    fn detach(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::builder::NodeKind;
    use crate::scene::instance::Instance;

    fn node(geometry: usize, material: usize, x: f32) -> Node {
        Node {
            kind: NodeKind::Building,
            geometry,
            material,
            transform: Instance::at([x, 0.0, 0.0]),
        }
    }

    #[test]
    fn batches_group_by_geometry_and_material() {
        let nodes = vec![node(0, 0, 1.0), node(0, 1, 2.0), node(0, 0, 3.0), node(1, 2, 4.0)];
        let batches = batch(&nodes);
        assert_eq!(batches.len(), 3);
        assert_eq!((batches[0].geometry, batches[0].material), (0, 0));
        assert_eq!(batches[0].instances.len(), 2);
        assert_eq!(batches[0].instances[1].translation(), [3.0, 0.0, 0.0]);
        assert_eq!((batches[2].geometry, batches[2].material), (1, 2));
    }

    #[test]
    fn render_size_applies_scale() {
        assert_eq!(Viewport::new(800, 600, 0.5).render_size(), (400, 300));
        assert_eq!(Viewport::new(1, 1, 0.5).render_size(), (1, 1));
        assert!(Viewport::new(0, 600, 1.0).is_empty());
    }

    #[test]
    fn css_size_is_scaled_by_the_pixel_ratio() {
        assert_eq!(Viewport::from_css(1440, 384, 2.0, 1.0), Viewport::new(2880, 768, 1.0));
        assert_eq!(Viewport::from_css(-5, 100, 1.5, 0.5), Viewport::new(0, 150, 0.5));
        assert_eq!(Viewport::from_css(300, 200, 0.0, 1.0), Viewport::new(300, 200, 1.0));
    }

    #[test]
    fn clamping_keeps_the_aspect_ratio() {
        let clamped = Viewport::new(2880, 768, 1.0).clamped(2048);
        assert_eq!((clamped.width, clamped.height), (2048, 546));

        let tall = Viewport::new(1000, 5000, 0.5).clamped(2048);
        assert_eq!((tall.width, tall.height), (410, 2048));
        assert_eq!(tall.render_scale, 0.5);

        let small = Viewport::new(640, 480, 1.0);
        assert_eq!(small.clamped(2048), small);
        assert_eq!(Viewport::new(9000, 1, 1.0).clamped(2048).height, 1);
    }

    #[test]
    fn bloom_only_in_the_neon_chain() {
        assert_eq!(PassStage::chain(&SceneParams::pixel()).len(), 2);
        let neon = PassStage::chain(&SceneParams::neon());
        assert_eq!(neon.len(), 3);
        assert!(matches!(neon[1], PassStage::Bloom(_)));
        assert_eq!(neon[2], PassStage::Output);
    }
}
