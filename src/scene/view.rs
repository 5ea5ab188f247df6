//! One mounted backdrop: the built scene, its backend and every resource
//! allocated for it.
//!
//! A `SceneView` is the single owner of the mount's graphics resources.
//! Teardown runs once, either from [`SceneView::unmount`] or from `Drop`,
//! and covers construction that failed half way as well.

use anyhow::{Context, anyhow, bail};
use cgmath::Deg;

use crate::scene::animation::{self, Clock};
use crate::scene::backend::{self, Backend, Globals, PassStage, ReleaseCounts, Resources, Viewport};
use crate::scene::builder::{self, SceneDescriptor};
use crate::scene::camera::Projection;
use crate::scene::params::SceneParams;

/// What a teardown released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeardownReport {
    pub released: ReleaseCounts,
    pub frames: u64,
}

pub struct SceneView<B: Backend> {
    backend: Option<B>,
    resources: Resources<B>,
    scene: SceneDescriptor,
    projection: Projection,
    clock: Clock,
    elapsed: f32,
    frames: u64,
}

impl<B: Backend> SceneView<B> {
    /// Builds a fresh scene for `params` and uploads it to `backend`.
    pub fn mount(mut backend: B, params: &SceneParams) -> anyhow::Result<Self> {
        let scene = match builder::build(params) {
            Ok(scene) => scene,
            Err(e) => {
                backend.dispose();
                backend.detach();
                return Err(e.context("building the scene"));
            }
        };
        Self::mount_scene(backend, scene)
    }

    pub fn mount_scene(backend: B, scene: SceneDescriptor) -> anyhow::Result<Self> {
        let viewport = backend.viewport();
        let camera = &scene.params.camera;
        let projection = Projection::new(
            viewport.width,
            viewport.height,
            Deg(camera.fovy_deg),
            camera.znear,
            camera.zfar,
        );
        let mut view = Self {
            backend: Some(backend),
            resources: Resources::new(),
            scene,
            projection,
            clock: Clock::start(),
            elapsed: 0.0,
            frames: 0,
        };
        // on error `view` is dropped here, which releases what was allocated
        if viewport.is_empty() {
            bail!("container has no size ({}x{})", viewport.width, viewport.height);
        }
        view.allocate().context("allocating scene resources")?;
        log::info!(
            "mounted {:?} scene at {}x{}: {} geometries, {} materials, {} passes",
            view.scene.params.variant,
            viewport.width,
            viewport.height,
            view.resources.geometries.len(),
            view.resources.materials.len(),
            view.resources.passes.len()
        );
        Ok(view)
    }

    fn allocate(&mut self) -> anyhow::Result<()> {
        let Self {
            backend,
            resources,
            scene,
            ..
        } = self;
        let backend = backend.as_mut().ok_or_else(|| anyhow!("scene view already torn down"))?;
        for mesh in &scene.geometries {
            let handle = backend
                .create_geometry(mesh)
                .with_context(|| format!("creating geometry {:?}", mesh.label))?;
            resources.geometries.push(handle);
        }
        for material in &scene.materials {
            let handle = backend
                .create_material(material)
                .with_context(|| format!("creating material {:?}", material.label))?;
            resources.materials.push(handle);
        }
        for stage in PassStage::chain(&scene.params) {
            let handle = backend
                .create_pass(&stage)
                .with_context(|| format!("creating pass {stage:?}"))?;
            resources.passes.push(handle);
        }
        Ok(())
    }

    /// Advances the animation to the mount clock and draws one frame.
    pub fn tick(&mut self) -> anyhow::Result<()> {
        let elapsed = self.clock.elapsed();
        self.frame(elapsed)
    }

    /// Draws the scene as it is `elapsed` seconds after mount. Time never
    /// runs backwards: an older timestamp redraws the latest pose.
    pub fn frame(&mut self, elapsed: f32) -> anyhow::Result<()> {
        self.elapsed = self.elapsed.max(elapsed);
        let camera = animation::advance(&mut self.scene, self.elapsed);
        let globals = Globals::new(&camera, &self.projection, &self.scene.lights, self.elapsed);
        let batches = backend::batch(&self.scene.nodes);
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| anyhow!("scene view already torn down"))?;
        backend.draw(&globals, &batches, &self.resources)?;
        self.frames += 1;
        log::trace!("frame {} at {:.3}s", self.frames, self.elapsed);
        Ok(())
    }

    /// Follows a new container size. Camera and render targets update
    /// together; a collapsed container is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height, self.scene.params.render_scale);
        if viewport.is_empty() {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        self.projection.resize(width, height);
        backend.resize(viewport, self.resources.passes.as_mut_slice());
    }

    pub fn camera_aspect(&self) -> f32 {
        self.projection.aspect
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.backend.as_ref().map(|b| b.viewport())
    }

    pub fn scene(&self) -> &SceneDescriptor {
        &self.scene
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_mounted(&self) -> bool {
        self.backend.is_some()
    }

    /// Releases every resource, disposes the backend and detaches its output.
    pub fn unmount(mut self) -> TeardownReport {
        self.teardown().unwrap_or(TeardownReport {
            released: ReleaseCounts::default(),
            frames: self.frames,
        })
    }

    fn teardown(&mut self) -> Option<TeardownReport> {
        let mut backend = self.backend.take()?;
        let released = self.resources.release_all();
        backend.dispose();
        backend.detach();
        let report = TeardownReport {
            released,
            frames: self.frames,
        };
        log::info!(
            "scene torn down after {} frames, released {} resources",
            report.frames,
            released.total()
        );
        Some(report)
    }
}

impl<B: Backend> Drop for SceneView<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
