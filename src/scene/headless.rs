//! A backend that draws nothing and remembers everything.
//!
//! Every handle reports its release to a shared [`Ledger`], which outlives
//! the backend so tests can inspect it after teardown.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::{anyhow, bail};

use crate::scene::backend::{Backend, DrawBatch, Globals, PassStage, Resources, Viewport};
use crate::scene::builder::MaterialDesc;
use crate::scene::dispose::Disposable;
use crate::scene::geometry::MeshData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Pass,
}

#[derive(Debug, Default)]
pub struct Ledger {
    next_id: u64,
    created: Vec<(ResourceKind, u64)>,
    released: HashSet<u64>,
    pub double_releases: usize,
    pub viewports: Vec<Viewport>,
    pub draws: usize,
    pub last_elapsed: Option<f32>,
    pub disposed: usize,
    pub detached: usize,
}

impl Ledger {
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.created.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn released(&self, kind: ResourceKind) -> usize {
        self.created
            .iter()
            .filter(|(k, id)| *k == kind && self.released.contains(id))
            .count()
    }

    pub fn total_created(&self) -> usize {
        self.created.len()
    }

    /// Handles created and not yet released.
    pub fn live(&self) -> usize {
        self.created.len() - self.released.len()
    }

    fn issue(&mut self, kind: ResourceKind) -> u64 {
        self.next_id += 1;
        self.created.push((kind, self.next_id));
        self.next_id
    }

    fn release(&mut self, id: u64) {
        if !self.released.insert(id) {
            self.double_releases += 1;
        }
    }
}

pub type SharedLedger = Rc<RefCell<Ledger>>;

#[derive(Debug)]
pub struct HeadlessHandle {
    pub id: u64,
    pub kind: ResourceKind,
    /// Target size, for passes.
    pub size: Option<(u32, u32)>,
    ledger: SharedLedger,
}

impl Disposable for HeadlessHandle {
    fn dispose(&mut self) {
        self.ledger.borrow_mut().release(self.id);
    }
}

#[derive(Debug)]
pub struct HeadlessBackend {
    viewport: Viewport,
    ledger: SharedLedger,
    /// Creation fails once this many handles exist.
    fail_after: Option<usize>,
}

impl HeadlessBackend {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ledger: SharedLedger::default(),
            fail_after: None,
        }
    }

    /// A backend whose resource creation fails after `count` successes.
    pub fn failing_after(viewport: Viewport, count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new(viewport)
        }
    }

    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    fn issue(&mut self, kind: ResourceKind, size: Option<(u32, u32)>) -> anyhow::Result<HeadlessHandle> {
        let mut ledger = self.ledger.borrow_mut();
        if let Some(limit) = self.fail_after {
            if ledger.total_created() >= limit {
                bail!("out of device memory creating {kind:?} #{}", ledger.total_created() + 1);
            }
        }
        let id = ledger.issue(kind);
        Ok(HeadlessHandle {
            id,
            kind,
            size,
            ledger: self.ledger.clone(),
        })
    }
}

impl Backend for HeadlessBackend {
    type Geometry = HeadlessHandle;
    type Material = HeadlessHandle;
    type Pass = HeadlessHandle;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_geometry(&mut self, _mesh: &MeshData) -> anyhow::Result<HeadlessHandle> {
        self.issue(ResourceKind::Geometry, None)
    }

    fn create_material(&mut self, _material: &MaterialDesc) -> anyhow::Result<HeadlessHandle> {
        self.issue(ResourceKind::Material, None)
    }

    fn create_pass(&mut self, _stage: &PassStage) -> anyhow::Result<HeadlessHandle> {
        let size = self.viewport.render_size();
        self.issue(ResourceKind::Pass, Some(size))
    }

    fn resize(&mut self, viewport: Viewport, passes: &mut [HeadlessHandle]) {
        self.viewport = viewport;
        for pass in passes {
            pass.size = Some(viewport.render_size());
        }
        self.ledger.borrow_mut().viewports.push(viewport);
    }

    fn draw(&mut self, globals: &Globals, batches: &[DrawBatch], resources: &Resources<Self>) -> anyhow::Result<()> {
        for batch in batches {
            resources
                .geometries
                .get(batch.geometry)
                .ok_or_else(|| anyhow!("batch references missing geometry {}", batch.geometry))?;
            resources
                .materials
                .get(batch.material)
                .ok_or_else(|| anyhow!("batch references missing material {}", batch.material))?;
        }
        let mut ledger = self.ledger.borrow_mut();
        ledger.draws += 1;
        ledger.last_elapsed = Some(globals.elapsed());
        Ok(())
    }

    fn dispose(&mut self) {
        self.ledger.borrow_mut().disposed += 1;
    }

    fn detach(&mut self) {
        self.ledger.borrow_mut().detached += 1;
    }
}
