//! The procedurally generated city behind the home page.
//!
//! [`builder`] turns [`SceneParams`] into a [`SceneDescriptor`], [`animation`]
//! poses it over time and [`SceneView`] drives a [`Backend`] with it, owning
//! every resource the backend hands out until teardown.

pub mod animation;
pub mod backend;
pub mod builder;
pub mod camera;
pub mod dispose;
pub mod geometry;
pub mod headless;
pub mod instance;
pub mod params;
pub mod path;
pub mod view;

pub use backend::{Backend, PassStage, Viewport};
pub use builder::{SceneDescriptor, build};
pub use dispose::{Disposable, ResourcePool};
pub use headless::HeadlessBackend;
pub use params::{SceneParams, SceneVariant};
pub use view::{SceneView, TeardownReport};
