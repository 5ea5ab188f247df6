//! cyber-blog
//!
//! Front-end of a small blog with a procedurally generated neon city behind
//! the home page. The page logic is platform neutral: pages are state
//! machines that render HTML strings, and the [`app`] controller turns
//! navigation and API responses into commands for a driver to carry out. The
//! backdrop is a [`scene`] graph drawn through a [`scene::Backend`], with a
//! wgpu implementation in [`gpu`].
//!
//! High-level modules
//! - `api`: post data model and the REST client
//! - `app`: message/command controller with stale response filtering
//! - `config`: API URL, backdrop variant and editor switch
//! - `content`: SEO metadata derivation and text helpers
//! - `pages`: home, post and editor views plus the shared layout
//! - `router`: path to route mapping
//! - `scene`: scene construction, animation and resource lifetime
//! - `gpu`: wgpu backend (surface or offscreen)
//! - `flow`: native window driver
//! - `web`: browser driver (wasm only)
//!

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod gpu;
pub mod logging;
pub mod pages;
pub mod router;
pub mod scene;

#[cfg(not(target_arch = "wasm32"))]
pub mod flow;

#[cfg(target_arch = "wasm32")]
pub mod web;
