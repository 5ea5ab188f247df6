//! Shows the backdrop in a window, configured like the web build
//! (`BLOG_SCENE=pixel|neon`).

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use cyber_blog::{config::Config, flow, logging, scene::SceneParams};

    logging::init();
    let config = Config::from_env();
    log::info!("Showing the {:?} backdrop", config.scene);
    flow::run(SceneParams::for_variant(config.scene))
}

#[cfg(target_arch = "wasm32")]
fn main() {}
