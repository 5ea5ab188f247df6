//! Native driver: shows the backdrop in a desktop window.
//!
//! The window plays the part of the page's scene container. Redraws are
//! requested continuously, so the animation runs at the display refresh rate
//! like `requestAnimationFrame` does in the browser.

use std::sync::Arc;

use anyhow::Context as _;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::gpu::WgpuBackend;
use crate::pages::layout::SITE_NAME;
use crate::scene::{SceneParams, SceneView, Viewport};

pub struct BackdropApp {
    async_runtime: tokio::runtime::Runtime,
    params: SceneParams,
    window: Option<Arc<Window>>,
    view: Option<SceneView<WgpuBackend>>,
}

impl BackdropApp {
    pub fn new(params: SceneParams) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new().context("starting the async runtime")?;
        Ok(Self {
            async_runtime,
            params,
            window: None,
            view: None,
        })
    }

    fn mount(&self, window: Arc<Window>) -> anyhow::Result<SceneView<WgpuBackend>> {
        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height, self.params.render_scale);
        let backend = self
            .async_runtime
            .block_on(WgpuBackend::with_surface(window, viewport))?;
        SceneView::mount(backend, &self.params)
    }

    fn unmount(&mut self) {
        if let Some(view) = self.view.take() {
            let report = view.unmount();
            log::debug!("{report:?}");
        }
    }
}

impl ApplicationHandler for BackdropApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title(format!("{SITE_NAME} · {:?}", self.params.variant));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        match self.mount(window.clone()) {
            Ok(view) => self.view = Some(view),
            Err(e) => {
                log::error!("Unable to mount the scene: {e:#}");
                event_loop.exit();
                return;
            }
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(view) = &mut self.view {
                    view.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(view) = &mut self.view {
                    if let Err(e) = view.tick() {
                        log::error!("Unable to render {e:#}");
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unmount();
    }
}

/// Opens a window and animates the backdrop until it is closed.
pub fn run(params: SceneParams) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = BackdropApp::new(params)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
