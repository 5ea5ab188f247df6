//! Browser side of the backdrop: the canvas, the animation frame loop and
//! the resize observer around one [`SceneView`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::anyhow;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, HtmlCanvasElement, ResizeObserver, Window};

use crate::gpu::WgpuBackend;
use crate::scene::{Backend, SceneParams, SceneView, TeardownReport, Viewport};
use crate::web::dom;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn js_error(e: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow!("{e:?}")
}

/// Container size in device pixels.
fn container_viewport(window: &Window, container: &Element, render_scale: f32) -> Viewport {
    Viewport::from_css(
        container.client_width(),
        container.client_height(),
        window.device_pixel_ratio(),
        render_scale,
    )
}

/// Matches the canvas backing store to what the backend renders, which may
/// be smaller than the container on devices with a low texture limit.
fn fit_canvas(canvas: &HtmlCanvasElement, viewport: Viewport) {
    canvas.set_width(viewport.width.max(1));
    canvas.set_height(viewport.height.max(1));
}

pub struct SceneMount {
    window: Window,
    view: Rc<RefCell<Option<SceneView<WgpuBackend>>>>,
    pending_frame: Rc<Cell<Option<i32>>>,
    frame_callback: FrameCallback,
    resize_observer: Option<(ResizeObserver, Closure<dyn FnMut()>)>,
}

impl SceneMount {
    /// Creates a canvas inside `container`, mounts the scene on it and starts
    /// the frame loop.
    pub async fn mount(container: Element, params: SceneParams) -> anyhow::Result<Self> {
        let window = dom::window().map_err(js_error)?;
        let document = dom::document().map_err(js_error)?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| anyhow!("created element is not a canvas"))?;
        canvas
            .set_attribute("style", "display:block;width:100%;height:100%")
            .map_err(js_error)?;
        canvas
            .set_attribute("aria-label", "3D pixel art city visualization")
            .map_err(js_error)?;
        // measured after the canvas is in place, so the container has its layout size
        container.append_child(&canvas).map_err(js_error)?;
        let viewport = container_viewport(&window, &container, params.render_scale);
        if viewport.is_empty() {
            canvas.remove();
            return Err(anyhow!(
                "#{} has no size ({}x{})",
                dom::SCENE_ROOT_ID,
                viewport.width,
                viewport.height
            ));
        }

        let backend = match WgpuBackend::with_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()), viewport).await {
            Ok(backend) => {
                let canvas = canvas.clone();
                backend.on_detach(move || canvas.remove())
            }
            Err(e) => {
                canvas.remove();
                return Err(e);
            }
        };
        fit_canvas(&canvas, backend.viewport());
        // a failed mount detaches the canvas through the backend
        let view = Rc::new(RefCell::new(Some(SceneView::mount(backend, &params)?)));

        let on_resize = {
            let view = view.clone();
            let window = window.clone();
            let container = container.clone();
            let render_scale = params.render_scale;
            Closure::<dyn FnMut()>::new(move || {
                let viewport = container_viewport(&window, &container, render_scale);
                if viewport.is_empty() {
                    return;
                }
                if let Some(view) = view.borrow_mut().as_mut() {
                    view.resize(viewport.width, viewport.height);
                    if let Some(fitted) = view.viewport() {
                        fit_canvas(&canvas, fitted);
                    }
                }
            })
        };
        let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref()).map_err(js_error)?;
        observer.observe(&container);

        let mut mount = Self {
            window,
            view,
            pending_frame: Rc::new(Cell::new(None)),
            frame_callback: Rc::new(RefCell::new(None)),
            resize_observer: Some((observer, on_resize)),
        };
        mount.start_loop();
        Ok(mount)
    }

    fn start_loop(&mut self) {
        let view = self.view.clone();
        let window = self.window.clone();
        let pending = self.pending_frame.clone();
        let callback = self.frame_callback.clone();
        *self.frame_callback.borrow_mut() = Some(Closure::new(move || {
            pending.set(None);
            match view.borrow_mut().as_mut() {
                Some(view) => {
                    if let Err(e) = view.tick() {
                        log::error!("Unable to render {e:#}");
                    }
                }
                None => return,
            }
            if let Some(next) = callback.borrow().as_ref() {
                pending.set(window.request_animation_frame(next.as_ref().unchecked_ref()).ok());
            }
        }));
        if let Some(first) = self.frame_callback.borrow().as_ref() {
            self.pending_frame
                .set(self.window.request_animation_frame(first.as_ref().unchecked_ref()).ok());
        }
    }

    /// Stops the loop and releases the scene; later calls do nothing.
    fn teardown(&mut self) -> Option<TeardownReport> {
        if let Some((observer, _callback)) = self.resize_observer.take() {
            observer.disconnect();
        }
        if let Some(id) = self.pending_frame.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("Unable to cancel animation frame: {e:?}");
            }
        }
        // breaks the callback's reference to itself
        self.frame_callback.borrow_mut().take();
        let view = self.view.borrow_mut().take()?;
        Some(view.unmount())
    }

    pub fn unmount(mut self) -> Option<TeardownReport> {
        self.teardown()
    }
}

impl Drop for SceneMount {
    fn drop(&mut self) {
        self.teardown();
    }
}
