//! Browser driver: renders the app into the page, routes with the History
//! API and mounts the backdrop while the home page is shown.

pub mod dom;
pub mod scene_mount;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Event, MouseEvent, PageTransitionEvent};

use crate::api::ApiClient;
use crate::app::{self, App, Command, Msg, Update};
use crate::config::Config;
use crate::logging;
use crate::scene::SceneParams;
use crate::web::scene_mount::SceneMount;

struct Driver {
    app: RefCell<App>,
    client: ApiClient,
    scene_params: SceneParams,
    scene: RefCell<Option<SceneMount>>,
    /// Bumped on every mount and unmount request, so a mount that finishes
    /// after the home page was left is dropped instead of kept.
    scene_epoch: Cell<u64>,
}

impl Driver {
    fn dispatch(self: &Rc<Self>, msg: Msg) {
        let update = self.app.borrow_mut().update(msg);
        self.apply(update);
    }

    fn apply(self: &Rc<Self>, update: Update) {
        if update.redraw {
            if let Err(e) = self.render() {
                log::error!("Unable to render page: {e:?}");
            }
        }
        for command in update.commands {
            self.run(command);
        }
    }

    fn render(&self) -> Result<(), JsValue> {
        let document = dom::document()?;
        let app = self.app.borrow();
        if let Some(root) = document.get_element_by_id(dom::APP_ROOT_ID) {
            root.set_inner_html(&app.render());
        }
        dom::apply_head(&document, &app.head())
    }

    fn run(self: &Rc<Self>, command: Command) {
        match command {
            Command::PushHistory(path) => {
                if let Err(e) = dom::push_history(&path) {
                    log::warn!("Unable to push history entry {path}: {e:?}");
                }
            }
            Command::MountScene => self.mount_scene(),
            Command::UnmountScene => self.unmount_scene(),
            request => {
                let driver = self.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Some(msg) = app::perform(&driver.client, request).await {
                        driver.dispatch(msg);
                    }
                });
            }
        }
    }

    fn mount_scene(self: &Rc<Self>) {
        let epoch = self.scene_epoch.get() + 1;
        self.scene_epoch.set(epoch);
        let container = match dom::document().map(|d| d.get_element_by_id(dom::SCENE_ROOT_ID)) {
            Ok(Some(container)) => container,
            _ => {
                log::warn!("No #{} container, skipping the backdrop", dom::SCENE_ROOT_ID);
                return;
            }
        };
        let driver = self.clone();
        let params = self.scene_params.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match SceneMount::mount(container, params).await {
                Ok(mount) if driver.scene_epoch.get() == epoch => {
                    if let Some(previous) = driver.scene.borrow_mut().replace(mount) {
                        previous.unmount();
                    }
                }
                Ok(mount) => {
                    log::debug!("Home was left while the backdrop was starting");
                    mount.unmount();
                }
                Err(e) => log::error!("Unable to start the backdrop: {e:#}"),
            }
        });
    }

    fn unmount_scene(&self) {
        self.scene_epoch.set(self.scene_epoch.get() + 1);
        let mount = self.scene.borrow_mut().take();
        if let Some(report) = mount.and_then(SceneMount::unmount) {
            log::debug!("{report:?}");
        }
    }

    fn listen(self: &Rc<Self>) -> Result<(), JsValue> {
        let window = dom::window()?;
        let document = dom::document()?;

        let driver = self.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            if let Some(msg) = dom::click_message(&event) {
                driver.dispatch(msg);
            }
        });
        document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();

        let driver = self.clone();
        let on_input = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(msg) = dom::input_message(&event) {
                driver.dispatch(msg);
            }
        });
        document.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
        on_input.forget();

        let driver = self.clone();
        let on_popstate = Closure::<dyn FnMut()>::new(move || match dom::current_path() {
            Ok(path) => driver.dispatch(Msg::LocationChanged(path)),
            Err(e) => log::warn!("Unable to read location: {e:?}"),
        });
        window.add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())?;
        on_popstate.forget();

        let driver = self.clone();
        let on_unload = Closure::<dyn FnMut()>::new(move || driver.unmount_scene());
        window.add_event_listener_with_callback("pagehide", on_unload.as_ref().unchecked_ref())?;
        on_unload.forget();

        // restored from the back/forward cache: the backdrop went away on pagehide
        let driver = self.clone();
        let on_show = Closure::<dyn FnMut(PageTransitionEvent)>::new(move |event: PageTransitionEvent| {
            if event.persisted() {
                let update = driver.app.borrow().resume();
                driver.apply(update);
            }
        });
        window.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref())?;
        on_show.forget();
        Ok(())
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::init();
    let config = Config::from_env();
    log::info!("Starting with API at {}", config.api_url);
    let client = ApiClient::from_config(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let driver = Rc::new(Driver {
        app: RefCell::new(App::new(&config)),
        client,
        scene_params: SceneParams::for_variant(config.scene),
        scene: RefCell::new(None),
        scene_epoch: Cell::new(0),
    });
    driver.listen()?;
    let path = dom::current_path()?;
    let update = driver.app.borrow_mut().start(&path);
    driver.apply(update);
    Ok(())
}
