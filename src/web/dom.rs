//! Thin helpers over `web_sys` for the document the app lives in.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlInputElement, MouseEvent};

use crate::app::Msg;
use crate::pages::markup::{Head, MetaKey};
use crate::pages::new_post::{CANCEL_ACTION, EDITOR_ID, PUBLISH_ACTION, TITLE_INPUT_ID};

/// Element the routed markup is rendered into.
pub const APP_ROOT_ID: &str = "app";
/// Element the backdrop canvas is attached to. It sits outside the app root,
/// so re-rendering the page never destroys the canvas.
pub const SCENE_ROOT_ID: &str = "scene-root";

const MANAGED_ATTR: &str = "data-head";

pub fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}

pub fn current_path() -> Result<String, JsValue> {
    window()?.location().pathname()
}

pub fn push_history(path: &str) -> Result<(), JsValue> {
    window()?
        .history()?
        .push_state_with_url(&JsValue::NULL, "", Some(path))
}

/// Replaces the document title and every meta tag a previous page set.
pub fn apply_head(document: &Document, head: &Head) -> Result<(), JsValue> {
    document.set_title(&head.title);
    let Some(head_element) = document.head() else {
        return Ok(());
    };
    while let Some(stale) = head_element.query_selector(&format!("[{MANAGED_ATTR}]"))? {
        stale.remove();
    }
    for (key, content) in &head.meta {
        let meta = document.create_element("meta")?;
        match key {
            MetaKey::Name(name) => meta.set_attribute("name", name)?,
            MetaKey::Property(property) => meta.set_attribute("property", property)?,
        }
        meta.set_attribute("content", content)?;
        meta.set_attribute(MANAGED_ATTR, "")?;
        head_element.append_child(&meta)?;
    }
    if let Some(href) = &head.canonical {
        let link = document.create_element("link")?;
        link.set_attribute("rel", "canonical")?;
        link.set_attribute("href", href)?;
        link.set_attribute(MANAGED_ATTR, "")?;
        head_element.append_child(&link)?;
    }
    Ok(())
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Maps a click to an app message: in-app links (`a[data-link]`) and the
/// editor's action buttons. Modified clicks are left to the browser.
pub fn click_message(event: &MouseEvent) -> Option<Msg> {
    if event.button() != 0 || event.ctrl_key() || event.meta_key() || event.shift_key() || event.alt_key() {
        return None;
    }
    let target = target_element(event)?;
    if let Ok(Some(link)) = target.closest("a[data-link]") {
        let href = link.get_attribute("href")?;
        event.prevent_default();
        return Some(Msg::Navigate(href));
    }
    let button = target.closest("[data-action]").ok()??;
    if button.has_attribute("disabled") {
        return None;
    }
    match button.get_attribute("data-action")?.as_str() {
        PUBLISH_ACTION => Some(Msg::Submit),
        CANCEL_ACTION => Some(Msg::Cancel),
        _ => None,
    }
}

/// Maps edits in the new-post form to app messages.
pub fn input_message(event: &Event) -> Option<Msg> {
    let target = target_element(event)?;
    match target.id().as_str() {
        TITLE_INPUT_ID => {
            let input = target.dyn_into::<HtmlInputElement>().ok()?;
            Some(Msg::TitleChanged(input.value()))
        }
        EDITOR_ID => Some(Msg::ContentChanged(target.inner_html())),
        _ => None,
    }
}
