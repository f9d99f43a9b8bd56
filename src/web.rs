//! Browser binding: localStorage, the chat SDK globals, `fetch`, and DOM events
//! wired to a [`SupportWidget`].

use crate::chat::{CallableOpen, ChatError, ChatHandle, ChatHost, ChatSettings, HostedChat, MethodOpen};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::forward::{ContactForwarder, ContactRelay, ForwardError, ForwardTarget, FormSubmission};
use crate::render::{
    CONTROL_ATTR, FORM_ATTR, INPUT_ATTR, MOUNTED_ATTR, POPOVER_ATTR, ROOT_STYLE, render_widget,
};
use crate::settings::{ChatSdkConfig, WidgetConfig};
use crate::storage::{KeyValueStore, StorageError};
use crate::widget::{Activation, PointerTarget, SupportWidget};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, Event, Headers, HtmlInputElement, Request, RequestInit};

fn js_error(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "unknown script error".to_string())
}

fn attr_selector(attr: &str) -> String {
    format!("[{attr}]")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(js_error(&e)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected(js_error(&e)))
    }
}

/// Chat SDK reached through `window` globals.
#[derive(Debug, Clone)]
pub struct WindowChatHost {
    settings_global: String,
    handle_global: String,
}

impl From<&ChatSdkConfig> for WindowChatHost {
    fn from(cfg: &ChatSdkConfig) -> Self {
        Self {
            settings_global: cfg.settings_global.clone(),
            handle_global: cfg.handle_global.clone(),
        }
    }
}

impl ChatHost for WindowChatHost {
    fn publish_settings(&self, settings: &ChatSettings) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(json) = serde_json::to_string(settings) else {
            return;
        };
        let Ok(value) = js_sys::JSON::parse(&json) else {
            return;
        };
        let _ = js_sys::Reflect::set(&window, &JsValue::from_str(&self.settings_global), &value);
    }

    fn resolve_handle(&self) -> Option<ChatHandle> {
        let window = web_sys::window()?;
        let global = js_sys::Reflect::get(&window, &JsValue::from_str(&self.handle_global)).ok()?;
        if global.is_undefined() || global.is_null() {
            return None;
        }

        let method = js_sys::Reflect::get(&global, &JsValue::from_str("open"))
            .ok()
            .and_then(|open| open.dyn_into::<js_sys::Function>().ok())
            .map(|open| {
                let this = global.clone();
                Box::new(move || {
                    open.call0(&this)
                        .map(|_| ())
                        .map_err(|e| ChatError::Invoke(js_error(&e)))
                }) as MethodOpen
            });
        let callable = global.dyn_ref::<js_sys::Function>().cloned().map(|call| {
            Box::new(move |arg: &str| {
                call.call1(&JsValue::NULL, &JsValue::from_str(arg))
                    .map(|_| ())
                    .map_err(|e| ChatError::Invoke(js_error(&e)))
            }) as CallableOpen
        });
        ChatHandle::resolve(method, callable)
    }
}

/// Posts with `window.fetch` and never awaits the response on the caller.
#[derive(Debug, Clone)]
pub struct FetchForwarder {
    url: String,
    relay: bool,
}

impl From<&ForwardTarget> for FetchForwarder {
    fn from(target: &ForwardTarget) -> Self {
        match &target.proxy_path {
            Some(path) => Self {
                url: path.clone(),
                relay: true,
            },
            None => Self {
                url: target.submit_url(),
                relay: false,
            },
        }
    }
}

impl FetchForwarder {
    fn body(&self, submission: &FormSubmission) -> Result<String, ForwardError> {
        let encoded = if self.relay {
            serde_json::to_string(&ContactRelay {
                email: submission.email().unwrap_or_default().to_string(),
                page_uri: submission.context.page_uri.clone(),
            })
        } else {
            serde_json::to_string(submission)
        };
        encoded.map_err(|e| ForwardError::Transport(e.to_string()))
    }
}

impl ContactForwarder for FetchForwarder {
    fn forward(&self, submission: FormSubmission) -> Result<(), ForwardError> {
        let window = web_sys::window().ok_or(ForwardError::NoRuntime)?;
        let body = self.body(&submission)?;

        let headers = Headers::new().map_err(|e| ForwardError::Transport(js_error(&e)))?;
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| ForwardError::Transport(js_error(&e)))?;
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));
        let request = Request::new_with_str_and_init(&self.url, &init)
            .map_err(|e| ForwardError::Endpoint(js_error(&e)))?;

        let pending = JsFuture::from(window.fetch_with_request(&request));
        wasm_bindgen_futures::spawn_local(async move {
            // Outcome intentionally unobserved beyond a console note.
            if let Err(err) = pending.await {
                ConsoleDiagnostics.report(DiagnosticEvent::ForwardDispatch {
                    reason: js_error(&err),
                });
            }
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDiagnostics;

impl DiagnosticSink for ConsoleDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("docs-support: {event}")));
    }
}

struct MountedWidget {
    widget: RefCell<SupportWidget>,
    root: Element,
    cfg: WidgetConfig,
}

impl MountedWidget {
    fn render(&self) {
        let Ok(widget) = self.widget.try_borrow() else {
            return;
        };
        match render_widget(&widget.view(), &self.cfg) {
            Ok(html) => self.root.set_inner_html(&html),
            Err(err) => web_sys::console::warn_1(&JsValue::from_str(&format!(
                "docs-support: widget render failed: {err}"
            ))),
        }
    }

    fn focus_input(&self) {
        if let Ok(Some(input)) = self.root.query_selector(&attr_selector(INPUT_ATTR))
            && let Ok(input) = input.dyn_into::<web_sys::HtmlElement>()
        {
            let _ = input.focus();
        }
    }

    fn on_click(&self, target: &Element) {
        if !matches!(target.closest(&attr_selector(CONTROL_ATTR)), Ok(Some(_))) {
            return;
        }
        let activation = match self.widget.try_borrow_mut() {
            Ok(mut widget) => widget.activate(),
            Err(_) => return,
        };
        self.render();
        if activation == Activation::ShowedForm {
            self.focus_input();
        }
    }

    fn on_input(&self, target: &Element) {
        if !target.has_attribute(INPUT_ATTR) {
            return;
        }
        if let Some(input) = target.dyn_ref::<HtmlInputElement>()
            && let Ok(mut widget) = self.widget.try_borrow_mut()
        {
            widget.set_draft(input.value());
        }
    }

    fn on_submit(&self, event: &Event, target: &Element) {
        if !target.has_attribute(FORM_ATTR) {
            return;
        }
        event.prevent_default();
        let page_uri = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default();
        if let Ok(mut widget) = self.widget.try_borrow_mut() {
            widget.submit(&page_uri);
        } else {
            return;
        }
        self.render();
        self.focus_input();
    }

    fn on_pointer_down(&self, target: Option<Element>) {
        let placement = match target {
            Some(el) if matches!(el.closest(&attr_selector(POPOVER_ATTR)), Ok(Some(_))) => {
                PointerTarget::Popover
            }
            Some(el) if matches!(el.closest(&attr_selector(CONTROL_ATTR)), Ok(Some(_))) => {
                PointerTarget::Control
            }
            _ => PointerTarget::Outside,
        };
        let dismissed = match self.widget.try_borrow_mut() {
            Ok(mut widget) => widget.pointer_down(placement),
            Err(_) => false,
        };
        if dismissed {
            self.render();
        }
    }
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn listen(
    target: &web_sys::EventTarget,
    kind: &str,
    mounted: &Rc<MountedWidget>,
    handler: fn(&MountedWidget, &Event),
) -> Result<(), JsValue> {
    let mounted = mounted.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| handler(&mounted, &event));
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    callback.forget();
    Ok(())
}

fn build_widget(cfg: &WidgetConfig) -> SupportWidget {
    SupportWidget::new(
        LocalStorageStore,
        HostedChat::new(WindowChatHost::from(&cfg.chat)),
        FetchForwarder::from(&cfg.forward),
    )
    .with_contact_key(cfg.storage_key.clone())
    .with_page_name(cfg.forward.page_name.clone())
    .with_diagnostics(ConsoleDiagnostics)
}

/// Mounts the support widget on the current page.
///
/// `config` is a plain object shaped like [`WidgetConfig`]; missing fields take
/// defaults. A root already marked as mounted is left alone, and a root the
/// server pre-rendered is adopted.
#[wasm_bindgen]
pub fn mount_support_widget(config: JsValue) -> Result<(), JsValue> {
    let cfg: WidgetConfig = if config.is_undefined() || config.is_null() {
        WidgetConfig::default()
    } else {
        let json = String::from(js_sys::JSON::stringify(&config)?);
        serde_json::from_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let root = match document.get_element_by_id(&cfg.root_id) {
        Some(existing) if existing.has_attribute(MOUNTED_ATTR) => return Ok(()),
        Some(existing) => existing,
        None => {
            let el = document.create_element("div")?;
            el.set_id(&cfg.root_id);
            el.set_attribute("style", ROOT_STYLE)?;
            document
                .body()
                .ok_or_else(|| JsValue::from_str("no body"))?
                .append_child(&el)?;
            el
        }
    };
    root.set_attribute(MOUNTED_ATTR, "")?;

    let mounted = Rc::new(MountedWidget {
        widget: RefCell::new(build_widget(&cfg)),
        root: root.clone(),
        cfg,
    });
    mounted.render();

    listen(&root, "click", &mounted, |m, e| {
        if let Some(target) = event_element(e) {
            m.on_click(&target);
        }
    })?;
    listen(&root, "input", &mounted, |m, e| {
        if let Some(target) = event_element(e) {
            m.on_input(&target);
        }
    })?;
    listen(&root, "submit", &mounted, |m, e| {
        if let Some(target) = event_element(e) {
            m.on_submit(e, &target);
        }
    })?;
    listen(&document, "mousedown", &mounted, |m, e| {
        m.on_pointer_down(event_element(e));
    })?;
    Ok(())
}
