//! HTML markup for the widget, rendered from the askama templates under
//! `templates/support/`. The server uses it to pre-render the idle control into
//! pages; the browser binding re-renders from it after events.
//!
//! The `*_ATTR` markers below are written literally in `widget.html`.

use crate::settings::{ChatSdkConfig, WidgetConfig};
use crate::widget::WidgetView;
use askama::Template;

pub const CONTROL_ATTR: &str = "data-support-control";
pub const POPOVER_ATTR: &str = "data-support-popover";
pub const FORM_ATTR: &str = "data-support-form";
pub const INPUT_ATTR: &str = "data-support-input";
pub const MOUNTED_ATTR: &str = "data-support-mounted";
pub const ROOT_STYLE: &str = "position:fixed;bottom:0;right:0;z-index:2147483646;pointer-events:none;";

const CHAT_ICON: &str = r#"<svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true"><path d="M21 15a2 2 0 0 1-2 2H7l-4 4V5a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2z"/></svg>"#;

#[derive(Template)]
#[template(path = "support/root.html")]
struct RootMarkup<'a> {
    root_id: &'a str,
    style: &'a str,
    inner: String,
}

#[derive(Template)]
#[template(path = "support/widget.html")]
struct WidgetMarkup<'a> {
    view: &'a WidgetView,
    intro: &'a [String],
    placeholder: &'a str,
    submit_label: &'a str,
    label: &'a str,
    error: Option<&'a str>,
    icon: &'a str,
    primary: String,
    hover: String,
    font: String,
}

#[derive(Template)]
#[template(path = "support/chat_script.html")]
struct ChatScriptMarkup<'a> {
    chat: &'a ChatSdkConfig,
}

/// Root container with the widget inside. Only the control is clickable.
pub fn render_root(view: &WidgetView, cfg: &WidgetConfig) -> Result<String, askama::Error> {
    RootMarkup {
        root_id: &cfg.root_id,
        style: ROOT_STYLE,
        inner: render_widget(view, cfg)?,
    }
    .render()
}

/// Inner markup of the root: stylesheet, popover when open, then the control.
pub fn render_widget(view: &WidgetView, cfg: &WidgetConfig) -> Result<String, askama::Error> {
    let submit_label = if view.submitting {
        &cfg.busy_label
    } else {
        &cfg.submit_label
    };
    WidgetMarkup {
        view,
        intro: &cfg.intro,
        placeholder: &cfg.placeholder,
        submit_label,
        label: &cfg.label,
        error: view.error.as_deref().filter(|e| !e.is_empty()),
        icon: CHAT_ICON,
        primary: escape_css(&cfg.theme.primary),
        hover: escape_css(&cfg.theme.primary_hover),
        font: escape_css(&cfg.theme.font_family),
    }
    .render()
}

// Theme values land inside a <style> block where entity escaping does nothing.
fn escape_css(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | ';'))
        .collect()
}

/// Async script tag for the chat SDK with its own launcher button hidden.
pub fn chat_script_tag(chat: &ChatSdkConfig) -> Result<String, askama::Error> {
    ChatScriptMarkup { chat }.render()
}
