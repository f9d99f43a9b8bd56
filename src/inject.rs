use crate::render::{chat_script_tag, render_root};
use crate::settings::WidgetConfig;
use crate::widget::WidgetView;
use askama::Template;
use kuchiki::NodeRef;
use kuchiki::traits::*;
use thiserror::Error;
use tracing::debug;

const WRAPPER_ID: &str = "__docs_support_wrapper";

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("html manipulation failed: {0}")]
    Html(String),
    #[error("widget markup failed to render: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Template)]
#[template(source = r#"<script src="{{ src }}" defer></script>"#, ext = "html")]
struct LoaderTag<'a> {
    src: &'a str,
}

/// Adds the chat SDK script, the widget loader and the idle control to a page.
///
/// Pages that already contain the widget root are returned untouched.
pub fn inject_widget(html: String, cfg: &WidgetConfig, loader_src: &str) -> Result<String, InjectError> {
    let document = kuchiki::parse_html().one(html.as_str());
    if has_element_with_id(&document, &cfg.root_id) {
        debug!(root_id = %cfg.root_id, "widget already present; skipping injection");
        return Ok(html);
    }

    let head_markup = chat_script_tag(&cfg.chat)? + &LoaderTag { src: loader_src }.render()?;
    append_markup(&document, "head", &head_markup)?;
    append_markup(&document, "body", &render_root(&WidgetView::default(), cfg)?)?;
    Ok(document.to_string())
}

fn has_element_with_id(document: &NodeRef, id: &str) -> bool {
    document
        .descendants()
        .elements()
        .any(|el| el.attributes.borrow().get("id") == Some(id))
}

fn append_markup(document: &NodeRef, selector: &str, markup: &str) -> Result<(), InjectError> {
    let target = document
        .select_first(selector)
        .map_err(|_| InjectError::Html(format!("no <{selector}> element")))?;
    for node in parse_fragment(markup)? {
        target.as_node().append(node);
    }
    Ok(())
}

fn parse_fragment(markup: &str) -> Result<Vec<NodeRef>, InjectError> {
    let wrapper_html = format!("<div id=\"{WRAPPER_ID}\">{markup}</div>");
    let fragment_doc = kuchiki::parse_html().one(wrapper_html);
    let wrapper = fragment_doc
        .select_first(&format!("#{WRAPPER_ID}"))
        .map_err(|_| InjectError::Html("fragment wrapper missing".to_string()))?;
    let children: Vec<_> = wrapper.as_node().children().collect();
    for child in &children {
        child.detach();
    }
    Ok(children)
}
