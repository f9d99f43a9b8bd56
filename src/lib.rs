//! Support-chat widget for documentation sites.
//!
//! The widget gates an embedded chat surface behind a one-time email capture.
//! [`widget::SupportWidget`] holds the state machine; `render` and the browser
//! binding in `web` draw it, and the native modules host documentation pages
//! with the widget injected.

pub mod chat;
pub mod contact;
pub mod diagnostics;
pub mod forward;
pub mod render;
pub mod settings;
pub mod storage;
pub mod widget;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

#[cfg(not(target_arch = "wasm32"))]
pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod inject;
#[cfg(not(target_arch = "wasm32"))]
pub mod loader;
#[cfg(not(target_arch = "wasm32"))]
pub mod pages;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
