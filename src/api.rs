use crate::config::LOADER_PATH;
use crate::contact::CapturedContact;
use crate::forward::{ContactRelay, FormSubmission};
use crate::inject::inject_widget;
use crate::pages::{Page, PageError};
use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

pub async fn serve_loader(State(state): State<AppState>) -> impl IntoResponse {
    let script = crate::loader::loader_script(&state.config.widget, &state.config.module_url);
    let mut resp = Response::new(script);
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/javascript"),
    );
    resp
}

pub async fn get_widget_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.widget.clone())
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Same-origin relay for the marketing forward.
pub async fn post_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactRelay>,
) -> impl IntoResponse {
    let contact = match CapturedContact::parse(&body.email) {
        Ok(contact) => contact,
        Err(err) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };
    let submission = FormSubmission::for_contact(
        &contact,
        &body.page_uri,
        &state.config.widget.forward.page_name,
    );
    match state.forwarder.forward(submission) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => {
            warn!(%err, "contact relay could not dispatch forward");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub async fn serve_page(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    match state.pages.load(uri.path()).await {
        Ok(Some(Page::Html(html))) => {
            match inject_widget(html.clone(), &state.config.widget, LOADER_PATH) {
                Ok(injected) => Html(injected).into_response(),
                Err(err) => {
                    warn!(path = %uri.path(), %err, "widget injection failed; serving page as-is");
                    Html(html).into_response()
                }
            }
        }
        Ok(Some(Page::Asset {
            bytes,
            content_type,
        })) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(PageError::Traversal(path)) => {
            warn!(%path, "rejected path outside docs root");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            error!(path = %uri.path(), %err, "failed to load page");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
