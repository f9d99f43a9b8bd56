use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("path escapes docs root: {0}")]
    Traversal(String),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum Page {
    Html(String),
    Asset {
        bytes: Vec<u8>,
        content_type: &'static str,
    },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, request_path: &str) -> Result<Option<Page>, PageError>;
}

/// Serves a static documentation build from a directory.
pub struct FsPageSource {
    root: PathBuf,
}

impl FsPageSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl PageSource for FsPageSource {
    async fn load(&self, request_path: &str) -> Result<Option<Page>, PageError> {
        for candidate in candidates(&self.root, request_path)? {
            match fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => {}
                _ => continue,
            }
            let bytes = fs::read(&candidate).await.map_err(|source| PageError::Io {
                path: candidate.clone(),
                source,
            })?;
            let content_type = content_type_for(&candidate);
            if content_type.starts_with("text/html") {
                return Ok(Some(Page::Html(String::from_utf8_lossy(&bytes).into_owned())));
            }
            return Ok(Some(Page::Asset {
                bytes,
                content_type,
            }));
        }
        Ok(None)
    }
}

/// Files that may answer `request_path`, most specific first.
///
/// `/` maps to `index.html`, `/guide` to `guide.html` then `guide/index.html`.
pub fn candidates(root: &Path, request_path: &str) -> Result<Vec<PathBuf>, PageError> {
    let mut resolved = root.to_path_buf();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(PageError::Traversal(request_path.to_string())),
            s if s.contains('\\') || s.contains('\0') => {
                return Err(PageError::Traversal(request_path.to_string()));
            }
            s => resolved.push(s),
        }
    }

    if request_path.ends_with('/') || resolved == root {
        return Ok(vec![resolved.join("index.html")]);
    }
    if resolved.extension().is_some() {
        return Ok(vec![resolved]);
    }
    let mut html = resolved.clone();
    html.set_extension("html");
    Ok(vec![html, resolved.join("index.html")])
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
