use crate::settings::WidgetConfig;
use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const LOADER_PATH: &str = "/support/loader.js";
pub const CONTACT_RELAY_PATH: &str = "/api/support/contact";

/// Command-line overrides; anything unset falls back to the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "docs-support", version, about = "Serve documentation pages with the support widget injected")]
pub struct Cli {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Directory holding the documentation site (overrides DOCS_ROOT)
    #[arg(long)]
    pub docs_root: Option<PathBuf>,
    /// TOML file with widget settings (overrides SUPPORT_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Runtime configuration for the docs host.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub docs_root: PathBuf,
    pub enable_cors: bool,
    /// URL of the wasm-bindgen JS module exporting `mount_support_widget`.
    pub module_url: String,
    pub forward_proxy: bool,
    pub widget: WidgetConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("failed to parse BIND_ADDR")?;

        let docs_root = PathBuf::from(lookup("DOCS_ROOT").unwrap_or_else(|| "docs".to_string()));

        let enable_cors = lookup("ENABLE_CORS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let forward_proxy = lookup("FORWARD_PROXY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let module_url = lookup("SUPPORT_MODULE_URL")
            .unwrap_or_else(|| "/support/pkg/docs_support.js".to_string());

        let widget = match lookup("SUPPORT_CONFIG") {
            Some(path) => load_widget_file(Path::new(&path))?,
            None => WidgetConfig::default(),
        };

        let mut config = Self {
            bind_addr,
            docs_root,
            enable_cors,
            module_url,
            forward_proxy,
            widget,
        };
        config.apply_forward_proxy();
        Ok(config)
    }

    pub fn with_cli(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(bind) = cli.bind {
            self.bind_addr = bind;
        }
        if let Some(root) = &cli.docs_root {
            self.docs_root = root.clone();
        }
        if let Some(path) = &cli.config {
            self.widget = load_widget_file(path)?;
            self.apply_forward_proxy();
        }
        Ok(self)
    }

    fn apply_forward_proxy(&mut self) {
        if self.forward_proxy && self.widget.forward.proxy_path.is_none() {
            self.widget.forward.proxy_path = Some(CONTACT_RELAY_PATH.to_string());
        }
    }
}

pub fn load_widget_file(path: &Path) -> anyhow::Result<WidgetConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading widget config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing widget config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.docs_root, PathBuf::from("docs"));
        assert!(!cfg.enable_cors);
        assert_eq!(cfg.widget, WidgetConfig::default());
        assert_eq!(cfg.widget.forward.proxy_path, None);
    }

    #[test]
    fn bad_bind_addr_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDR"));
    }

    #[test]
    fn forward_proxy_points_widget_at_relay() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("FORWARD_PROXY", "true")])).unwrap();
        assert_eq!(
            cfg.widget.forward.proxy_path.as_deref(),
            Some(CONTACT_RELAY_PATH)
        );
    }

    #[test]
    fn widget_file_is_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.toml");
        std::fs::write(
            &path,
            "label = \"Ask us\"\n[forward]\npage_name = \"Docs\"\n[theme]\nprimary = \"#123456\"\n",
        )
        .unwrap();
        let path_str = path.to_string_lossy().to_string();
        let cfg =
            AppConfig::from_lookup(lookup_from(&[("SUPPORT_CONFIG", path_str.as_str())])).unwrap();
        assert_eq!(cfg.widget.label, "Ask us");
        assert_eq!(cfg.widget.forward.page_name, "Docs");
        assert_eq!(cfg.widget.forward.portal_id, "142608385");
        assert_eq!(cfg.widget.theme.primary, "#123456");
        assert_eq!(cfg.widget.placeholder, "you@company.com");
    }

    #[test]
    fn cli_overrides_env() {
        let cli = Cli {
            bind: Some("127.0.0.1:3000".parse().unwrap()),
            docs_root: Some(PathBuf::from("site")),
            config: None,
        };
        let cfg = AppConfig::from_lookup(|_| None)
            .unwrap()
            .with_cli(&cli)
            .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.docs_root, PathBuf::from("site"));
    }
}
