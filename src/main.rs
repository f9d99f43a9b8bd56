#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use anyhow::Context;
    use clap::Parser;
    use docs_support::config::{AppConfig, Cli};
    use docs_support::forward::HttpForwarder;
    use docs_support::pages::FsPageSource;
    use docs_support::server::{self, AppState};
    use std::sync::Arc;
    use tracing_subscriber::EnvFilter;

    pub async fn run() -> anyhow::Result<()> {
        init_tracing();
        let cli = Cli::parse();
        let config = AppConfig::from_env()?.with_cli(&cli)?;

        let endpoint = config.widget.forward.submit_url();
        let forwarder = HttpForwarder::new(&endpoint)
            .with_context(|| format!("configuring contact forward to {endpoint}"))?;
        if !config.docs_root.is_dir() {
            tracing::warn!(root = %config.docs_root.display(), "docs root is not a directory; every page will 404");
        }
        let pages = Arc::new(FsPageSource::new(config.docs_root.clone()));

        let addr = config.bind_addr;
        let state = AppState::new(config, pages, Arc::new(forwarder));
        tracing::info!(%addr, "starting docs-support server");
        server::run(addr, state).await?;
        Ok(())
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }
}
