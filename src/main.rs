use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legal_llm_service::{AppConfig, ModelStore, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let store = Arc::new(ModelStore::new(&config.model_dir, config.device));

    if config.preload_model {
        preload(store.clone()).await;
    }

    let router = build_router(config.clone(), store);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "legal LLM API ready");

    axum::serve(listener, router).await?;

    Ok(())
}

/// Best-effort eager load so the first request does not pay the load latency.
/// A failure here is logged and the server still starts; the first request
/// retries the load.
async fn preload(store: Arc<ModelStore>) {
    let result = task::spawn_blocking(move || store.ensure_loaded().map(|_| ())).await;
    match result {
        Ok(Ok(())) => tracing::info!("model preloaded"),
        Ok(Err(err)) => tracing::warn!(%err, "model preload failed, first request will retry"),
        Err(err) => tracing::warn!(%err, "model preload task failed"),
    }
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
