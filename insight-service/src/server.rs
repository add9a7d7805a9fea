//! Listener setup.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use insight_adapters::huggingface::HuggingFaceAdapter;
use insight_config::ServiceConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::routes::router;

/// Builds the provider adapter described by `config`.
///
/// # Errors
///
/// Fails if the adapter rejects the provider configuration.
pub fn analyzer_from_config(config: &ServiceConfig) -> anyhow::Result<Analyzer> {
    let adapter = HuggingFaceAdapter::new(config.provider().clone())
        .context("failed to construct inference adapter")?;
    Ok(Analyzer::new(Arc::new(adapter)).with_max_new_tokens(config.max_new_tokens()))
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
///
/// Fails if the adapter cannot be built, the address cannot be bound, or the
/// server stops with an I/O error.
pub async fn serve(config: &ServiceConfig) -> anyhow::Result<()> {
    let analyzer = analyzer_from_config(config)?;
    let address = config.listen().address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    serve_on(listener, analyzer, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Fails if the server stops with an I/O error.
pub async fn serve_on<F>(listener: TcpListener, analyzer: Analyzer, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        address = %listener.local_addr()?,
        model = analyzer.model(),
        "schema insight service listening"
    );

    axum::serve(listener, router(analyzer))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server terminated")?;

    info!("schema insight service stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(%err, "failed to install Ctrl-C handler; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn signal_error_does_not_stop_the_server() {
        let failed = async { Err(std::io::Error::other("no signal support")) };
        let waited = tokio::time::timeout(Duration::from_millis(100), wait_for_shutdown(failed)).await;
        assert!(waited.is_err(), "shutdown resolved after a signal error");
    }

    #[tokio::test]
    async fn signal_delivery_triggers_shutdown() {
        let delivered = async { Ok(()) };
        tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(delivered))
            .await
            .expect("shutdown should resolve");
    }
}
