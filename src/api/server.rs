//! HTTP server lifecycle: bind → spawn background task → return handle
//! with shutdown channel.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::api::router::app_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind the listener, mount the router, and spawn the axum server in a
/// background tokio task.
pub async fn start_server(
    ctx: ApiContext,
    reports_dir: PathBuf,
    addr: SocketAddr,
) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = app_router(ctx, reports_dir);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::fetch::HttpImageFetcher;
    use crate::report::ReportComposer;
    use crate::sink::LocalDirSink;

    #[tokio::test]
    async fn start_and_stop_server() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("screening.db");
        crate::db::open_database(&db_path).unwrap();

        let reports_dir = tmp.path().join("reports");
        // reqwest's blocking client must be constructed off the tokio runtime
        let fetcher = std::thread::spawn(|| HttpImageFetcher::new(2))
            .join()
            .unwrap();
        let composer = ReportComposer::new(
            fetcher,
            LocalDirSink::new(reports_dir.clone(), config::REPORTS_PUBLIC_PREFIX),
        );
        let ctx = ApiContext::new(db_path, composer);

        let mut server = start_server(
            ctx,
            reports_dir,
            "127.0.0.1:0".parse().unwrap(),
        )
        .await
        .expect("server should start");

        assert!(server.addr.port() > 0);
        server.shutdown();
    }
}
