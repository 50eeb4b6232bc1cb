use tracing_subscriber::EnvFilter;

use dentascreen::api::{start_server, ApiContext};
use dentascreen::fetch::HttpImageFetcher;
use dentascreen::report::ReportComposer;
use dentascreen::sink::LocalDirSink;
use dentascreen::{config, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!(version = config::APP_VERSION, "{} starting", config::APP_NAME);

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let db_path = config::database_path();
    std::fs::create_dir_all(config::database_dir())
        .map_err(|e| format!("Cannot create database directory: {e}"))?;

    // Opening runs pending migrations
    db::open_database(&db_path).map_err(|e| format!("Database initialization failed: {e}"))?;
    tracing::info!(path = %db_path.display(), "database ready");

    let reports_dir = config::reports_dir();
    let composer = ReportComposer::new(
        HttpImageFetcher::default(),
        LocalDirSink::new(reports_dir.clone(), config::REPORTS_PUBLIC_PREFIX),
    );
    let ctx = ApiContext::new(db_path, composer);

    let mut server = start_server(ctx, reports_dir, config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Cannot listen for shutdown signal: {e}"))?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}
