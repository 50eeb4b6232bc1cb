use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "DentaScreen";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// URL prefix under which locally stored reports are served.
pub const REPORTS_PUBLIC_PREFIX: &str = "/reports";

/// Per-image fetch timeout when retrieving submission photos.
pub const IMAGE_FETCH_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory
/// ~/DentaScreen/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("DentaScreen")
}

/// Get the database directory
pub fn database_dir() -> PathBuf {
    app_data_dir().join("database")
}

/// Default database file path
pub fn database_path() -> PathBuf {
    database_dir().join("dentascreen.db")
}

/// Directory where generated screening reports are written by the local sink.
pub fn reports_dir() -> PathBuf {
    app_data_dir().join("reports")
}

/// Bind address for the HTTP server. `DENTASCREEN_ADDR` overrides the default.
pub fn bind_addr() -> SocketAddr {
    std::env::var("DENTASCREEN_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5001)))
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,dentascreen=debug"
}
