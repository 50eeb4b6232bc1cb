//! HTTP router for the screening API.
//!
//! All JSON endpoints live under `/api/`; finished reports are served as
//! static files under the reports prefix.

use std::path::PathBuf;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;

/// Build the full application router.
///
/// `reports_dir` is the directory the local report sink writes to; it is
/// mounted read-only under [`config::REPORTS_PUBLIC_PREFIX`].
pub fn app_router(ctx: ApiContext, reports_dir: PathBuf) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/submissions", post(endpoints::submissions::create))
        .route("/submissions/mine", get(endpoints::submissions::mine))
        .route("/submissions/:id/report", get(endpoints::reports::status))
        .route("/admin/submissions", get(endpoints::submissions::list_all))
        .route("/admin/submissions/:id", get(endpoints::submissions::detail))
        .route(
            "/admin/submissions/:id/annotate",
            put(endpoints::submissions::annotate),
        )
        .route(
            "/admin/submissions/:id/report",
            post(endpoints::reports::generate),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .nest_service(config::REPORTS_PUBLIC_PREFIX, ServeDir::new(reports_dir))
        .layer(CorsLayer::permissive())
}
