//! Report generation and retrieval.
//!
//! Generation runs the blocking compose pipeline on a worker thread and is
//! single-flighted per submission: a second request while one is in
//! progress gets 409 instead of a duplicate artifact.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::db::repository::get_submission;
use crate::db::DatabaseError;
use crate::report::generate_report;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportResponse {
    pub message: &'static str,
    pub report_url: String,
}

/// POST /api/admin/submissions/:id/report
pub async fn generate(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<GenerateReportResponse>, ApiError> {
    let _flight = ctx.try_begin_report(&id).ok_or_else(|| {
        ApiError::Conflict("Report generation already in progress for this submission.".into())
    })?;

    let task_ctx = ctx.clone();
    let task_id = id.clone();
    let report = tokio::task::spawn_blocking(move || {
        let conn = task_ctx.open_db()?;
        let submission = get_submission(&conn, &task_id).map_err(|e| match e {
            // A missing submission and a not-yet-annotated one surface the
            // same caller message here.
            DatabaseError::NotFound { .. } => {
                ApiError::BadRequest("Submission not found or not yet annotated.".into())
            }
            other => ApiError::from(other),
        })?;
        generate_report(&conn, &submission, &task_ctx.composer).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("report task failed: {e}")))??;

    tracing::info!(submission = %id, url = %report.url, "report generated");
    Ok(Json(GenerateReportResponse {
        message: "Report generated successfully",
        report_url: report.url,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatusResponse {
    pub report_url: String,
}

/// GET /api/submissions/:id/report — resolves the stored report URL.
pub async fn status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ReportStatusResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let submission = get_submission(&conn, &id)?;

    match submission.report_url {
        Some(report_url) => Ok(Json(ReportStatusResponse { report_url })),
        None => Err(ApiError::NotFound("Report not available.".into())),
    }
}
