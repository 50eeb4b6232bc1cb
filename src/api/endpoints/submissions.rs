//! Submission endpoints: patient upload and listing, admin review and
//! annotation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::repository::{
    annotate_submission, create_submission, get_submission, list_submissions,
    list_submissions_for_patient, NewSubmission,
};
use crate::models::{Annotation, PatientInfo, Submission, SubmissionImages};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub name: String,
    pub patient_id: String,
    pub email: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(flatten)]
    pub images: SubmissionImages,
}

/// POST /api/submissions — patient uploads a new screening submission.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    if payload.name.trim().is_empty() || payload.patient_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Patient name and patient ID are required.".into(),
        ));
    }
    if payload
        .images
        .source_urls()
        .iter()
        .any(|u| u.trim().is_empty())
    {
        return Err(ApiError::BadRequest("All image URLs are required.".into()));
    }

    let conn = ctx.open_db()?;
    let new = NewSubmission {
        patient_info: PatientInfo {
            name: payload.name,
            patient_id: payload.patient_id,
            email: payload.email,
        },
        note: payload.note,
        images: payload.images,
    };
    let submission = create_submission(&conn, &new)?;

    tracing::info!(
        submission = %submission.id,
        layout = submission.images.layout_str(),
        "submission created"
    );
    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineQuery {
    pub patient_id: String,
}

/// GET /api/submissions/mine?patientId= — one patient's submissions.
pub async fn mine(
    State(ctx): State<ApiContext>,
    Query(query): Query<MineQuery>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let conn = ctx.open_db()?;
    let submissions = list_submissions_for_patient(&conn, &query.patient_id)?;
    Ok(Json(submissions))
}

/// GET /api/admin/submissions — all submissions, newest first.
pub async fn list_all(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let conn = ctx.open_db()?;
    let submissions = list_submissions(&conn)?;
    Ok(Json(submissions))
}

/// GET /api/admin/submissions/:id
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Submission>, ApiError> {
    let conn = ctx.open_db()?;
    let submission = get_submission(&conn, &id)?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateRequest {
    pub annotated_image_url: String,
    #[serde(default)]
    pub annotation_data: Vec<Annotation>,
}

/// PUT /api/admin/submissions/:id/annotate — store the marked-up image and
/// its annotation records, advancing status to `annotated`.
pub async fn annotate(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(payload): Json<AnnotateRequest>,
) -> Result<Json<Submission>, ApiError> {
    if payload.annotated_image_url.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Annotated image URL is required.".into(),
        ));
    }

    let conn = ctx.open_db()?;
    let submission = annotate_submission(
        &conn,
        &id,
        &payload.annotated_image_url,
        &payload.annotation_data,
    )?;

    tracing::info!(
        submission = %id,
        annotations = submission.annotation_data.len(),
        "submission annotated"
    );
    Ok(Json(submission))
}
