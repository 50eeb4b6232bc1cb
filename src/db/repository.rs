//! Submission repository — CRUD over the `submissions` table plus the
//! forward-only status transitions (`uploaded → annotated → reported`).
//!
//! Annotation data is stored as JSON in `submissions.annotation_data`.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{
    Annotation, PatientInfo, Submission, SubmissionImages, SubmissionStatus,
};

/// Request to create a submission. Status always starts `uploaded`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub patient_info: PatientInfo,
    pub note: Option<String>,
    pub images: SubmissionImages,
}

const SELECT_COLUMNS: &str = "id, patient_name, patient_ref, patient_email, note, layout,
        upper_url, front_url, lower_url, original_url,
        annotated_image_url, annotation_data, status, report_url,
        created_at, updated_at";

/// Creates a submission and returns the stored record.
pub fn create_submission(
    conn: &Connection,
    new: &NewSubmission,
) -> Result<Submission, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let (upper, front, lower, original) = match &new.images {
        SubmissionImages::ThreePanel {
            upper_url,
            front_url,
            lower_url,
        } => (
            Some(upper_url.as_str()),
            Some(front_url.as_str()),
            Some(lower_url.as_str()),
            None,
        ),
        SubmissionImages::SinglePanel { original_url } => {
            (None, None, None, Some(original_url.as_str()))
        }
    };

    conn.execute(
        "INSERT INTO submissions
            (id, patient_name, patient_ref, patient_email, note, layout,
             upper_url, front_url, lower_url, original_url,
             annotation_data, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, '[]', 'uploaded', ?11, ?11)",
        params![
            id,
            new.patient_info.name,
            new.patient_info.patient_id,
            new.patient_info.email,
            new.note,
            new.images.layout_str(),
            upper,
            front,
            lower,
            original,
            now,
        ],
    )?;

    get_submission(conn, &id)
}

/// Lists all submissions, newest first (admin view).
pub fn list_submissions(conn: &Connection) -> Result<Vec<Submission>, DatabaseError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM submissions ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Lists one patient's submissions, newest first.
pub fn list_submissions_for_patient(
    conn: &Connection,
    patient_ref: &str,
) -> Result<Vec<Submission>, DatabaseError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM submissions
         WHERE patient_ref = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_ref], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Fetches a submission by id.
pub fn get_submission(conn: &Connection, id: &str) -> Result<Submission, DatabaseError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM submissions WHERE id = ?1");
    conn.query_row(&sql, params![id], map_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Submission".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })
}

/// Stores the annotated image reference and annotation records, advancing
/// status to `annotated`. Rejected once a submission is `reported`.
pub fn annotate_submission(
    conn: &Connection,
    id: &str,
    annotated_image_url: &str,
    annotation_data: &[Annotation],
) -> Result<Submission, DatabaseError> {
    let current = get_submission(conn, id)?;
    if !current.status.can_advance_to(SubmissionStatus::Annotated) {
        return Err(DatabaseError::InvalidTransition {
            from: current.status.as_str().into(),
            to: "annotated".into(),
        });
    }

    let annotations_json = serde_json::to_string(annotation_data)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("JSON serialization: {e}")))?;

    conn.execute(
        "UPDATE submissions
         SET annotated_image_url = ?1, annotation_data = ?2,
             status = 'annotated', updated_at = ?3
         WHERE id = ?4",
        params![annotated_image_url, annotations_json, Utc::now().to_rfc3339(), id],
    )?;

    get_submission(conn, id)
}

/// Persists the report URL and advances status to `reported` in one write,
/// so `status = reported` is never observable without a report URL.
pub fn record_report(
    conn: &Connection,
    id: &str,
    report_url: &str,
) -> Result<(), DatabaseError> {
    let current = get_submission(conn, id)?;
    if !current.status.can_advance_to(SubmissionStatus::Reported) {
        return Err(DatabaseError::InvalidTransition {
            from: current.status.as_str().into(),
            to: "reported".into(),
        });
    }

    let changed = conn.execute(
        "UPDATE submissions
         SET report_url = ?1, status = 'reported', updated_at = ?2
         WHERE id = ?3",
        params![report_url, Utc::now().to_rfc3339(), id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Submission".into(),
            id: id.into(),
        });
    }
    Ok(())
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    let layout: String = row.get(5)?;
    let upper: Option<String> = row.get(6)?;
    let front: Option<String> = row.get(7)?;
    let lower: Option<String> = row.get(8)?;
    let original: Option<String> = row.get(9)?;

    let images = match layout.as_str() {
        "three_panel" => SubmissionImages::ThreePanel {
            upper_url: upper.unwrap_or_default(),
            front_url: front.unwrap_or_default(),
            lower_url: lower.unwrap_or_default(),
        },
        _ => SubmissionImages::SinglePanel {
            original_url: original.unwrap_or_default(),
        },
    };

    let annotations_json: String = row.get(11)?;
    let annotation_data: Vec<Annotation> =
        serde_json::from_str(&annotations_json).unwrap_or_default();

    let status_str: String = row.get(12)?;
    let status = SubmissionStatus::parse(&status_str).unwrap_or(SubmissionStatus::Uploaded);

    Ok(Submission {
        id: row.get(0)?,
        patient_info: PatientInfo {
            name: row.get(1)?,
            patient_id: row.get(2)?,
            email: row.get(3)?,
        },
        note: row.get(4)?,
        images,
        annotated_image_url: row.get(10)?,
        annotation_data,
        status,
        report_url: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
