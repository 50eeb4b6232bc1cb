//! Screening submission record: patient info, source photos, annotations,
//! and the report lifecycle (`uploaded → annotated → reported`).

use serde::{Deserialize, Serialize};

/// Immutable patient display data captured at upload time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: String,
    pub patient_id: String,
    pub email: String,
}

/// One annotation produced by the admin markup tool.
///
/// `details` is an opaque payload (e.g. a bounding box) that is stored and
/// echoed back but never interpreted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub shape: String,
    pub label: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Source photo references. Two layout variants exist: the standard
/// three-view capture and a single original photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionImages {
    ThreePanel {
        #[serde(rename = "upperTeethUrl")]
        upper_url: String,
        #[serde(rename = "frontTeethUrl")]
        front_url: String,
        #[serde(rename = "lowerTeethUrl")]
        lower_url: String,
    },
    SinglePanel {
        #[serde(rename = "originalImageUrl")]
        original_url: String,
    },
}

impl SubmissionImages {
    /// Storage discriminant for the `layout` column.
    pub fn layout_str(&self) -> &'static str {
        match self {
            SubmissionImages::ThreePanel { .. } => "three_panel",
            SubmissionImages::SinglePanel { .. } => "single_panel",
        }
    }

    /// All source URLs in fetch order.
    pub fn source_urls(&self) -> Vec<&str> {
        match self {
            SubmissionImages::ThreePanel {
                upper_url,
                front_url,
                lower_url,
            } => vec![upper_url, front_url, lower_url],
            SubmissionImages::SinglePanel { original_url } => vec![original_url],
        }
    }
}

/// Report lifecycle state. Forward-only; the repository rejects transitions
/// that would move a submission backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Uploaded,
    Annotated,
    Reported,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Uploaded => "uploaded",
            SubmissionStatus::Annotated => "annotated",
            SubmissionStatus::Reported => "reported",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(SubmissionStatus::Uploaded),
            "annotated" => Some(SubmissionStatus::Annotated),
            "reported" => Some(SubmissionStatus::Reported),
            _ => None,
        }
    }

    /// Whether moving to `next` keeps the state machine monotonic.
    /// Re-entering the same annotated/reported state is allowed (re-annotate,
    /// re-generate); going back is not.
    pub fn can_advance_to(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (Uploaded, Annotated) | (Annotated, Annotated) | (Annotated, Reported) | (Reported, Reported)
        )
    }
}

/// A full screening submission as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub patient_info: PatientInfo,
    pub note: Option<String>,
    #[serde(flatten)]
    pub images: SubmissionImages,
    pub annotated_image_url: Option<String>,
    pub annotation_data: Vec<Annotation>,
    pub status: SubmissionStatus,
    pub report_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
