//! Report composition pipeline: fetch submission images, lay out the A4
//! screening report, store it through a sink, and persist the outcome.

pub mod composer;
pub mod findings;
pub mod geometry;
pub mod pdf;

pub use composer::{generate_report, persist_report_url, ComposedReport, ReportComposer};
pub use findings::{unique_labels, FindingTables};
pub use geometry::PageGeometry;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::sink::SinkError;

/// Typed failure modes of the compose pipeline.
///
/// A fetch failure aborts the whole operation before any document is
/// emitted; a partial report is never produced. `PersistFailed` is the one
/// state that leaves an orphaned artifact in the sink, which is why it is
/// logged at error severity and retried once before surfacing.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("submission not found or not yet annotated")]
    PrerequisiteNotMet,

    #[error("required image could not be fetched: {0}")]
    AssetFetchFailed(#[from] FetchError),

    #[error("generated report could not be stored: {0}")]
    SinkUploadFailed(#[from] SinkError),

    #[error("report stored at {url} but submission update failed: {reason}")]
    PersistFailed { url: String, reason: String },

    #[error("report rendering failed: {0}")]
    Render(String),
}
