//! Shared state handed to API handlers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db;
use crate::fetch::HttpImageFetcher;
use crate::report::ReportComposer;
use crate::sink::LocalDirSink;

use super::error::ApiError;

/// Application context cloned into every handler.
///
/// SQLite connections are opened per request against a shared database
/// file; the composer and the in-flight report set are shared.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    pub composer: Arc<ReportComposer<HttpImageFetcher, LocalDirSink>>,
    report_flights: Arc<Mutex<HashSet<String>>>,
}

impl ApiContext {
    pub fn new(
        db_path: PathBuf,
        composer: ReportComposer<HttpImageFetcher, LocalDirSink>,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path),
            composer: Arc::new(composer),
            report_flights: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Claims the report-generation slot for a submission.
    ///
    /// Returns `None` while another request is already composing a report
    /// for the same submission; the returned guard releases the slot on
    /// drop, including on error paths.
    pub fn try_begin_report(&self, submission_id: &str) -> Option<ReportFlight> {
        let mut flights = self
            .report_flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !flights.insert(submission_id.to_string()) {
            return None;
        }

        Some(ReportFlight {
            submission_id: submission_id.to_string(),
            flights: Arc::clone(&self.report_flights),
        })
    }
}

/// RAII guard for a single in-flight report generation.
pub struct ReportFlight {
    submission_id: String,
    flights: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ReportFlight {
    fn drop(&mut self) {
        let mut flights = self
            .flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        flights.remove(&self.submission_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn test_context() -> ApiContext {
        let tmp = std::env::temp_dir().join(format!("dentascreen-ctx-{}", uuid::Uuid::new_v4()));
        let composer = ReportComposer::new(
            HttpImageFetcher::default(),
            LocalDirSink::new(tmp.clone(), config::REPORTS_PUBLIC_PREFIX),
        );
        ApiContext::new(tmp.join("test.db"), composer)
    }

    #[test]
    fn second_flight_for_same_submission_is_rejected() {
        let ctx = test_context();
        let first = ctx.try_begin_report("sub-1");
        assert!(first.is_some());
        assert!(ctx.try_begin_report("sub-1").is_none());
    }

    #[test]
    fn flights_for_different_submissions_coexist() {
        let ctx = test_context();
        let _a = ctx.try_begin_report("sub-1").unwrap();
        assert!(ctx.try_begin_report("sub-2").is_some());
    }

    #[test]
    fn dropping_the_guard_releases_the_slot() {
        let ctx = test_context();
        {
            let _guard = ctx.try_begin_report("sub-1").unwrap();
        }
        assert!(ctx.try_begin_report("sub-1").is_some());
    }
}
