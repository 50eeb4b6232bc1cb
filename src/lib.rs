//! DentaScreen backend: dental screening submissions, admin annotation,
//! and PDF report composition.
//!
//! The core is the report pipeline in [`report`]: fetch the submission's
//! photos, lay out an A4 screening report (image panels, caption pills,
//! findings legend, treatment recommendations), store the document through
//! a [`sink::ReportSink`], and persist the resulting URL on the
//! submission. The HTTP surface in [`api`] drives that pipeline.

pub mod api;
pub mod config;
pub mod db;
pub mod fetch;
pub mod models;
pub mod report;
pub mod sink;
