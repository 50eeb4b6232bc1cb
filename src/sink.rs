//! Durable storage for finished reports.
//!
//! One sink per deployment: the default writes to a local reports directory
//! served statically, returning a relative URL. A remote object-store sink
//! can implement the same trait.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to store report {file_name}: {reason}")]
    Store { file_name: String, reason: String },
}

/// Accepts finished document bytes and returns a durable, resolvable URL.
pub trait ReportSink: Send + Sync {
    fn store(&self, bytes: &[u8], file_name: &str) -> Result<String, SinkError>;
}

/// Writes reports under a local directory and returns `{prefix}/{file}` URLs.
pub struct LocalDirSink {
    root: PathBuf,
    public_prefix: String,
}

impl LocalDirSink {
    pub fn new(root: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self {
            root,
            public_prefix: public_prefix.into(),
        }
    }
}

impl ReportSink for LocalDirSink {
    fn store(&self, bytes: &[u8], file_name: &str) -> Result<String, SinkError> {
        std::fs::create_dir_all(&self.root).map_err(|e| SinkError::Store {
            file_name: file_name.to_string(),
            reason: format!("cannot create reports dir: {e}"),
        })?;

        let path = self.root.join(file_name);
        std::fs::write(&path, bytes).map_err(|e| SinkError::Store {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "report written to local sink");
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}
