//! Local JSON file source.

use super::{extract_rows, DataProxy};
use crate::error::ProxyError;
use crate::model::RawRow;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads rows from a JSON document on disk
#[derive(Debug, Clone)]
pub struct FileProxy {
    path: PathBuf,
    rows_key: Option<String>,
}

impl FileProxy {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows_key: None,
        }
    }

    /// Object key holding the rows array
    pub fn with_rows_key(mut self, rows_key: Option<String>) -> Self {
        self.rows_key = rows_key;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataProxy for FileProxy {
    async fn load(&self) -> Result<Vec<RawRow>, ProxyError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ProxyError::Io {
                path: self.describe(),
                source,
            })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Read row file");
        let document = serde_json::from_slice(&bytes)?;
        extract_rows(document, self.rows_key.as_deref())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
