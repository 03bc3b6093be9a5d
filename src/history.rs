//! Posting history persisted as a single JSON document.
//!
//! The file is read in full on every access and rewritten in full on every
//! append. There is no locking: two overlapping runs can lose one of their
//! appends (last writer wins), and a crash in the middle of a write can leave
//! a truncated file behind.
//!
//! # File Layout
//!
//! ```text
//! data/
//! └── clusters.json   # { "categories": [...], "history": [...] }
//! ```

use chrono::{SubsecRound, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use crate::error::HistoryError;
use crate::models::{Category, HistoryDocument, HistoryRecord};

/// Default location of the history file, relative to the working directory.
pub const DEFAULT_HISTORY_PATH: &str = "data/clusters.json";

/// Category recorded for pipeline posts.
pub const DEFAULT_CATEGORY: &str = "General";

/// Pillar recorded for pipeline posts.
pub const DEFAULT_PILLAR: &str = "Trend";

/// Category names written into a freshly created document.
pub const SEED_CATEGORIES: [&str; 3] = ["Economy & Finance", "IT & Technology", "Crypto & Blockchain"];

/// The document written on first access.
pub fn seed_document() -> HistoryDocument {
    HistoryDocument {
        categories: SEED_CATEGORIES
            .iter()
            .map(|name| Category {
                name: (*name).to_string(),
                pillars: Vec::new(),
            })
            .collect(),
        history: Vec::new(),
    }
}

/// File-backed history of posted topics.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, creating and persisting the seed document if the
    /// file does not exist yet.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<HistoryDocument, HistoryError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| HistoryError::Malformed {
                path: self.path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let doc = seed_document();
                self.write(&doc).await?;
                info!(path = %self.path.display(), "Initialized new history file");
                Ok(doc)
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Record a posted topic with the current timestamp.
    #[instrument(level = "info", skip_all, fields(%topic, %category, %pillar))]
    pub async fn append(
        &self,
        topic: &str,
        category: &str,
        pillar: &str,
    ) -> Result<HistoryRecord, HistoryError> {
        let mut doc = self.load().await?;
        let record = HistoryRecord {
            date: Utc::now().trunc_subsecs(3),
            topic: topic.to_string(),
            category: category.to_string(),
            pillar: pillar.to_string(),
        };
        doc.history.push(record.clone());
        self.write(&doc).await?;
        info!(total = doc.history.len(), "Appended topic to history");
        Ok(record)
    }

    /// Titles of every recorded post, oldest first.
    pub async fn posted_titles(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self.load().await?.posted_titles())
    }

    async fn write(&self, doc: &HistoryDocument) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(doc).map_err(|source| HistoryError::Malformed {
            path: self.path.display().to_string(),
            source,
        })?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
