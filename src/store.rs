// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Persistence for accepted submissions.
//!
//! The store owns identity: it assigns the record id and creation timestamp.
//! Records are only ever created, never updated or deleted.

use crate::error::StoreError;
use crate::submission::Submission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Identity assigned by the store at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted submission with its assigned identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: Submission,
}

/// Write-once record store.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist `submission`, returning its new identity.
    async fn create(&self, submission: &Submission) -> Result<StoredRecord, StoreError>;
}

fn assign_identity() -> StoredRecord {
    StoredRecord {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
    }
}

/// Store holding records in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, StoredSubmission>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by id.
    #[cfg(test)]
    async fn get(&self, id: &str) -> Option<StoredSubmission> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of stored records.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, submission: &Submission) -> Result<StoredRecord, StoreError> {
        let record = assign_identity();
        let stored = StoredSubmission {
            id: record.id.clone(),
            created_at: record.created_at,
            submission: submission.clone(),
        };
        self.records.write().await.insert(record.id.clone(), stored);
        debug!(id = %record.id, kind = %submission.kind(), "Stored submission in memory");
        Ok(record)
    }
}

/// Store appending one JSON object per line to a file.
pub struct JsonlStore {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlStore {
    /// Open (or create) the file at `path` for appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path.display(), "Opened submission log");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SubmissionStore for JsonlStore {
    async fn create(&self, submission: &Submission) -> Result<StoredRecord, StoreError> {
        let record = assign_identity();
        let mut line = serde_json::to_vec(&StoredSubmission {
            id: record.id.clone(),
            created_at: record.created_at,
            submission: submission.clone(),
        })?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(record)
    }
}
