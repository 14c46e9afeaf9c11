//! Result repositories: in-memory and JSON-on-disk.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::ResultRecord;
use crate::traits::ResultRepository;

/// Keeps results in process memory. Useful for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryResultRepository {
    records: Mutex<Vec<ResultRecord>>,
}

impl InMemoryResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultRepository for InMemoryResultRepository {
    async fn save(&self, record: &ResultRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        match records.iter_mut().find(|r| r.session_id == record.session_id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ResultRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ResultRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.completed_at);
        Ok(out)
    }
}

/// Stores each result as `<dir>/<session_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    dir: PathBuf,
}

impl JsonResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        let name: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

/// Save a record as pretty JSON, creating parent directories.
pub async fn save_record(record: &ResultRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("failed to serialize result")?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write result to {}", path.display()))?;
    Ok(())
}

/// Load a record saved by [`save_record`].
pub async fn load_record(path: &Path) -> Result<ResultRecord> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read result from {}", path.display()))?;
    let record: ResultRecord = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse result JSON in {}", path.display()))?;
    Ok(record)
}

#[async_trait]
impl ResultRepository for JsonResultStore {
    async fn save(&self, record: &ResultRecord) -> Result<()> {
        let path = self.path_for(&record.session_id);
        save_record(record, &path).await?;
        tracing::debug!(path = %path.display(), "result saved");
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ResultRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to read results directory {}", self.dir.display()))?;

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_record(&path).await {
                Ok(record) if record.user_id == user_id => out.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable result {}: {e:#}", path.display()),
            }
        }
        out.sort_by_key(|r| r.completed_at);
        Ok(out)
    }
}
