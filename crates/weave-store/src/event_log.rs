//! Append-only JSONL persistence for [`crate::InMemoryStore`].
//!
//! Grounded on the reference codebase's `MemoryEventLog`: every mutating
//! operation is appended as one JSON line; `load` replays the whole log on
//! startup; `overwrite` is used for compaction (e.g. after
//! `process_post_turn` drops a lot of now-irrelevant events) via a crash-safe
//! `.tmp` + rename.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use weave_core::{ContextData, Flag, Turn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    ContextItemUpserted(ContextData),
    TurnCommitted(Turn),
    FlagUpserted(Flag),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggedEvent {
    occurred_at: DateTime<Utc>,
    event: StoreEvent,
}

#[derive(Debug, Clone)]
pub struct StoreEventLog {
    path: PathBuf,
}

impl StoreEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, event: StoreEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let logged = LoggedEvent {
            occurred_at: Utc::now(),
            event,
        };
        let line = serde_json::to_string(&logged)?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    /// Atomically replace the event log with a new set of events. A crash
    /// before the rename leaves the original file untouched.
    pub async fn overwrite(&self, events: &[StoreEvent]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("jsonl.tmp");
        let write_result: Result<()> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await?;
            for event in events {
                let logged = LoggedEvent {
                    occurred_at: Utc::now(),
                    event: event.clone(),
                };
                let line = serde_json::to_string(&logged)?;
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<StoreEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::OpenOptions::new().read(true).open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for (line_idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LoggedEvent>(&line) {
                Ok(logged) => events.push(logged.event),
                Err(err) => {
                    tracing::warn!(line = line_idx + 1, error = %err, path = %self.path.display(), "corrupt event-log line — skipping");
                }
            }
        }
        Ok(events)
    }
}
