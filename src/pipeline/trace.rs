//! Trace log store: one entry per stage execution.
//!
//! Entries are appended when a stage starts and finished exactly once,
//! with success or error. Nothing is ever removed.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TraceError;
use crate::pipeline::stage::Stage;

/// Status of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Running,
    Success,
    Error,
}

/// A metadata value: a scalar or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for MetaValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u64> for MetaValue {
    fn from(i: u64) -> Self {
        Self::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetaValue {
    fn from(i: usize) -> Self {
        Self::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Metadata attached to a finished entry. Ordered for stable rendering.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Build a metadata map from key/value pairs.
pub fn metadata<const N: usize>(pairs: [(&str, MetaValue); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// One stage execution as shown on the trace panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLogEntry {
    pub id: Uuid,
    pub stage: Stage,
    pub agent_name: String,
    pub emoji: String,
    pub started_at: DateTime<Utc>,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Result payload on success, raw error text on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl StageLogEntry {
    fn running(stage: Stage, input: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            agent_name: stage.display_name().to_string(),
            emoji: stage.emoji().to_string(),
            started_at: Utc::now(),
            status: StageStatus::Running,
            input,
            output: None,
            metadata: Metadata::new(),
            duration_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == StageStatus::Running
    }
}

/// Append-only store of log entries, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceLog {
    entries: Vec<StageLogEntry>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a running entry for `stage`. Returns the entry.
    pub fn start(&mut self, stage: Stage, input: Option<String>) -> &StageLogEntry {
        self.entries.push(StageLogEntry::running(stage, input));
        &self.entries[self.entries.len() - 1]
    }

    /// Mark a running entry successful.
    pub fn succeed(
        &mut self,
        id: Uuid,
        output: impl Into<String>,
        metadata: Metadata,
        duration: Duration,
    ) -> Result<&StageLogEntry, TraceError> {
        let entry = self.running_entry_mut(id)?;
        entry.status = StageStatus::Success;
        entry.output = Some(output.into());
        entry.metadata = metadata;
        entry.duration_ms = Some(duration_ms(duration));
        Ok(&*entry)
    }

    /// Mark a running entry failed, keeping the raw error text.
    pub fn fail(
        &mut self,
        id: Uuid,
        error: impl Into<String>,
        duration: Duration,
    ) -> Result<&StageLogEntry, TraceError> {
        let entry = self.running_entry_mut(id)?;
        entry.status = StageStatus::Error;
        entry.output = Some(error.into());
        entry.duration_ms = Some(duration_ms(duration));
        Ok(&*entry)
    }

    pub fn get(&self, id: Uuid) -> Option<&StageLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[StageLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn running_entry_mut(&mut self, id: Uuid) -> Result<&mut StageLogEntry, TraceError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(TraceError::NotFound { id })?;
        if !entry.is_running() {
            return Err(TraceError::AlreadyFinished { id });
        }
        Ok(entry)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
