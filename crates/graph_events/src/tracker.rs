use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::events::ToolOutcome;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ToolCallStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl ToolCallStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ToolCallStatus::Success | ToolCallStatus::Error)
    }
}

impl From<ToolOutcome> for ToolCallStatus {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            ToolOutcome::Success => ToolCallStatus::Success,
            ToolOutcome::Error => ToolCallStatus::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub args: Value,
    pub node: Option<String>,
    pub status: ToolCallStatus,
    /// Present once the call is resolved.
    pub result: Option<Value>,
    /// `None` for results that arrived without a prior start.
    pub started_at: Option<Instant>,
}

/// How a tool result related to the recorded calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Resolved a pending or running call.
    Matched { elapsed: Duration },
    /// No call was recorded for this id; a resolved record was created.
    Unmatched,
    /// The id was already resolved; nothing changed.
    AlreadyResolved,
}

impl Resolution {
    /// True when a ToolCallEnd should be emitted for this result.
    pub fn is_new(&self) -> bool {
        !matches!(self, Resolution::AlreadyResolved)
    }

    pub fn duration_ms(&self) -> Option<f64> {
        match self {
            Resolution::Matched { elapsed } => Some(elapsed.as_secs_f64() * 1000.0),
            _ => None,
        }
    }
}

/// Call id → lifecycle record, for one parser instance.
///
/// Records are never removed (except by [`ToolCallTracker::clear`]) so a
/// repeated start or result for the same id is recognized and not re-emitted.
/// Not meant to be shared between concurrently parsed streams.
#[derive(Debug, Clone, Default)]
pub struct ToolCallTracker {
    records: Vec<ToolCallRecord>,
    by_id: HashMap<String, usize>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new pending call. Returns `false` if the id is already known.
    pub fn start(
        &mut self,
        id: &str,
        name: &str,
        args: &Value,
        node: Option<&str>,
    ) -> bool {
        if self.by_id.contains_key(id) {
            debug!(call_id = id, "tool call already recorded; not re-emitting start");
            return false;
        }
        self.insert(ToolCallRecord {
            id: id.to_string(),
            name: name.to_string(),
            args: args.clone(),
            node: node.map(str::to_string),
            status: ToolCallStatus::Pending,
            result: None,
            started_at: Some(Instant::now()),
        });
        true
    }

    /// Moves a pending call to running. Returns `false` if there was no pending call.
    pub fn mark_running(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(record) if record.status == ToolCallStatus::Pending => {
                record.status = ToolCallStatus::Running;
                true
            }
            _ => false,
        }
    }

    pub fn resolve(
        &mut self,
        id: &str,
        name: &str,
        result: &Value,
        outcome: ToolOutcome,
    ) -> Resolution {
        match self.get_mut(id) {
            Some(record) if record.status.is_resolved() => Resolution::AlreadyResolved,
            Some(record) => {
                record.status = outcome.into();
                record.result = Some(result.clone());
                let elapsed = record
                    .started_at
                    .map(|started| started.elapsed())
                    .unwrap_or_default();
                Resolution::Matched { elapsed }
            }
            None => {
                debug!(call_id = id, tool = name, "tool result without a recorded start");
                self.insert(ToolCallRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    args: Value::Null,
                    node: None,
                    status: outcome.into(),
                    result: Some(result.clone()),
                    started_at: None,
                });
                Resolution::Unmatched
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ToolCallRecord> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ToolCallRecord> {
        let idx = *self.by_id.get(id)?;
        self.records.get_mut(idx)
    }

    /// All records in creation order.
    pub fn records(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.records.iter()
    }

    /// Calls that have started but not resolved.
    pub fn unresolved(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.records
            .iter()
            .filter(|record| !record.status.is_resolved())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_id.clear();
    }

    fn insert(&mut self, record: ToolCallRecord) {
        self.by_id.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }
}
