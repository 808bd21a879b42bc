//! Named, nestable units of work inside a scenario.
//!
//! A [`StepRecorder`] is cheap to clone; every clone appends to the same
//! record list. Records are kept in start order, so a parent step always
//! precedes the steps it encloses.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::result::PortalResult;

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Body returned `Ok`
    Passed,
    /// Body returned `Err`
    Failed,
}

/// One finished (or running) step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// Nesting depth; top-level steps are 0
    pub depth: usize,
    /// Outcome
    pub status: StepStatus,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Error message when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct RecorderState {
    records: Vec<StepRecord>,
    depth: usize,
}

/// Shared step log for one scenario
#[derive(Debug, Clone, Default)]
pub struct StepRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl StepRecorder {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `body` as the step `name`.
    ///
    /// Steps started inside `body` through any clone of this recorder are
    /// recorded one level deeper. The body's result is returned unchanged.
    pub async fn step<T, F, Fut>(&self, name: &str, body: F) -> PortalResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        let (index, depth) = {
            let mut state = self.lock();
            let depth = state.depth;
            state.depth += 1;
            state.records.push(StepRecord {
                name: name.to_string(),
                depth,
                status: StepStatus::Passed,
                duration_ms: 0,
                error: None,
            });
            (state.records.len() - 1, depth)
        };

        let span = tracing::info_span!("step", step = name, depth);
        let start = Instant::now();
        let result = body().instrument(span).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        {
            let mut state = self.lock();
            state.depth = state.depth.saturating_sub(1);
            if let Some(record) = state.records.get_mut(index) {
                record.duration_ms = duration_ms;
                if let Err(e) = &result {
                    record.status = StepStatus::Failed;
                    record.error = Some(e.to_string());
                }
            }
        }

        match &result {
            Ok(_) => tracing::info!(step = name, duration_ms, "step passed"),
            Err(e) => tracing::warn!(step = name, duration_ms, error = %e, "step failed"),
        }
        result
    }

    /// Snapshot of every record so far
    #[must_use]
    pub fn records(&self) -> Vec<StepRecord> {
        self.lock().records.clone()
    }

    /// Number of steps started
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// No step started yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
