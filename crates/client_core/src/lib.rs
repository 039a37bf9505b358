//! Client-side core of the judge submission workbench.
//!
//! [`Workbench`] owns the in-memory [`SubmissionList`], keeps it durably
//! synchronized with a [`StateStore`] on every mutation, and drives the
//! asynchronous submit protocol against a [`JudgeClient`]. The view layer
//! calls the operations here and renders from [`Workbench::snapshot`] and
//! the broadcast event stream.

use std::{collections::HashSet, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{GradingReport, Submission, SubmissionId},
    protocol::SubmitRequest,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod judge;
mod store;
pub mod submissions;

pub use judge::{HttpJudgeClient, JudgeClient, JudgeError, MissingJudgeClient};
pub use submissions::{AddOutcome, SubmissionList};

/// Store key holding the serialized submission list.
pub const SUBMISSIONS_KEY: &str = "submissions";
/// Store key holding the serialized selected index.
pub const SELECTED_KEY: &str = "selected";

/// Per-user key-value store the workbench persists through.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user: &str, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set(&self, user: &str, key: &str, value: &serde_json::Value) -> Result<()>;
}

pub struct MissingStateStore;

#[async_trait]
impl StateStore for MissingStateStore {
    async fn get(&self, _user: &str, key: &str) -> Result<Option<serde_json::Value>> {
        Err(anyhow!("state store unavailable (key {key})"))
    }

    async fn set(&self, _user: &str, key: &str, _value: &serde_json::Value) -> Result<()> {
        Err(anyhow!("state store unavailable (key {key})"))
    }
}

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("no submission is selected")]
    NoSelection,
    #[error("submission is already awaiting a judge response")]
    SubmitInFlight,
    #[error(transparent)]
    Judge(#[from] JudgeError),
    #[error("failed to persist workbench state: {0}")]
    Store(anyhow::Error),
}

/// Rendering snapshot handed to the view layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbenchSnapshot {
    pub submissions: Vec<Submission>,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum WorkbenchEvent {
    /// Emitted after every durable state transition.
    StateChanged(WorkbenchSnapshot),
    /// The judge accepted a submission; grading is pending.
    SubmissionQueued { id: SubmissionId, problem: String },
    /// User-facing submit failure notification.
    SubmitFailed { id: SubmissionId, detail: String },
}

pub struct Workbench {
    user: String,
    store: Arc<dyn StateStore>,
    judge: Arc<dyn JudgeClient>,
    state: Mutex<SubmissionList>,
    inflight: Mutex<HashSet<SubmissionId>>,
    events: broadcast::Sender<WorkbenchEvent>,
}

impl Workbench {
    /// The acting user identity is explicit construction-time configuration;
    /// it scopes every store read and write.
    pub fn new(
        user: impl Into<String>,
        store: Arc<dyn StateStore>,
        judge: Arc<dyn JudgeClient>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            user: user.into(),
            store,
            judge,
            state: Mutex::new(SubmissionList::default()),
            inflight: Mutex::new(HashSet::new()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkbenchEvent> {
        self.events.subscribe()
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Seeds the in-memory list from the store. Runs at startup and is safe
    /// to call again as a resynchronization step; a persisted selection that
    /// no longer fits the list is dropped.
    pub async fn load(&self) -> Result<(), WorkbenchError> {
        let entries: Vec<Submission> = match self
            .store
            .get(&self.user, SUBMISSIONS_KEY)
            .await
            .map_err(WorkbenchError::Store)?
        {
            Some(value) => serde_json::from_value(value)
                .context("corrupt persisted submission list")
                .map_err(WorkbenchError::Store)?,
            None => Vec::new(),
        };
        let selected: Option<usize> = match self
            .store
            .get(&self.user, SELECTED_KEY)
            .await
            .map_err(WorkbenchError::Store)?
        {
            Some(value) => serde_json::from_value(value)
                .context("corrupt persisted selection")
                .map_err(WorkbenchError::Store)?,
            None => None,
        };

        let mut state = self.state.lock().await;
        *state = SubmissionList::from_parts(entries, selected);
        info!(user = %self.user, count = state.len(), "loaded workbench state");
        let _ = self
            .events
            .send(WorkbenchEvent::StateChanged(snapshot_of(&state)));
        Ok(())
    }

    pub async fn snapshot(&self) -> WorkbenchSnapshot {
        snapshot_of(&*self.state.lock().await)
    }

    /// Replaces the selected submission's content and marks it saved.
    pub async fn edit(&self, content: impl Into<String>) -> Result<(), WorkbenchError> {
        let mut state = self.state.lock().await;
        let next = state.edit(content).ok_or(WorkbenchError::NoSelection)?;
        self.commit(&mut state, next).await
    }

    pub async fn select(&self, index: Option<usize>) -> Result<(), WorkbenchError> {
        let mut state = self.state.lock().await;
        let next = state.select(index);
        self.commit(&mut state, next).await
    }

    pub async fn remove(&self, index: usize) -> Result<(), WorkbenchError> {
        let mut state = self.state.lock().await;
        let next = state.remove(index);
        self.commit(&mut state, next).await
    }

    /// Adds a submission. `decide` arbitrates same-name collisions; when it
    /// declines, the existing entry is kept and nothing is persisted.
    pub async fn add<F>(&self, submission: Submission, decide: F) -> Result<AddOutcome, WorkbenchError>
    where
        F: FnOnce(&Submission, &Submission) -> bool,
    {
        let mut state = self.state.lock().await;
        let name = submission.name.clone();
        let (next, outcome) = state.add(submission, decide);
        if outcome == AddOutcome::KeptExisting {
            info!(user = %self.user, name = %name, "overwrite declined; keeping existing submission");
            return Ok(outcome);
        }
        self.commit(&mut state, next).await?;
        Ok(outcome)
    }

    pub async fn update_result(
        &self,
        index: usize,
        report: GradingReport,
    ) -> Result<(), WorkbenchError> {
        let mut state = self.state.lock().await;
        let next = state.record_result(index, report);
        self.commit(&mut state, next).await
    }

    /// Submits the currently selected submission to the judge.
    ///
    /// The submission's stable id is captured before the request goes out;
    /// the success continuation re-resolves it by identity, so mutations
    /// that happen while the request is in flight can never route the
    /// transition to the wrong entry. A second
    /// submit for the same submission while one is pending is rejected.
    ///
    /// On any failure (transport error, non-success status, or a body that
    /// is not the literal `true`) the state is left untouched, a
    /// [`WorkbenchEvent::SubmitFailed`] notification is emitted, and
    /// `recover` runs exactly once so the caller can re-enable its controls.
    pub async fn submit<F>(&self, recover: F) -> Result<(), WorkbenchError>
    where
        F: FnOnce() + Send,
    {
        let (id, request) = {
            let state = self.state.lock().await;
            let submission = state.selected().ok_or(WorkbenchError::NoSelection)?;
            (submission.id, SubmitRequest::for_submission(submission))
        };

        if !self.inflight.lock().await.insert(id) {
            return Err(WorkbenchError::SubmitInFlight);
        }

        let problem = request.problem.clone();
        let outcome = self.judge.submit(request).await;
        self.inflight.lock().await.remove(&id);

        match outcome {
            Ok(()) => {
                let mut state = self.state.lock().await;
                match state.position_of(id) {
                    Some(index) => {
                        let next = state.mark_submitted(index);
                        self.commit(&mut state, next).await?;
                        info!(user = %self.user, problem = %problem, "submission queued for grading");
                        let _ = self
                            .events
                            .send(WorkbenchEvent::SubmissionQueued { id, problem });
                        Ok(())
                    }
                    None => {
                        warn!(
                            user = %self.user,
                            problem = %problem,
                            "submission deleted while awaiting judge; dropping transition"
                        );
                        Ok(())
                    }
                }
            }
            Err(err) => {
                let detail = err.to_string();
                warn!(user = %self.user, problem = %problem, %detail, "submit failed");
                let _ = self.events.send(WorkbenchEvent::SubmitFailed {
                    id,
                    detail,
                });
                recover();
                Err(err.into())
            }
        }
    }

    /// Write-through commit: the new list is persisted before it becomes
    /// visible in memory, and the state lock is held across the write so no
    /// later operation can observe an unpersisted transition.
    async fn commit(
        &self,
        state: &mut SubmissionList,
        next: SubmissionList,
    ) -> Result<(), WorkbenchError> {
        self.persist(&next).await?;
        *state = next;
        let _ = self
            .events
            .send(WorkbenchEvent::StateChanged(snapshot_of(state)));
        Ok(())
    }

    async fn persist(&self, list: &SubmissionList) -> Result<(), WorkbenchError> {
        let submissions = serde_json::to_value(list.entries())
            .context("failed to serialize submission list")
            .map_err(WorkbenchError::Store)?;
        let selected = serde_json::to_value(list.selected_index())
            .context("failed to serialize selection")
            .map_err(WorkbenchError::Store)?;
        self.store
            .set(&self.user, SUBMISSIONS_KEY, &submissions)
            .await
            .map_err(WorkbenchError::Store)?;
        self.store
            .set(&self.user, SELECTED_KEY, &selected)
            .await
            .map_err(WorkbenchError::Store)?;
        Ok(())
    }
}

fn snapshot_of(list: &SubmissionList) -> WorkbenchSnapshot {
    WorkbenchSnapshot {
        submissions: list.entries().to_vec(),
        selected: list.selected_index(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
