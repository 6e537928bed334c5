//! Task poller: drives one server-side job to a terminal state.
//!
//! The loop asks `GET /task_status/{id}` until the job leaves PENDING/STARTED,
//! sleeping a fixed interval between attempts. There is no retry budget: a
//! transport failure on any attempt ends the poll, and so does cancellation of
//! the token owned by the requesting action.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::error::ApiError;
use crate::protocol::{TaskState, TaskStatus, TASK_STATUS_PATH};

/// Observer for non-terminal states (one call per reschedule).
pub type ProgressFn<'a> = &'a (dyn Fn(&TaskState) + Send + Sync);

/// What one status answer means for the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Still queued or running; ask again after the interval.
    Reschedule(TaskState),
    /// Terminal: the job's result, or why it failed.
    Settled(Result<Value, ApiError>),
}

/// Map one status answer onto the task state machine.
pub fn classify(status: TaskStatus) -> PollStep {
    if !status.state.is_terminal() {
        return PollStep::Reschedule(status.state);
    }
    match (&status.state, status.result.as_ref()) {
        (TaskState::Success, Some(result)) => PollStep::Settled(Ok(result.clone())),
        _ => PollStep::Settled(Err(ApiError::remote(None, status.failure_message()))),
    }
}

#[derive(Debug, Clone)]
pub struct TaskPoller {
    http: reqwest::Client,
    base_url: String,
    interval: Duration,
    timeout: Option<Duration>,
}

impl TaskPoller {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, polling: &PollingConfig) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            interval: polling.interval(),
            timeout: polling.timeout(),
        }
    }

    /// Single status query. Does not look at the HTTP status code: the status
    /// endpoint reports failures in its body.
    pub async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        let url = format!("{}{}/{}", self.base_url, TASK_STATUS_PATH, task_id);
        let resp = self.http.get(&url).send().await?;
        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        Ok(TaskStatus::from_value(&body))
    }

    /// Poll `task_id` until it settles, fails to answer, times out, or `cancel` fires.
    pub async fn poll(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Value, ApiError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("task {}: cancelled before attempt {}", task_id, attempts);
                    return Err(ApiError::Cancelled);
                }
                status = self.fetch_status(task_id) => status,
            };

            let status = match status {
                Ok(s) => s,
                Err(e) => {
                    warn!("task {}: status query failed: {}", task_id, e);
                    return Err(e);
                }
            };

            match classify(status) {
                PollStep::Settled(outcome) => {
                    match &outcome {
                        Ok(_) => info!("task {}: SUCCESS after {} attempt(s)", task_id, attempts),
                        Err(e) => warn!("task {}: failed: {}", task_id, e),
                    }
                    return outcome;
                }
                PollStep::Reschedule(state) => {
                    debug!("task {}: {} (attempt {})", task_id, state, attempts);
                    if let Some(cb) = on_progress {
                        cb(&state);
                    }
                    if let Some(limit) = self.timeout {
                        if started.elapsed() >= limit {
                            warn!("task {}: giving up after {:?}", task_id, limit);
                            return Err(ApiError::PollTimeout {
                                task_id: task_id.to_string(),
                                waited: limit,
                            });
                        }
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("task {}: cancelled while waiting", task_id);
                            return Err(ApiError::Cancelled);
                        }
                        _ = tokio::time::sleep(self.interval) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(v: Value) -> TaskStatus {
        TaskStatus::from_value(&v)
    }

    #[test]
    fn test_pending_and_started_reschedule() {
        assert_eq!(
            classify(status(json!({"state": "PENDING"}))),
            PollStep::Reschedule(TaskState::Pending)
        );
        assert_eq!(
            classify(status(json!({"state": "STARTED", "result": {"x": 1}}))),
            PollStep::Reschedule(TaskState::Started)
        );
    }

    #[test]
    fn test_success_with_result_settles_ok() {
        assert_eq!(
            classify(status(json!({"state": "SUCCESS", "result": {"x": 1}}))),
            PollStep::Settled(Ok(json!({"x": 1})))
        );
    }

    #[test]
    fn test_success_without_result_is_failure() {
        assert_eq!(
            classify(status(json!({"state": "SUCCESS"}))),
            PollStep::Settled(Err(ApiError::remote(None, "Unknown error")))
        );
    }

    #[test]
    fn test_failure_state_carries_message() {
        match classify(status(json!({"state": "FAILURE"}))) {
            PollStep::Settled(Err(e)) => assert!(!e.to_string().is_empty()),
            other => panic!("unexpected step: {:?}", other),
        }
        assert_eq!(
            classify(status(json!({"state": "FAILURE", "result": {"message": "bad csv"}}))),
            PollStep::Settled(Err(ApiError::remote(None, "bad csv")))
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_any_request() {
        // Unroutable base URL: reaching the network would be a transport error.
        let poller = TaskPoller::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            &PollingConfig::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let r = poller.poll("t1", &cancel, None).await;
        assert_eq!(r, Err(ApiError::Cancelled));
    }
}
