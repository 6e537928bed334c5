//! Wire format of the forecasting service.
//!
//! Request bodies are strongly typed; response bodies stay as
//! `serde_json::Value` because the service has no fixed schema and the
//! normalizer has to accept flat, nested and task-style payloads alike.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LOAD_MODEL_PATH: &str = "/load_model";
pub const UPLOAD_DATASET_PATH: &str = "/upload_dataset";
pub const FINETUNE_PATH: &str = "/finetune";
pub const RUN_INFERENCE_PATH: &str = "/run_inference";
pub const TASK_STATUS_PATH: &str = "/task_status";

/// Multipart field carrying the CSV file.
pub const DATASET_FIELD: &str = "dataset";

/// The service only knows one user dataset slot.
pub const UPLOADED_DATASET_NAME: &str = "uploaded";

pub const MIN_EPOCHS: u32 = 1;
pub const MAX_EPOCHS: u32 = 10;

/// Clamp a user-entered epoch count into the range the service accepts.
pub fn clamp_epochs(epochs: i64) -> u32 {
    epochs.clamp(MIN_EPOCHS as i64, MAX_EPOCHS as i64) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadModelRequest {
    pub model_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinetuneRequest {
    pub model_name: String,
    pub dataset_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model_name: String,
    pub dataset_name: String,
    pub path: String,
    pub finetune: bool,
    pub epochs: u32,
}

/// Lifecycle state reported by `GET /task_status/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Started,
    Success,
    /// FAILURE, REVOKED, RETRY or anything else the worker reports.
    Other(String),
}

impl TaskState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => Self::Pending,
            "STARTED" => Self::Started,
            "SUCCESS" => Self::Success,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Other(s) => s,
        }
    }

    /// PENDING and STARTED keep the poller going; everything else settles the task.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Started)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded answer of the task-status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    pub result: Option<Value>,
    pub status: Option<String>,
}

impl TaskStatus {
    pub fn from_value(body: &Value) -> Self {
        let state = body
            .get("state")
            .and_then(Value::as_str)
            .map(TaskState::parse)
            .unwrap_or_else(|| TaskState::Other(String::new()));
        let result = body.get("result").filter(|v| is_truthy(v)).cloned();
        Self {
            state,
            result,
            status: text_field(body, "status"),
        }
    }

    /// Human-readable reason for a failed task: `result.message`, then
    /// `status`, then a generic fallback.
    pub fn failure_message(&self) -> String {
        self.result
            .as_ref()
            .and_then(|r| text_field(r, "message"))
            .or_else(|| self.status.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""` are falsy; objects and arrays are truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A non-empty textual field. Non-string truthy scalars are rendered as text.
pub fn text_field(v: &Value, key: &str) -> Option<String> {
    let field = v.get(key)?;
    if !is_truthy(field) {
        return None;
    }
    match field {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Task id of a deferred response, if the body carries one.
pub fn task_id(body: &Value) -> Option<String> {
    match body.get("task_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_state_parse() {
        assert_eq!(TaskState::parse("PENDING"), TaskState::Pending);
        assert_eq!(TaskState::parse("STARTED"), TaskState::Started);
        assert_eq!(TaskState::parse("SUCCESS"), TaskState::Success);
        assert_eq!(
            TaskState::parse("FAILURE"),
            TaskState::Other("FAILURE".to_string())
        );
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Started.is_terminal());
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::parse("REVOKED").is_terminal());
    }

    #[test]
    fn test_failure_message_precedence() {
        let s = TaskStatus::from_value(&json!({
            "state": "FAILURE",
            "result": {"message": "CUDA out of memory"},
            "status": "failed"
        }));
        assert_eq!(s.failure_message(), "CUDA out of memory");

        let s = TaskStatus::from_value(&json!({"state": "FAILURE", "status": "worker lost"}));
        assert_eq!(s.failure_message(), "worker lost");

        let s = TaskStatus::from_value(&json!({"state": "FAILURE"}));
        assert_eq!(s.failure_message(), "Unknown error");
    }

    #[test]
    fn test_missing_state_is_terminal() {
        let s = TaskStatus::from_value(&json!({"result": {"x": 1}}));
        assert!(s.state.is_terminal());
        assert_ne!(s.state, TaskState::Success);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
    }

    #[test]
    fn test_task_id_extraction() {
        assert_eq!(task_id(&json!({"task_id": "abc"})), Some("abc".to_string()));
        assert_eq!(task_id(&json!({"task_id": ""})), None);
        assert_eq!(task_id(&json!({"task_id": 42})), Some("42".to_string()));
        assert_eq!(task_id(&json!({"message": "ok"})), None);
    }

    #[test]
    fn test_epochs_clamped() {
        assert_eq!(clamp_epochs(0), 1);
        assert_eq!(clamp_epochs(-3), 1);
        assert_eq!(clamp_epochs(7), 7);
        assert_eq!(clamp_epochs(250), 10);
    }

    #[test]
    fn test_inference_request_wire_shape() {
        let req = InferenceRequest {
            model_name: "LPTM".to_string(),
            dataset_name: UPLOADED_DATASET_NAME.to_string(),
            path: "uploads/x.csv".to_string(),
            finetune: true,
            epochs: 3,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model_name": "LPTM",
                "dataset_name": "uploaded",
                "path": "uploads/x.csv",
                "finetune": true,
                "epochs": 3
            })
        );
    }
}
