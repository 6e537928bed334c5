//! Classifies a raw service response before any state is touched.
//!
//! A response is either a failure, a deferred task that must be polled, or an
//! immediate result. Endpoints that answer with a flat payload (message, path,
//! result_path at the top level) are accepted as immediate results.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::protocol::{is_truthy, task_id, text_field};

/// Top-level keys the dashboard knows how to read from a flat payload.
const KNOWN_FLAT_KEYS: &[&str] = &["message", "path", "result_path"];

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The service queued a job; poll it to get the outcome.
    Deferred(String),
    /// The outcome is already here.
    Immediate(Value),
}

/// Classify one HTTP response.
pub fn normalize(status: StatusCode, body: &[u8]) -> Result<Normalized, ApiError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| text_field(&v, "message"))
            .unwrap_or_else(|| fallback_message(status));
        return Err(ApiError::remote(Some(status.as_u16()), message));
    }

    let data: Value = serde_json::from_slice(body)?;

    if let Some(id) = task_id(&data) {
        debug!("response deferred to task {}", id);
        return Ok(Normalized::Deferred(id));
    }

    if let Some(result) = data.get("result").filter(|v| is_truthy(v)) {
        return Ok(Normalized::Immediate(result.clone()));
    }

    if !has_known_shape(&data) {
        warn!("unrecognized response shape, using body as result: {}", data);
    }
    Ok(Normalized::Immediate(data))
}

fn fallback_message(status: StatusCode) -> String {
    format!(
        "Error: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

fn has_known_shape(data: &Value) -> bool {
    match data.as_object() {
        Some(obj) => KNOWN_FLAT_KEYS.iter().any(|k| obj.contains_key(*k)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn test_error_status_uses_server_message() {
        let r = normalize(
            StatusCode::BAD_REQUEST,
            &body(json!({"message": "Model name missing"})),
        );
        assert_eq!(
            r,
            Err(ApiError::remote(Some(400), "Model name missing"))
        );
    }

    #[test]
    fn test_error_status_without_message_falls_back_to_status_line() {
        let r = normalize(StatusCode::INTERNAL_SERVER_ERROR, b"<html>boom</html>");
        assert_eq!(
            r,
            Err(ApiError::remote(Some(500), "Error: 500 Internal Server Error"))
        );
    }

    #[test]
    fn test_error_status_wins_over_task_id() {
        for code in [400u16, 404, 422, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            let r = normalize(status, &body(json!({"task_id": "t1", "result": {"x": 1}})));
            assert!(matches!(r, Err(ApiError::Remote { status: Some(c), .. }) if c == code));
        }
    }

    #[test]
    fn test_task_id_defers() {
        let r = normalize(
            StatusCode::ACCEPTED,
            &body(json!({"task_id": "abc-123", "result": {"message": "ignored"}})),
        );
        assert_eq!(r, Ok(Normalized::Deferred("abc-123".to_string())));
    }

    #[test]
    fn test_nested_result_is_unwrapped() {
        let r = normalize(
            StatusCode::OK,
            &body(json!({"result": {"message": "Model loaded"}})),
        );
        assert_eq!(r, Ok(Normalized::Immediate(json!({"message": "Model loaded"}))));
    }

    #[test]
    fn test_flat_body_is_the_result() {
        let flat = json!({"message": "Uploaded", "path": "uploads/data.csv"});
        let r = normalize(StatusCode::OK, &body(flat.clone()));
        assert_eq!(r, Ok(Normalized::Immediate(flat)));
    }

    #[test]
    fn test_unknown_shape_still_resolves() {
        let odd = json!({"weird": true});
        assert_eq!(
            normalize(StatusCode::OK, &body(odd.clone())),
            Ok(Normalized::Immediate(odd))
        );
    }

    #[test]
    fn test_malformed_success_body_is_transport_error() {
        let r = normalize(StatusCode::OK, b"not json");
        assert!(matches!(r, Err(ApiError::Transport(_))));
    }
}
