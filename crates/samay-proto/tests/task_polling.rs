mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::mock_service::{MockService, Reply};
use samay_proto::config::PollingConfig;
use samay_proto::controller::ActionRequest;
use samay_proto::error::ApiError;
use samay_proto::poller::{ProgressFn, TaskPoller};
use samay_proto::protocol::{LoadModelRequest, TaskState};

fn load_lptm() -> ActionRequest {
    ActionRequest::LoadModel(LoadModelRequest {
        model_name: "LPTM".to_string(),
    })
}

#[tokio::test]
async fn deferred_task_settles_once_with_result() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::task("t-1"));
    svc.task_statuses(vec![
        Reply::json(json!({ "state": "PENDING" })),
        Reply::json(json!({ "state": "STARTED" })),
        Reply::json(json!({ "state": "SUCCESS", "result": { "x": 1 } })),
    ]);
    let client = svc.client(10);

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_cb = seen.clone();
    let progress = move |_: &TaskState| {
        seen_cb.fetch_add(1, Ordering::SeqCst);
    };
    let on_progress: ProgressFn<'_> = &progress;
    let cancel = CancellationToken::new();
    let result = client.call(&load_lptm(), &cancel, Some(on_progress)).await;

    assert_eq!(result, Ok(json!({ "x": 1 })));
    assert_eq!(svc.hits.task_status(), 3);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    // Nothing keeps polling once the task is terminal.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(svc.hits.task_status(), 3);
}

#[tokio::test]
async fn failed_task_reports_server_message() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::task("t-2"));
    svc.task_statuses(vec![
        Reply::json(json!({ "state": "STARTED" })),
        Reply::json(json!({ "state": "FAILURE", "result": { "message": "out of memory" } })),
    ]);
    let client = svc.client(10);

    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(result, Err(ApiError::remote(None, "out of memory")));
}

#[tokio::test]
async fn failure_without_message_uses_status_then_unknown() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::task("t-3"));
    svc.task_statuses(vec![Reply::json(json!({ "state": "REVOKED", "status": "revoked by worker" }))]);
    let client = svc.client(10);
    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(result, Err(ApiError::remote(None, "revoked by worker")));

    svc.task_statuses(vec![Reply::json(json!({ "state": "FAILURE" }))]);
    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(result, Err(ApiError::remote(None, "Unknown error")));
}

#[tokio::test]
async fn unreadable_status_ends_poll_without_retry() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::task("t-4"));
    svc.task_statuses(vec![
        Reply::json(json!({ "state": "PENDING" })),
        Reply::raw("<html>bad gateway</html>"),
        Reply::json(json!({ "state": "SUCCESS", "result": { "x": 1 } })),
    ]);
    let client = svc.client(10);

    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert!(matches!(result, Err(ApiError::Transport(_))));
    assert_eq!(svc.hits.task_status(), 2);
}

#[tokio::test]
async fn cancellation_stops_status_requests() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::task("t-5"));
    let client = svc.client(10);

    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let call_client = client.clone();
    let handle = tokio::spawn(async move {
        call_client.call(&load_lptm(), &task_cancel, None).await
    });

    tokio::time::sleep(Duration::from_millis(80)).await;
    cancel.cancel();
    let result = handle.await.expect("join");
    assert_eq!(result, Err(ApiError::Cancelled));

    let after_cancel = svc.hits.task_status();
    assert!(after_cancel >= 1);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(svc.hits.task_status(), after_cancel);
}

#[tokio::test]
async fn poll_timeout_is_opt_in() {
    let svc = MockService::start().await;
    let polling = PollingConfig {
        interval_ms: 10,
        timeout_secs: Some(0),
    };
    let poller = TaskPoller::new(reqwest::Client::new(), svc.base_url.clone(), &polling);
    let result = poller.poll("t-6", &CancellationToken::new(), None).await;
    assert!(matches!(result, Err(ApiError::PollTimeout { .. })));
    assert_eq!(svc.hits.task_status(), 1);
}

#[tokio::test]
async fn http_error_uses_body_message_or_status_line() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::status(
        StatusCode::BAD_REQUEST,
        json!({ "message": "Unknown model" }),
    ));
    let client = svc.client(10);
    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(result, Err(ApiError::remote(Some(400), "Unknown model")));

    svc.on_load_model(Reply::status(StatusCode::SERVICE_UNAVAILABLE, json!({})));
    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(
        result.map_err(|e| e.to_string()),
        Err("Error: 503 Service Unavailable".to_string())
    );
    assert_eq!(svc.hits.task_status(), 0);
}

#[tokio::test]
async fn immediate_result_skips_polling() {
    let svc = MockService::start().await;
    svc.on_load_model(Reply::json(json!({ "result": { "message": "ready" } })));
    let client = svc.client(10);
    let result = client
        .call(&load_lptm(), &CancellationToken::new(), None)
        .await;
    assert_eq!(result, Ok(json!({ "message": "ready" })));
    assert_eq!(svc.hits.task_status(), 0);
}

#[tokio::test]
async fn zero_interval_does_not_flood_status_endpoint() {
    let svc = MockService::start().await;
    let polling = PollingConfig {
        interval_ms: 0,
        timeout_secs: None,
    };
    let poller = TaskPoller::new(reqwest::Client::new(), svc.base_url.clone(), &polling);

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        stopper.cancel();
    });
    let result = poller.poll("t-7", &cancel, None).await;

    assert_eq!(result, Err(ApiError::Cancelled));
    // One immediate query, then at most one per floored interval.
    let hits = svc.hits.task_status();
    assert!((1..=4).contains(&hits), "status queries: {}", hits);
}
