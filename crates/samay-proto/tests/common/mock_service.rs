#![allow(dead_code)]

//! In-process stand-in for the forecasting service, bound to 127.0.0.1:0.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use samay_proto::client::ForecastClient;
use samay_proto::config::{ApiConfig, PollingConfig};

/// A canned answer: status code plus raw body.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn json(v: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: v.to_string(),
        }
    }

    pub fn status(status: StatusCode, v: Value) -> Self {
        Self {
            status,
            body: v.to_string(),
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    pub fn task(id: &str) -> Self {
        Self::json(json!({ "task_id": id }))
    }

    fn into_response(self) -> Response {
        (
            self.status,
            [("content-type", "application/json")],
            self.body,
        )
            .into_response()
    }
}

#[derive(Debug, Default)]
pub struct Hits {
    pub load_model: AtomicUsize,
    pub upload: AtomicUsize,
    pub finetune: AtomicUsize,
    pub inference: AtomicUsize,
    pub task_status: AtomicUsize,
}

impl Hits {
    pub fn total(&self) -> usize {
        self.load_model.load(Ordering::SeqCst)
            + self.upload.load(Ordering::SeqCst)
            + self.finetune.load(Ordering::SeqCst)
            + self.inference.load(Ordering::SeqCst)
            + self.task_status.load(Ordering::SeqCst)
    }

    pub fn task_status(&self) -> usize {
        self.task_status.load(Ordering::SeqCst)
    }
}

struct Script {
    load_model: Reply,
    upload: Reply,
    finetune: Reply,
    inference: Reply,
    /// Consumed front to back; the last entry repeats forever.
    statuses: VecDeque<Reply>,
    json_bodies: Vec<(String, Value)>,
    upload_bodies: Vec<Vec<u8>>,
}

#[derive(Clone)]
struct MockState {
    script: Arc<Mutex<Script>>,
    hits: Arc<Hits>,
}

pub struct MockService {
    pub base_url: String,
    pub hits: Arc<Hits>,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockService {
    pub async fn start() -> Self {
        let hits = Arc::new(Hits::default());
        let state = MockState {
            script: Arc::new(Mutex::new(Script {
                load_model: Reply::json(json!({ "message": "Model loaded" })),
                upload: Reply::json(json!({ "message": "Uploaded", "path": "uploads/series.csv" })),
                finetune: Reply::json(json!({ "message": "Fine-tuned" })),
                inference: Reply::json(json!({ "result_path": "/plots/1.png" })),
                statuses: VecDeque::from([Reply::json(json!({ "state": "PENDING" }))]),
                json_bodies: Vec::new(),
                upload_bodies: Vec::new(),
            })),
            hits: hits.clone(),
        };

        let app = Router::new()
            .route("/load_model", post(load_model))
            .route("/upload_dataset", post(upload_dataset))
            .route("/finetune", post(finetune))
            .route("/run_inference", post(run_inference))
            .route("/task_status/:id", get(task_status))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("mock service address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            state,
            handle,
        }
    }

    pub fn on_load_model(&self, reply: Reply) {
        self.state.script.lock().unwrap().load_model = reply;
    }

    pub fn on_upload(&self, reply: Reply) {
        self.state.script.lock().unwrap().upload = reply;
    }

    pub fn on_finetune(&self, reply: Reply) {
        self.state.script.lock().unwrap().finetune = reply;
    }

    pub fn on_inference(&self, reply: Reply) {
        self.state.script.lock().unwrap().inference = reply;
    }

    pub fn task_statuses(&self, replies: Vec<Reply>) {
        self.state.script.lock().unwrap().statuses = replies.into();
    }

    /// `(path, body)` of every JSON request received, in order.
    pub fn json_bodies(&self) -> Vec<(String, Value)> {
        self.state.script.lock().unwrap().json_bodies.clone()
    }

    pub fn upload_bodies(&self) -> Vec<Vec<u8>> {
        self.state.script.lock().unwrap().upload_bodies.clone()
    }

    pub fn client(&self, interval_ms: u64) -> ForecastClient {
        let api = ApiConfig {
            base_url: self.base_url.clone(),
            request_timeout_secs: 5,
        };
        let polling = PollingConfig {
            interval_ms,
            timeout_secs: None,
        };
        ForecastClient::new(&api, &polling).expect("build client")
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn write_csv(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "timestamp,value\n2024-01-01 00:00:00,1.0\n").expect("write csv");
    path
}

fn record(state: &MockState, path: &str, body: &Bytes) {
    let value = serde_json::from_slice(body).unwrap_or(Value::Null);
    state
        .script
        .lock()
        .unwrap()
        .json_bodies
        .push((path.to_string(), value));
}

async fn load_model(State(state): State<MockState>, body: Bytes) -> Response {
    state.hits.load_model.fetch_add(1, Ordering::SeqCst);
    record(&state, "/load_model", &body);
    let reply = state.script.lock().unwrap().load_model.clone();
    reply.into_response()
}

async fn upload_dataset(State(state): State<MockState>, body: Bytes) -> Response {
    state.hits.upload.fetch_add(1, Ordering::SeqCst);
    let reply = {
        let mut script = state.script.lock().unwrap();
        script.upload_bodies.push(body.to_vec());
        script.upload.clone()
    };
    reply.into_response()
}

async fn finetune(State(state): State<MockState>, body: Bytes) -> Response {
    state.hits.finetune.fetch_add(1, Ordering::SeqCst);
    record(&state, "/finetune", &body);
    let reply = state.script.lock().unwrap().finetune.clone();
    reply.into_response()
}

async fn run_inference(State(state): State<MockState>, body: Bytes) -> Response {
    state.hits.inference.fetch_add(1, Ordering::SeqCst);
    record(&state, "/run_inference", &body);
    let reply = state.script.lock().unwrap().inference.clone();
    reply.into_response()
}

async fn task_status(State(state): State<MockState>, Path(_id): Path<String>) -> Response {
    state.hits.task_status.fetch_add(1, Ordering::SeqCst);
    let reply = {
        let mut script = state.script.lock().unwrap();
        if script.statuses.len() > 1 {
            script.statuses.pop_front()
        } else {
            script.statuses.front().cloned()
        }
    };
    match reply {
        Some(r) => r.into_response(),
        None => Reply::json(json!({ "state": "PENDING" })).into_response(),
    }
}
