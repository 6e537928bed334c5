//! Action controllers: Load Model, Upload Dataset, Fine-tune, Generate Plot.
//!
//! Each action runs in three phases so the owner of `DashboardState` never
//! holds it across an await:
//!
//! ```text
//!  begin    precondition gate, clear messages, set busy, build request
//!  call     network + normalizer + poller (ForecastClient::call), no state
//!  finish   apply exactly one of success / error, clear busy
//! ```
//!
//! `begin` hands out a `Ticket` stamped with the state's reset generation;
//! `finish` ignores tickets from before the latest reset.

use std::path::PathBuf;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ForecastClient;
use crate::config::PlotConfig;
use crate::error::ApiError;
use crate::poller::ProgressFn;
use crate::protocol::{
    clamp_epochs, text_field, FinetuneRequest, InferenceRequest, LoadModelRequest,
    UPLOADED_DATASET_NAME,
};
use crate::state::DashboardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    LoadModel,
    UploadDataset,
    Finetune,
    GeneratePlot,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::LoadModel,
        ActionKind::UploadDataset,
        ActionKind::Finetune,
        ActionKind::GeneratePlot,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::LoadModel => "Load model",
            Self::UploadDataset => "Upload dataset",
            Self::Finetune => "Fine-tune",
            Self::GeneratePlot => "Generate plot",
        }
    }

    /// Shown when an error carries no description of its own.
    pub fn fallback_error(self) -> &'static str {
        match self {
            Self::LoadModel => "An error occurred while loading the model",
            Self::UploadDataset => "An error occurred while uploading the dataset",
            Self::Finetune => "An error occurred while finetuning the model",
            Self::GeneratePlot => "An error occurred while generating the plot",
        }
    }

    fn default_success(self) -> &'static str {
        match self {
            Self::LoadModel => "Model loaded successfully",
            Self::UploadDataset => "Dataset uploaded successfully",
            Self::Finetune => "Model fine-tuned successfully",
            Self::GeneratePlot => "Plot generated successfully",
        }
    }
}

/// Options chosen in the plot dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub finetune: bool,
    pub epochs: u32,
}

impl PlotOptions {
    pub fn from_config(plot: &PlotConfig) -> Self {
        Self {
            finetune: plot.default_finetune,
            epochs: clamp_epochs(plot.default_epochs as i64),
        }
    }
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            finetune: true,
            epochs: 1,
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    LoadModel,
    UploadDataset(PathBuf),
    Finetune,
    GeneratePlot(PlotOptions),
}

impl Intent {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoadModel => ActionKind::LoadModel,
            Self::UploadDataset(_) => ActionKind::UploadDataset,
            Self::Finetune => ActionKind::Finetune,
            Self::GeneratePlot(_) => ActionKind::GeneratePlot,
        }
    }
}

/// A fully-formed service request, built by `begin`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    LoadModel(LoadModelRequest),
    UploadDataset { file: PathBuf },
    Finetune(FinetuneRequest),
    GeneratePlot(InferenceRequest),
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoadModel(_) => ActionKind::LoadModel,
            Self::UploadDataset { .. } => ActionKind::UploadDataset,
            Self::Finetune(_) => ActionKind::Finetune,
            Self::GeneratePlot(_) => ActionKind::GeneratePlot,
        }
    }
}

/// Identifies one action invocation across the await in the middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: ActionKind,
    generation: u64,
}

impl Ticket {
    /// False once the state has been reset since `begin`.
    pub fn is_current(&self, state: &DashboardState) -> bool {
        self.generation == state.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub ticket: Ticket,
    pub request: ActionRequest,
}

/// How `finish` left the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finished {
    Succeeded(String),
    Failed(String),
    /// Torn down before settling; busy cleared, no message.
    Cancelled,
    /// Begun before the latest reset; nothing applied.
    Stale,
}

/// Phase one: gate, clear messages, mark busy, build the request.
///
/// On a violated precondition the error message is set and nothing else
/// changes; no request must be sent.
pub fn begin(state: &mut DashboardState, intent: Intent) -> Result<Pending, ApiError> {
    let request = match intent {
        Intent::LoadModel => {
            let model_name = require_model(state)?;
            ActionRequest::LoadModel(LoadModelRequest { model_name })
        }
        Intent::UploadDataset(file) => {
            if file.as_os_str().is_empty() || !file.is_file() {
                return Err(precondition(state, "Please select a CSV file to upload"));
            }
            state.uploaded_file = Some(file.clone());
            ActionRequest::UploadDataset { file }
        }
        Intent::Finetune => {
            require_loaded(state)?;
            let model_name = require_model(state)?;
            ActionRequest::Finetune(FinetuneRequest {
                model_name,
                dataset_name: UPLOADED_DATASET_NAME.to_string(),
            })
        }
        Intent::GeneratePlot(options) => {
            require_loaded(state)?;
            let path = match state.dataset_path.clone() {
                Some(p) => p,
                None => {
                    return Err(precondition(
                        state,
                        "No dataset path available. Please re-upload your dataset.",
                    ))
                }
            };
            let model_name = require_model(state)?;
            state.plot_url = None;
            ActionRequest::GeneratePlot(InferenceRequest {
                model_name,
                dataset_name: UPLOADED_DATASET_NAME.to_string(),
                path,
                finetune: options.finetune,
                epochs: clamp_epochs(options.epochs as i64),
            })
        }
    };

    let kind = request.kind();
    state.clear_messages();
    state.busy.set(kind, true);
    debug!("{}: begun (generation {})", kind.label(), state.generation);
    Ok(Pending {
        ticket: Ticket {
            kind,
            generation: state.generation,
        },
        request,
    })
}

/// Phase three: apply the outcome of `ForecastClient::call`.
pub fn finish(
    state: &mut DashboardState,
    ticket: Ticket,
    outcome: Result<Value, ApiError>,
    client: &ForecastClient,
) -> Finished {
    let kind = ticket.kind;
    if !ticket.is_current(state) {
        debug!("{}: dropping result from before reset", kind.label());
        return Finished::Stale;
    }
    state.busy.set(kind, false);

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => {
            info!("{}: cancelled", kind.label());
            return Finished::Cancelled;
        }
        Err(e) => return fail(state, kind, &e.to_string()),
    };

    let server_message = text_field(&result, "message");
    match kind {
        ActionKind::LoadModel => {
            state.model_loaded = true;
        }
        ActionKind::UploadDataset => match text_field(&result, "path") {
            Some(path) => {
                state.dataset_path = Some(path);
                state.data_loaded = true;
                state.example_loaded = false;
            }
            None => {
                return fail(
                    state,
                    kind,
                    &server_message
                        .unwrap_or_else(|| "Upload finished but no dataset path was returned".to_string()),
                );
            }
        },
        ActionKind::Finetune => {}
        ActionKind::GeneratePlot => match text_field(&result, "result_path") {
            Some(result_path) => {
                state.plot_url = Some(client.resolve_url(&result_path));
                // The plot endpoint's own message is not surfaced on success.
                return succeed(state, kind, kind.default_success().to_string());
            }
            None => {
                return fail(
                    state,
                    kind,
                    &server_message.unwrap_or_else(|| "Failed to generate plot".to_string()),
                );
            }
        },
    }

    let message = server_message.unwrap_or_else(|| kind.default_success().to_string());
    succeed(state, kind, message)
}

/// All three phases inline, for callers that own the state across the await.
pub async fn run(
    state: &mut DashboardState,
    client: &ForecastClient,
    intent: Intent,
    cancel: &CancellationToken,
    on_progress: Option<ProgressFn<'_>>,
) -> Finished {
    let pending = match begin(state, intent) {
        Ok(p) => p,
        Err(e) => return Finished::Failed(e.to_string()),
    };
    let outcome = client.call(&pending.request, cancel, on_progress).await;
    finish(state, pending.ticket, outcome, client)
}

fn succeed(state: &mut DashboardState, kind: ActionKind, message: String) -> Finished {
    info!("{}: {}", kind.label(), message);
    state.set_success(message.clone());
    debug_assert!(state.invariant_holds(), "data_loaded without a dataset");
    Finished::Succeeded(message)
}

fn fail(state: &mut DashboardState, kind: ActionKind, description: &str) -> Finished {
    let message = if description.trim().is_empty() {
        kind.fallback_error().to_string()
    } else {
        description.to_string()
    };
    warn!("{}: {}", kind.label(), message);
    state.set_error(message.clone());
    Finished::Failed(message)
}

fn precondition(state: &mut DashboardState, message: &str) -> ApiError {
    state.set_error(message);
    ApiError::Precondition(message.to_string())
}

fn require_model(state: &mut DashboardState) -> Result<String, ApiError> {
    match state.selected_model.clone() {
        Some(m) => Ok(m),
        None => Err(precondition(state, "Please select a model first")),
    }
}

fn require_loaded(state: &mut DashboardState) -> Result<(), ApiError> {
    if !state.model_loaded {
        return Err(precondition(state, "Please load a model first"));
    }
    if !state.data_loaded {
        return Err(precondition(state, "Please upload a dataset first"));
    }
    Ok(())
}
