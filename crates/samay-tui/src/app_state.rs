//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event loop is the only writer. Components read the dashboard state
//! from here and answer with `Action`s.

use std::collections::HashMap;

use samay_proto::config::Config;
use samay_proto::controller::{ActionKind, PlotOptions};
use samay_proto::protocol::TaskState;
use samay_proto::state::DashboardState;

use crate::download_manager::DownloadStatus;
use crate::widgets::status_bar::InputMode;

pub struct AppState {
    pub dashboard: DashboardState,
    /// Last non-terminal task state reported per running action.
    pub progress: HashMap<ActionKind, TaskState>,
    /// Download state of the plot currently shown, if any.
    pub plot_download: Option<DownloadStatus>,

    pub input_mode: InputMode,

    pub base_url: String,
    pub example_path: String,
    pub plot_defaults: PlotOptions,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            dashboard: DashboardState::new(),
            progress: HashMap::new(),
            plot_download: None,
            input_mode: InputMode::Normal,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            example_path: config.dataset.example_path.clone(),
            plot_defaults: PlotOptions::from_config(&config.plot),
        }
    }

    /// Progress line for a running action: its label plus the last task state.
    pub fn progress_label(&self, kind: ActionKind) -> Option<String> {
        if !self.dashboard.busy().get(kind) {
            return None;
        }
        Some(match self.progress.get(&kind) {
            Some(state) => format!("{}: {}", kind.label(), state),
            None => format!("{}: sending", kind.label()),
        })
    }
}
