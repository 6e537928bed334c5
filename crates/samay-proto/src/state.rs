//! Dashboard state machine.
//!
//! Holds what the user has selected and what the service has confirmed. The
//! derived flags gate which actions the UI offers; the action controllers in
//! `controller` and `reset` are the only writers.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::controller::ActionKind;
use crate::error::ApiError;

/// One busy flag per action controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub load_model: bool,
    pub upload: bool,
    pub finetune: bool,
    pub generate_plot: bool,
}

impl BusyFlags {
    pub fn get(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::LoadModel => self.load_model,
            ActionKind::UploadDataset => self.upload,
            ActionKind::Finetune => self.finetune,
            ActionKind::GeneratePlot => self.generate_plot,
        }
    }

    pub fn set(&mut self, kind: ActionKind, busy: bool) {
        match kind {
            ActionKind::LoadModel => self.load_model = busy,
            ActionKind::UploadDataset => self.upload = busy,
            ActionKind::Finetune => self.finetune = busy,
            ActionKind::GeneratePlot => self.generate_plot = busy,
        }
    }

    pub fn any(&self) -> bool {
        self.load_model || self.upload || self.finetune || self.generate_plot
    }
}

/// How much a reset forgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Keep the selected model; forget everything derived from it.
    KeepModel,
    /// Forget the selected model too.
    Full,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub(crate) selected_model: Option<String>,
    /// Local file last handed to the upload controller.
    pub(crate) uploaded_file: Option<PathBuf>,
    /// Server-side dataset reference returned by the upload (or the example path).
    pub(crate) dataset_path: Option<String>,
    pub(crate) example_loaded: bool,
    pub(crate) model_loaded: bool,
    pub(crate) data_loaded: bool,
    pub(crate) busy: BusyFlags,
    pub(crate) message: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) plot_url: Option<String>,
    /// Bumped by every reset; results of actions begun earlier are dropped.
    pub(crate) generation: u64,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn uploaded_file(&self) -> Option<&Path> {
        self.uploaded_file.as_deref()
    }

    pub fn dataset_path(&self) -> Option<&str> {
        self.dataset_path.as_deref()
    }

    pub fn example_loaded(&self) -> bool {
        self.example_loaded
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn data_loaded(&self) -> bool {
        self.data_loaded
    }

    pub fn busy(&self) -> BusyFlags {
        self.busy
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn plot_url(&self) -> Option<&str> {
        self.plot_url.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Gates (what the UI enables) ──────────────────────────────────────────

    pub fn can_load_model(&self) -> bool {
        self.selected_model.is_some() && !self.busy.load_model
    }

    pub fn can_upload(&self) -> bool {
        !self.busy.upload
    }

    pub fn can_use_example(&self) -> bool {
        self.model_loaded
    }

    pub fn can_finetune(&self) -> bool {
        self.model_loaded && self.data_loaded && !self.busy.finetune
    }

    pub fn can_generate_plot(&self) -> bool {
        self.model_loaded && self.data_loaded && !self.busy.generate_plot
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Pick a model. A different model invalidates everything loaded so far.
    /// Returns `false` when `model` was already selected.
    pub fn select_model(&mut self, model: &str) -> bool {
        if self.selected_model.as_deref() == Some(model) {
            return false;
        }
        self.reset(ResetScope::Full);
        info!("model selected: {}", model);
        self.selected_model = Some(model.to_string());
        true
    }

    /// Forget the dataset, the plot and both loaded flags. In-flight actions
    /// become stale and their results are ignored when they arrive.
    pub fn reset(&mut self, scope: ResetScope) {
        self.clear_messages();
        self.uploaded_file = None;
        self.dataset_path = None;
        self.example_loaded = false;
        self.plot_url = None;
        self.model_loaded = false;
        self.data_loaded = false;
        self.busy = BusyFlags::default();
        if scope == ResetScope::Full {
            self.selected_model = None;
        }
        self.generation += 1;
        debug!("dashboard reset ({:?}), generation {}", scope, self.generation);
    }

    pub fn clear_messages(&mut self) {
        self.message = None;
        self.error = None;
    }

    pub(crate) fn set_success(&mut self, message: impl Into<String>) {
        self.error = None;
        self.message = Some(message.into());
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.message = None;
        self.error = Some(message.into());
    }

    /// Use the service's bundled example dataset instead of uploading one.
    /// No network call; only offered once a model is loaded.
    pub fn use_example(&mut self, example_path: &str) -> Result<(), ApiError> {
        if !self.model_loaded {
            let msg = "Please load a model first";
            self.set_error(msg);
            return Err(ApiError::Precondition(msg.to_string()));
        }
        self.example_loaded = true;
        self.data_loaded = true;
        self.uploaded_file = None;
        self.dataset_path = Some(example_path.to_string());
        self.set_success("Example file loaded");
        info!("example dataset selected: {}", example_path);
        Ok(())
    }

    /// `data_loaded` must be backed by a dataset path or example mode.
    pub fn invariant_holds(&self) -> bool {
        !self.data_loaded || self.dataset_path.is_some() || self.example_loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> DashboardState {
        let mut s = DashboardState::new();
        s.select_model("LPTM");
        s.model_loaded = true;
        s.data_loaded = true;
        s.dataset_path = Some("uploads/a.csv".to_string());
        s.plot_url = Some("http://svc/plots/1.png".to_string());
        s.message = Some("Plot generated successfully".to_string());
        s
    }

    #[test]
    fn test_selecting_new_model_clears_plot_and_flags() {
        let mut s = loaded();
        let before = s.generation();
        assert!(s.select_model("Chronos"));
        assert_eq!(s.selected_model(), Some("Chronos"));
        assert_eq!(s.plot_url(), None);
        assert!(!s.model_loaded());
        assert!(!s.data_loaded());
        assert_eq!(s.message(), None);
        assert!(s.generation() > before);
    }

    #[test]
    fn test_selecting_same_model_is_noop() {
        let mut s = loaded();
        let before = s.generation();
        assert!(!s.select_model("LPTM"));
        assert!(s.model_loaded());
        assert_eq!(s.generation(), before);
    }

    #[test]
    fn test_reset_keep_model() {
        let mut s = loaded();
        s.busy.generate_plot = true;
        s.reset(ResetScope::KeepModel);
        assert_eq!(s.selected_model(), Some("LPTM"));
        assert!(!s.model_loaded());
        assert!(!s.busy().any());
        assert_eq!(s.dataset_path(), None);
        assert!(s.invariant_holds());
    }

    #[test]
    fn test_use_example_requires_loaded_model() {
        let mut s = DashboardState::new();
        s.select_model("LPTM");
        assert!(s.use_example("data/data/ETTh1.csv").is_err());
        assert_eq!(s.error(), Some("Please load a model first"));
        assert!(!s.data_loaded());

        s.model_loaded = true;
        s.use_example("data/data/ETTh1.csv").unwrap();
        assert!(s.data_loaded());
        assert!(s.example_loaded());
        assert_eq!(s.dataset_path(), Some("data/data/ETTh1.csv"));
        assert_eq!(s.message(), Some("Example file loaded"));
        assert_eq!(s.error(), None);
        assert!(s.invariant_holds());
    }

    #[test]
    fn test_messages_are_exclusive() {
        let mut s = DashboardState::new();
        s.set_error("boom");
        s.set_success("fine");
        assert_eq!(s.error(), None);
        s.set_error("boom again");
        assert_eq!(s.message(), None);
    }

    #[test]
    fn test_gates() {
        let mut s = DashboardState::new();
        assert!(!s.can_load_model());
        s.select_model("TimesFM");
        assert!(s.can_load_model());
        assert!(!s.can_generate_plot());
        s.busy.load_model = true;
        assert!(!s.can_load_model());
    }
}
