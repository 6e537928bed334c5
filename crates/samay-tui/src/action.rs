//! Action enum: all user-initiated intents and internal events.

use std::path::PathBuf;

use samay_proto::controller::PlotOptions;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    ModelList,
    DatasetPanel,
    ForecastPanel,
    DocsPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Dashboard ────────────────────────────────────────────────────────────
    SelectModel(String),
    LoadModel,
    UploadDataset(PathBuf),
    UseExample,
    Finetune,
    OpenPlotDialog,
    ClosePlotDialog,
    GeneratePlot(PlotOptions),
    /// Clear dataset, plot and loaded flags; keep the selected model.
    Reset,

    // ── Plot output ──────────────────────────────────────────────────────────
    DownloadPlot,
    CopyToClipboard(String),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    SelectUp(usize),
    SelectDown(usize),
    ScrollUp(usize),
    ScrollDown(usize),

    // ── Path prompt ──────────────────────────────────────────────────────────
    OpenPathPrompt,
    ClosePathPrompt,

    // ── Workspace / UI toggles ───────────────────────────────────────────────
    SwitchWorkspace(Workspace),
    ToggleHelp,
    ToggleKeys,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
}

/// Which workspace (tab) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workspace {
    Dashboard,
    Docs,
}

impl Workspace {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "DASHBOARD",
            Self::Docs => "DOCS",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Dashboard => Self::Docs,
            Self::Docs => Self::Dashboard,
        }
    }
}
