//! App: component-based event loop.
//!
//! - `App` owns all components, the `AppState` they read, and the
//!   `DashboardState` inside it.
//! - A `tokio::mpsc` channel carries `AppMessage`s in from the terminal reader
//!   and from spawned action tasks.
//! - Actions run in three steps: `controller::begin` here, the network call in
//!   a spawned task, `controller::finish` here again when its message arrives.
//!   Dashboard state is only ever touched on this loop.
//! - Every spawned action holds a child of `root_cancel`; reset and quit
//!   cancel them.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use samay_proto::client::ForecastClient;
use samay_proto::config::Config;
use samay_proto::controller::{self, ActionKind, Finished, Intent, Ticket};
use samay_proto::error::ApiError;
use samay_proto::poller::ProgressFn;
use samay_proto::protocol::TaskState;
use samay_proto::state::ResetScope;

use crate::{
    action::{Action, ComponentId, Workspace},
    app_state::AppState,
    component::Component,
    components::{
        dataset_panel::DatasetPanel, docs_panel::DocsPanel, forecast_panel::ForecastPanel,
        header::Header, help_overlay::HelpOverlay, model_list::ModelList,
        plot_dialog::PlotDialog,
    },
    download_manager::{DownloadManager, DownloadStatus},
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
    workspace::WorkspaceManager,
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    /// A polled task reported a non-terminal state.
    ActionProgress(Ticket, TaskState),
    /// A spawned action settled (or was cancelled).
    ActionFinished(Ticket, Result<Value, ApiError>),
}

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn rects of the focusable panes, for mouse hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    model_list: Rect,
    dataset_panel: Rect,
    forecast_panel: Rect,
    docs_panel: Rect,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub state: AppState,
    client: ForecastClient,

    // ── Components ────────────────────────────────────────────────────────────
    header: Header,
    model_list: ModelList,
    dataset_panel: DatasetPanel,
    forecast_panel: ForecastPanel,
    docs_panel: DocsPanel,
    plot_dialog: PlotDialog,
    help_overlay: HelpOverlay,

    // ── Workspace / layout ────────────────────────────────────────────────────
    wm: WorkspaceManager,
    toast: ToastManager,
    pane_areas: PaneAreas,

    // ── Background work ───────────────────────────────────────────────────────
    downloads: DownloadManager,
    root_cancel: CancellationToken,
    in_flight: HashMap<ActionKind, CancellationToken>,
    msg_tx: Option<mpsc::Sender<AppMessage>>,

    should_quit: bool,
}

impl App {
    pub fn new(config: Config, client: ForecastClient) -> Self {
        let state = AppState::new(&config);
        let downloads = DownloadManager::new(client.http().clone(), config.paths.downloads_dir.clone());
        Self {
            plot_dialog: PlotDialog::new(state.plot_defaults),
            state,
            client,
            header: Header::new(),
            model_list: ModelList::new(),
            dataset_panel: DatasetPanel::new(),
            forecast_panel: ForecastPanel::new(),
            docs_panel: DocsPanel::new(),
            help_overlay: HelpOverlay::new(),
            wm: WorkspaceManager::new(),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            downloads,
            root_cancel: CancellationToken::new(),
            in_flight: HashMap::new(),
            msg_tx: None,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.cancel_in_flight();
        self.root_cancel.cancel();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("samay exiting");

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.msg_tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // Toast expiry, spinner animation and download progress.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        // Every wake-up (message batch or tick) ends in a redraw.
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 64;
                    self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        match rx.try_recv() {
                            Ok(next) => self.handle_message(next).await,
                            Err(_) => break,
                        }
                        drained += 1;
                    }
                }
                _ = ui_tick.tick() => {
                    self.on_tick().await;
                }
            }
        }
        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return;
                    }
                    let actions = self.handle_key(key);
                    for a in actions {
                        self.dispatch(a).await;
                    }
                }
                Event::Mouse(mouse) => {
                    let actions = self.handle_mouse(mouse);
                    for a in actions {
                        self.dispatch(a).await;
                    }
                }
                Event::Resize(w, h) => {
                    self.dispatch(Action::Resize(w, h)).await;
                }
                _ => {}
            },

            AppMessage::ActionProgress(ticket, task_state) => {
                if ticket.is_current(&self.state.dashboard)
                    && self.state.dashboard.busy().get(ticket.kind)
                {
                    self.toast
                        .spinner(ticket.kind, format!("{}: {}", ticket.kind.label(), task_state));
                    self.state.progress.insert(ticket.kind, task_state);
                }
            }

            AppMessage::ActionFinished(ticket, outcome) => {
                self.on_action_finished(ticket, outcome);
            }
        }
    }

    fn on_action_finished(&mut self, ticket: Ticket, outcome: Result<Value, ApiError>) {
        let kind = ticket.kind;
        if ticket.is_current(&self.state.dashboard) {
            self.in_flight.remove(&kind);
            self.state.progress.remove(&kind);
        }
        match controller::finish(&mut self.state.dashboard, ticket, outcome, &self.client) {
            Finished::Succeeded(message) => {
                if kind == ActionKind::GeneratePlot {
                    self.state.plot_download = None;
                }
                self.toast.resolve_spinner(kind, Severity::Success, message);
            }
            Finished::Failed(message) => {
                self.toast.resolve_spinner(kind, Severity::Error, message);
            }
            Finished::Cancelled => self.toast.dismiss_spinner(kind),
            Finished::Stale => {}
        }
    }

    async fn on_tick(&mut self) {
        self.toast.tick();

        for settled in self.downloads.update_statuses() {
            match settled.status {
                DownloadStatus::Downloaded(path) => {
                    self.toast.success(format!("saved {}", path.display()));
                }
                DownloadStatus::Failed(e) => {
                    self.toast.error(format!("download failed: {}", e));
                }
                _ => {}
            }
        }
        self.state.plot_download = self
            .state
            .dashboard
            .plot_url()
            .map(|url| self.downloads.get_status(url))
            .filter(|s| *s != DownloadStatus::NotDownloaded);

        let mut out = Vec::new();
        out.extend(self.model_list.tick(&self.state));
        out.extend(self.dataset_panel.tick(&self.state));
        out.extend(self.forecast_panel.tick(&self.state));
        for a in out {
            self.dispatch(a).await;
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // Modal input owns the keyboard
        match self.state.input_mode {
            InputMode::Input => return self.dataset_panel.handle_key(key, &self.state),
            InputMode::Dialog => return self.plot_dialog.handle_key(key, &self.state),
            InputMode::Normal => {}
        }

        if self.wm.show_help {
            let actions = self.help_overlay.handle_key(key, &self.state);
            if !actions.is_empty() {
                return actions;
            }
            // Any other key closes the overlay
            return vec![Action::ToggleHelp];
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('K') => return vec![Action::ToggleKeys],
            KeyCode::Char('w') => {
                return vec![Action::SwitchWorkspace(self.wm.workspace.other())];
            }
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        if self.wm.workspace == Workspace::Dashboard {
            match key.code {
                KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::ModelList)],
                KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::DatasetPanel)],
                KeyCode::Char('3') => return vec![Action::FocusPane(ComponentId::ForecastPanel)],
                KeyCode::Char('l') => return vec![Action::LoadModel],
                KeyCode::Char('u') => {
                    if self.state.dashboard.busy().upload {
                        self.toast.warning("Upload dataset is already running");
                        return vec![];
                    }
                    return vec![
                        Action::FocusPane(ComponentId::DatasetPanel),
                        Action::OpenPathPrompt,
                    ];
                }
                KeyCode::Char('e') => return vec![Action::UseExample],
                KeyCode::Char('t') => return vec![Action::Finetune],
                KeyCode::Char('g') => return vec![Action::OpenPlotDialog],
                KeyCode::Char('d') => return vec![Action::DownloadPlot],
                KeyCode::Char('y') => {
                    return match self.state.dashboard.plot_url() {
                        Some(url) => vec![Action::CopyToClipboard(url.to_string())],
                        None => {
                            self.toast.warning("No plot URL to copy yet");
                            vec![]
                        }
                    };
                }
                KeyCode::Char('r') => return vec![Action::Reset],
                _ => {}
            }
        }

        let s = &self.state;
        match self.wm.focused() {
            Some(ComponentId::ModelList) => self.model_list.handle_key(key, s),
            Some(ComponentId::DatasetPanel) => self.dataset_panel.handle_key(key, s),
            Some(ComponentId::ForecastPanel) => self.forecast_panel.handle_key(key, s),
            Some(ComponentId::DocsPanel) => self.docs_panel.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.state.input_mode != InputMode::Normal || self.wm.show_help {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
        }

        let (col, row) = (event.column, event.row);
        let areas = self.pane_areas.clone();
        let target = match self.wm.workspace {
            Workspace::Dashboard => [
                (ComponentId::ModelList, areas.model_list),
                (ComponentId::DatasetPanel, areas.dataset_panel),
                (ComponentId::ForecastPanel, areas.forecast_panel),
            ]
            .into_iter()
            .find(|(_, r)| hit(*r, col, row)),
            Workspace::Docs => {
                Some((ComponentId::DocsPanel, areas.docs_panel)).filter(|(_, r)| hit(*r, col, row))
            }
        };
        let Some((id, area)) = target else {
            return vec![];
        };

        let mut actions = Vec::new();
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if self.wm.focused() != Some(id) {
                actions.push(Action::FocusPane(id));
            }
        }
        let s = &self.state;
        match id {
            ComponentId::ModelList => actions.extend(self.model_list.handle_mouse(event, area, s)),
            ComponentId::DocsPanel => match event.kind {
                MouseEventKind::ScrollUp => actions.push(Action::ScrollUp(3)),
                MouseEventKind::ScrollDown => actions.push(Action::ScrollDown(3)),
                _ => {}
            },
            _ => {}
        }
        actions
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        // Broadcast to components first so they can react (prompt, dialog reset, ...)
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.model_list.on_action(&action, s));
            out.extend(self.dataset_panel.on_action(&action, s));
            out.extend(self.forecast_panel.on_action(&action, s));
            out.extend(self.docs_panel.on_action(&action, s));
            out.extend(self.plot_dialog.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // Depth-limited to 1 level
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::Resize(_, _) => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            // ── Dashboard ─────────────────────────────────────────────────────
            Action::SelectModel(id) => {
                if self.state.dashboard.select_model(&id) {
                    self.cancel_in_flight();
                    self.toast.info(format!("Selected {}", id));
                }
            }
            Action::LoadModel => self.start_action(Intent::LoadModel),
            Action::UploadDataset(path) => self.start_action(Intent::UploadDataset(path)),
            Action::Finetune => self.start_action(Intent::Finetune),
            Action::GeneratePlot(options) => self.start_action(Intent::GeneratePlot(options)),
            Action::UseExample => {
                let example = self.state.example_path.clone();
                match self.state.dashboard.use_example(&example) {
                    Ok(()) => self.toast.success("Example file loaded"),
                    Err(e) => self.toast.error(e.to_string()),
                }
            }
            Action::OpenPlotDialog => self.open_plot_dialog(),
            Action::ClosePlotDialog => {
                self.wm.show_plot_dialog = false;
                self.state.input_mode = InputMode::Normal;
            }
            Action::Reset => {
                self.cancel_in_flight();
                self.state.dashboard.reset(ResetScope::KeepModel);
                self.toast.info("Dataset and plot cleared");
            }

            // ── Plot output ───────────────────────────────────────────────────
            Action::DownloadPlot => self.download_plot(),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.wm.focus_next();
            }
            Action::FocusPrev => {
                self.wm.focus_prev();
            }
            Action::FocusPane(id) => self.wm.focus_set(id),

            // ── Path prompt ───────────────────────────────────────────────────
            Action::OpenPathPrompt => {
                self.state.input_mode = InputMode::Input;
            }
            Action::ClosePathPrompt => {
                self.state.input_mode = InputMode::Normal;
            }

            // ── Workspace / UI toggles ────────────────────────────────────────
            Action::SwitchWorkspace(ws) => {
                self.wm.set_workspace(ws);
            }
            Action::ToggleHelp => {
                self.wm.show_help = !self.wm.show_help;
            }
            Action::ToggleKeys => {
                self.wm.show_keys_bar = !self.wm.show_keys_bar;
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => {
                self.should_quit = true;
            }

            // Handled by components in on_action
            Action::SelectUp(_)
            | Action::SelectDown(_)
            | Action::ScrollUp(_)
            | Action::ScrollDown(_) => {}

            Action::Resize(w, h) => debug!("terminal resized to {}x{}", w, h),
        }
    }

    // ── Action plumbing ───────────────────────────────────────────────────────

    /// Gate, `begin`, then spawn the network half. The result comes back as
    /// `AppMessage::ActionFinished`.
    fn start_action(&mut self, intent: Intent) {
        let kind = intent.kind();
        if self.state.dashboard.busy().get(kind) {
            self.toast.warning(format!("{} is already running", kind.label()));
            return;
        }
        let Some(tx) = self.msg_tx.clone() else {
            warn!("{}: event loop not running", kind.label());
            return;
        };

        let pending = match controller::begin(&mut self.state.dashboard, intent) {
            Ok(p) => p,
            Err(e) => {
                self.toast.error(e.to_string());
                return;
            }
        };
        if kind == ActionKind::GeneratePlot {
            self.state.plot_download = None;
        }

        let cancel = self.root_cancel.child_token();
        if let Some(previous) = self.in_flight.insert(kind, cancel.clone()) {
            previous.cancel();
        }
        self.state.progress.remove(&kind);
        self.toast.spinner(kind, format!("{}…", kind.label()));

        let client = self.client.clone();
        let ticket = pending.ticket;
        let request = pending.request;
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let report = move |state: &TaskState| {
                let _ = progress_tx.try_send(AppMessage::ActionProgress(ticket, state.clone()));
            };
            let on_progress: ProgressFn<'_> = &report;
            let outcome = client.call(&request, &cancel, Some(on_progress)).await;
            let _ = tx.send(AppMessage::ActionFinished(ticket, outcome)).await;
        });
    }

    /// Cancel every running action and forget their progress.
    fn cancel_in_flight(&mut self) {
        for (kind, token) in self.in_flight.drain() {
            debug!("cancelling {}", kind.label());
            token.cancel();
        }
        self.state.progress.clear();
        self.state.plot_download = None;
        self.toast.dismiss_all_spinners();
    }

    fn open_plot_dialog(&mut self) {
        let d = &self.state.dashboard;
        if d.busy().generate_plot {
            self.toast.warning("Generate plot is already running");
            return;
        }
        let ready = d.model_loaded() && d.data_loaded() && d.dataset_path().is_some();
        if !ready {
            // Let the controller report which precondition is missing.
            self.start_action(Intent::GeneratePlot(self.state.plot_defaults));
            return;
        }
        self.wm.show_plot_dialog = true;
        self.state.input_mode = InputMode::Dialog;
    }

    fn download_plot(&mut self) {
        let Some(url) = self.state.dashboard.plot_url().map(str::to_string) else {
            self.toast.warning("No plot to download yet");
            return;
        };
        let model = self
            .state
            .dashboard
            .selected_model()
            .unwrap_or("plot")
            .to_string();
        match self.downloads.start_download(&url, &model) {
            Ok(dest) => {
                self.state.plot_download = Some(DownloadStatus::Downloading(None));
                self.toast.info(format!("downloading to {}", dest.display()));
            }
            Err(e) => self.toast.warning(e),
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | (keys bar) ─────────────────────────
        let status_h = if self.wm.show_keys_bar { 1u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.header.min_height()),
                Constraint::Min(0),
                Constraint::Length(status_h),
            ])
            .split(area);

        self.header.draw(frame, outer[0], false, &self.state);

        if self.wm.show_keys_bar {
            status_bar::draw_keys_bar(frame, outer[2], self.state.input_mode, self.wm.workspace);
        }

        match self.wm.workspace {
            Workspace::Dashboard => self.draw_dashboard(frame, outer[1]),
            Workspace::Docs => {
                self.pane_areas = PaneAreas {
                    docs_panel: outer[1],
                    ..PaneAreas::default()
                };
                let focused = self.wm.focused() == Some(ComponentId::DocsPanel);
                self.docs_panel.draw(frame, outer[1], focused, &self.state);
            }
        }

        if self.wm.show_plot_dialog {
            self.plot_dialog.draw(frame, area, true, &self.state);
        }

        if self.wm.show_help {
            self.help_overlay.draw(frame, area, false, &self.state);
        }

        // Toast notifications (topmost layer)
        self.toast.draw(frame, area);
    }

    fn draw_dashboard(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let top_h = self
            .model_list
            .min_height()
            .max(self.dataset_panel.min_height())
            .max(14);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(top_h),
                Constraint::Min(self.forecast_panel.min_height()),
            ])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);

        self.pane_areas = PaneAreas {
            model_list: top[0],
            dataset_panel: top[1],
            forecast_panel: rows[1],
            docs_panel: Rect::default(),
        };

        let focused = self.wm.focused();
        self.model_list.draw(
            frame,
            top[0],
            focused == Some(ComponentId::ModelList),
            &self.state,
        );
        self.dataset_panel.draw(
            frame,
            top[1],
            focused == Some(ComponentId::DatasetPanel),
            &self.state,
        );
        self.forecast_panel.draw(
            frame,
            rows[1],
            focused == Some(ComponentId::ForecastPanel),
            &self.state,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samay_proto::config::ApiConfig;

    fn app() -> App {
        let mut config = Config::default();
        config.api = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
        };
        let client = ForecastClient::new(&config.api, &config.polling).unwrap();
        App::new(config, client)
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_generate_plot_key_without_model_reports_error() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(8);
        app.msg_tx = Some(tx);
        app.state.dashboard.select_model("LPTM");

        for a in app.handle_key(key('g')) {
            app.dispatch(a).await;
        }
        assert!(!app.wm.show_plot_dialog);
        assert_eq!(app.state.dashboard.error(), Some("Please load a model first"));
        assert!(app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_model_selection_cancels_in_flight() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(8);
        app.msg_tx = Some(tx);
        app.dispatch(Action::SelectModel("LPTM".to_string())).await;
        app.dispatch(Action::LoadModel).await;
        let token = app.in_flight.get(&ActionKind::LoadModel).cloned().unwrap();
        assert!(app.state.dashboard.busy().load_model);

        app.dispatch(Action::SelectModel("Moment".to_string())).await;
        assert!(token.is_cancelled());
        assert!(app.in_flight.is_empty());
        assert!(!app.state.dashboard.busy().any());
    }

    #[tokio::test]
    async fn test_late_result_after_reset_is_ignored() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(8);
        app.msg_tx = Some(tx);
        app.dispatch(Action::SelectModel("LPTM".to_string())).await;
        let pending = controller::begin(&mut app.state.dashboard, Intent::LoadModel).unwrap();

        app.dispatch(Action::Reset).await;
        app.on_action_finished(pending.ticket, Ok(serde_json::json!({"message": "loaded"})));
        assert!(!app.state.dashboard.model_loaded());
        assert_eq!(app.state.dashboard.message(), None);
    }

    #[tokio::test]
    async fn test_path_prompt_owns_keyboard() {
        let mut app = app();
        for a in app.handle_key(key('u')) {
            app.dispatch(a).await;
        }
        assert_eq!(app.state.input_mode, InputMode::Input);
        assert_eq!(app.wm.focused(), Some(ComponentId::DatasetPanel));

        // 'q' is text while typing a path
        let actions = app.handle_key(key('q'));
        assert!(actions.is_empty());
        assert!(!app.should_quit);

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        for _ in 0..2 {
            for a in app.handle_key(esc) {
                app.dispatch(a).await;
            }
        }
        assert_eq!(app.state.input_mode, InputMode::Normal);
    }
}
