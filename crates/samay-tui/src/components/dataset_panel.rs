//! DatasetPanel component: `[2] Dataset`: path prompt for the CSV upload,
//! the chosen file with its size, example-mode notice and the dataset
//! requirements.

use std::path::{Path, PathBuf};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tracing::debug;

use samay_proto::catalog::DATASET_REQUIREMENTS;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, style_section, C_BUSY, C_LINK, C_MUTED, C_PRIMARY, C_READY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        path_input::{PathInput, PromptAction},
    },
};

pub struct DatasetPanel {
    prompt: PathInput,
    /// Size of the last file handed to Upload, keyed by its path.
    file_size: Option<(PathBuf, u64)>,
}

impl DatasetPanel {
    pub fn new() -> Self {
        Self {
            prompt: PathInput::new("path/to/dataset.csv"),
            file_size: None,
        }
    }

    fn size_of(&self, path: &Path) -> Option<u64> {
        match &self.file_size {
            Some((p, n)) if p == path => Some(*n),
            _ => None,
        }
    }
}

/// Size in KB with two decimals, as shown next to the file name.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

impl Component for DatasetPanel {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.prompt.is_active() {
            return match self.prompt.handle_key(key) {
                PromptAction::Submitted(path) => {
                    vec![Action::ClosePathPrompt, Action::UploadDataset(path)]
                }
                PromptAction::Cancelled => vec![Action::ClosePathPrompt],
                PromptAction::Edited => vec![],
            };
        }
        match key.code {
            KeyCode::Enter if state.dashboard.can_upload() => vec![Action::OpenPathPrompt],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenPathPrompt => self.prompt.activate(),
            Action::ClosePathPrompt => self.prompt.deactivate(),
            Action::UploadDataset(path) => {
                self.file_size = std::fs::metadata(path)
                    .ok()
                    .map(|m| (path.clone(), m.len()));
                debug!("dataset chosen: {:?} ({:?} bytes)", path, self.file_size.as_ref().map(|f| f.1));
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let d = &state.dashboard;
        let badge = if d.busy().upload {
            Some(Badge {
                text: "UPLOADING",
                color: C_BUSY,
            })
        } else if d.example_loaded() {
            Some(Badge {
                text: "EXAMPLE",
                color: C_READY,
            })
        } else if d.data_loaded() {
            Some(Badge {
                text: "LOADED",
                color: C_READY,
            })
        } else {
            None
        };
        let block = pane_chrome("Dataset", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        if self.prompt.is_active() {
            self.prompt.draw(frame, rows[0]);
        } else {
            let hint = if d.busy().upload {
                "uploading…"
            } else {
                "Enter/u choose a CSV file to upload"
            };
            frame.render_widget(Paragraph::new(Span::styled(hint, style_muted())), rows[0]);
        }

        let mut lines: Vec<Line> = Vec::new();
        if d.example_loaded() {
            lines.push(Line::from(vec![
                Span::styled("Using example dataset ", Style::default().fg(C_READY)),
                Span::styled(
                    d.dataset_path().unwrap_or_default().to_string(),
                    Style::default().fg(C_LINK),
                ),
            ]));
        } else if let Some(file) = d.uploaded_file() {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let mut spans = vec![Span::styled(
                name,
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )];
            if let Some(n) = self.size_of(file) {
                spans.push(Span::styled(format!("  {}", format_kb(n)), style_secondary()));
            }
            lines.push(Line::from(spans));
            if let Some(p) = d.dataset_path() {
                lines.push(Line::from(vec![
                    Span::styled("server path ", style_muted()),
                    Span::styled(p.to_string(), Style::default().fg(C_LINK)),
                ]));
            }
        } else {
            lines.push(Line::from(Span::styled("No dataset yet.", style_secondary())));
        }

        let example_hint = if d.can_use_example() {
            Span::styled("e  use the example dataset", style_secondary())
        } else {
            Span::styled("e  use the example dataset (load a model first)", Style::default().fg(C_MUTED))
        };
        lines.push(Line::from(example_hint));

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Dataset requirements", style_section())));
        for req in DATASET_REQUIREMENTS {
            lines.push(Line::from(vec![
                Span::styled(" • ", style_muted()),
                Span::styled(*req, style_secondary()),
            ]));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rows[2]);
    }

    fn min_height(&self) -> u16 {
        6
    }
}
