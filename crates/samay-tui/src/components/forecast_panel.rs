//! ForecastPanel component: `[3] Forecast`: the alert line, running actions
//! with their last task state, and the plot reference with its download state.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use samay_proto::controller::ActionKind;
use samay_proto::state::DashboardState;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    download_manager::DownloadStatus,
    theme::{
        style_muted, style_secondary, style_section, C_BUSY, C_ERROR, C_LINK, C_MUTED, C_PRIMARY,
        C_READY,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct ForecastPanel;

impl ForecastPanel {
    pub fn new() -> Self {
        Self
    }
}

/// Cut `s` to at most `max` display columns, ending with `…` when cut.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Key hint for the load step; empty until a model is picked and while loading.
fn load_hint(d: &DashboardState) -> &'static str {
    if d.can_load_model() {
        "l"
    } else {
        ""
    }
}

fn step(done: bool, text: &str, key: &str) -> Line<'static> {
    let (glyph, color) = if done { ("●", C_READY) } else { ("○", C_MUTED) };
    Line::from(vec![
        Span::styled(format!(" {} ", glyph), Style::default().fg(color)),
        Span::styled(text.to_string(), style_secondary()),
        Span::styled(format!("  {}", key), style_muted()),
    ])
}

impl Component for ForecastPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Enter => vec![Action::OpenPlotDialog],
            _ => vec![],
        }
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let d = &state.dashboard;
        let badge = if d.busy().any() {
            Some(Badge {
                text: "WORKING",
                color: C_BUSY,
            })
        } else if d.plot_url().is_some() {
            Some(Badge {
                text: "PLOT",
                color: C_READY,
            })
        } else {
            None
        };
        let block = pane_chrome("Forecast", Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width.saturating_sub(2) as usize;

        let mut lines: Vec<Line> = Vec::new();

        if let Some(err) = d.error() {
            lines.push(Line::from(Span::styled(
                format!("✗ {}", err),
                Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
            )));
        } else if let Some(msg) = d.message() {
            lines.push(Line::from(Span::styled(
                format!("✓ {}", msg),
                Style::default().fg(C_READY).add_modifier(Modifier::BOLD),
            )));
        }

        let running: Vec<String> = ActionKind::ALL
            .iter()
            .filter_map(|k| state.progress_label(*k))
            .collect();
        if !running.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Running", style_section())));
            for r in running {
                lines.push(Line::from(Span::styled(
                    format!(" ◐ {}", r),
                    Style::default().fg(C_BUSY),
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Forecast", style_section())));
        match d.plot_url() {
            Some(url) => {
                lines.push(Line::from(Span::styled(
                    truncate_to_width(url, width),
                    Style::default().fg(C_LINK).add_modifier(Modifier::UNDERLINED),
                )));
                let dl = match &state.plot_download {
                    Some(DownloadStatus::Downloading(Some(f))) => {
                        Span::styled(format!("downloading {:.0}%", f * 100.0), Style::default().fg(C_BUSY))
                    }
                    Some(DownloadStatus::Downloading(None)) => {
                        Span::styled("downloading…", Style::default().fg(C_BUSY))
                    }
                    Some(DownloadStatus::Downloaded(path)) => Span::styled(
                        truncate_to_width(&format!("saved {}", path.display()), width),
                        Style::default().fg(C_READY),
                    ),
                    Some(DownloadStatus::Failed(e)) => Span::styled(
                        truncate_to_width(&format!("download failed: {}", e), width),
                        Style::default().fg(C_ERROR),
                    ),
                    Some(DownloadStatus::NotDownloaded) | None => {
                        Span::styled("d download  y copy URL", style_muted())
                    }
                };
                lines.push(Line::from(dl));
            }
            None if d.busy().generate_plot => {
                lines.push(Line::from(Span::styled(
                    "Generating forecast…",
                    Style::default().fg(C_BUSY),
                )));
            }
            None if d.can_generate_plot() => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "Ready for Forecasting",
                        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("  g / Enter generate plot", style_muted()),
                ]));
            }
            None => {
                lines.push(step(d.selected_model().is_some(), "select a model", "[1] Enter"));
                lines.push(step(d.model_loaded(), "load the model", load_hint(d)));
                lines.push(step(d.data_loaded(), "upload a dataset or use the example", "u / e"));
            }
        }

        if d.model_loaded() && d.data_loaded() {
            lines.push(Line::from(""));
            let t = if d.can_finetune() {
                Span::styled("t fine-tune on the uploaded dataset", style_secondary())
            } else {
                Span::styled("fine-tuning…", Style::default().fg(C_BUSY))
            };
            lines.push(Line::from(t));
        }

        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }),
            Rect {
                x: inner.x + 1,
                width: inner.width.saturating_sub(1),
                ..inner
            },
        );
    }

    fn min_height(&self) -> u16 {
        8
    }
}
