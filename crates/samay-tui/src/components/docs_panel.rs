//! DocsPanel: the Docs workspace: model catalogue, dataset requirements and
//! a short walkthrough. Scrollable.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use samay_proto::catalog::{DATASET_REQUIREMENTS, MODELS};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{style_default, style_muted, style_secondary, style_section, C_MODEL, C_PRIMARY},
    widgets::pane_chrome::pane_chrome,
};

const WALKTHROUGH: &[(&str, &str)] = &[
    ("1", "Pick a model in [1] Models and press Enter."),
    ("2", "Press l to load it on the service."),
    ("3", "Press u and type the path of a CSV file, or e for the example dataset."),
    ("4", "Optionally press t to fine-tune the model on your data."),
    ("5", "Press g, choose Finetune / No Finetune and the epochs, then Enter."),
    ("6", "Press d to download the plot or y to copy its URL."),
];

pub struct DocsPanel {
    scroll: u16,
}

impl DocsPanel {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    fn lines(state: &AppState) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "samay: time-series forecasting dashboard",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("service: {}", state.base_url),
                style_muted(),
            )),
            Line::from(""),
            Line::from(Span::styled("Getting started", style_section())),
        ];
        for (n, text) in WALKTHROUGH {
            lines.push(Line::from(vec![
                Span::styled(format!(" {}. ", n), style_muted()),
                Span::styled(*text, style_default()),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Models", style_section())));
        for m in MODELS {
            lines.push(Line::from(Span::styled(
                format!(" {}", m.name),
                Style::default().fg(C_MODEL).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("   {}", m.description),
                style_secondary(),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Dataset requirements", style_section())));
        for req in DATASET_REQUIREMENTS {
            lines.push(Line::from(vec![
                Span::styled(" • ", style_muted()),
                Span::styled(*req, style_secondary()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled(" • ", style_muted()),
            Span::styled(
                format!("Example dataset on the service: {}", state.example_path),
                style_secondary(),
            ),
        ]));
        lines
    }
}

impl Component for DocsPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::ScrollUp(1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::ScrollDown(1)],
            KeyCode::PageUp => vec![Action::ScrollUp(10)],
            KeyCode::PageDown => vec![Action::ScrollDown(10)],
            KeyCode::Home | KeyCode::Char('g') => {
                self.scroll = 0;
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::ScrollUp(n) => self.scroll = self.scroll.saturating_sub(*n as u16),
            Action::ScrollDown(n) => {
                let max = Self::lines(state).len().saturating_sub(1) as u16;
                self.scroll = (self.scroll + *n as u16).min(max);
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("Docs", None, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(Self::lines(state))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            Rect {
                x: inner.x + 1,
                width: inner.width.saturating_sub(2),
                ..inner
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samay_proto::config::Config;

    #[test]
    fn test_scroll_is_bounded() {
        let state = AppState::new(&Config::default());
        let mut docs = DocsPanel::new();
        docs.on_action(&Action::ScrollUp(3), &state);
        assert_eq!(docs.scroll, 0);
        docs.on_action(&Action::ScrollDown(1000), &state);
        assert_eq!(docs.scroll as usize, DocsPanel::lines(&state).len() - 1);
    }

    #[test]
    fn test_lists_every_model() {
        let state = AppState::new(&Config::default());
        let text: String = DocsPanel::lines(&state)
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        for m in MODELS {
            assert!(text.contains(m.description));
        }
    }
}
