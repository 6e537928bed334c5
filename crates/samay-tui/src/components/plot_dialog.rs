//! PlotDialog: modal for Generate Plot options: Finetune / No Finetune and
//! the epoch count (1–10).

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use samay_proto::controller::PlotOptions;
use samay_proto::protocol::{MAX_EPOCHS, MIN_EPOCHS};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::help_overlay::centered_rect,
    theme::{
        style_muted, style_secondary, C_INPUT_FG, C_OVERLAY_BG, C_PANEL_BORDER_FOCUSED, C_PRIMARY,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Finetune,
    Epochs,
}

pub struct PlotDialog {
    options: PlotOptions,
    field: Field,
}

impl PlotDialog {
    pub fn new(defaults: PlotOptions) -> Self {
        Self {
            options: defaults,
            field: Field::Finetune,
        }
    }

    fn toggle_finetune(&mut self) {
        self.options.finetune = !self.options.finetune;
    }

    fn adjust_epochs(&mut self, delta: i32) {
        let e = self.options.epochs as i32 + delta;
        self.options.epochs = e.clamp(MIN_EPOCHS as i32, MAX_EPOCHS as i32) as u32;
    }

    fn adjust(&mut self, delta: i32) {
        match self.field {
            Field::Finetune => self.toggle_finetune(),
            Field::Epochs => self.adjust_epochs(delta),
        }
    }
}

impl Component for PlotDialog {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return vec![Action::ClosePlotDialog],
            KeyCode::Enter => {
                return vec![Action::ClosePlotDialog, Action::GeneratePlot(self.options)];
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('j')
            | KeyCode::Char('k') => {
                self.field = match self.field {
                    Field::Finetune => Field::Epochs,
                    Field::Epochs => Field::Finetune,
                };
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust(-1),
            KeyCode::Right | KeyCode::Char('l') => self.adjust(1),
            KeyCode::Char('f') | KeyCode::Char(' ') => self.toggle_finetune(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_epochs(1),
            KeyCode::Char('-') => self.adjust_epochs(-1),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                // '0' means 10
                let n = c.to_digit(10).unwrap_or(1);
                self.options.epochs = if n == 0 { MAX_EPOCHS } else { n };
                self.field = Field::Epochs;
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::OpenPlotDialog = action {
            // Each opening starts from the configured defaults.
            self.options = state.plot_defaults;
            self.field = Field::Finetune;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let popup = centered_rect(50, 10, area);
        let model = state.dashboard.selected_model().unwrap_or("no model");

        let marker = |f: Field| {
            if self.field == f {
                Span::styled("▸ ", Style::default().fg(C_INPUT_FG))
            } else {
                Span::raw("  ")
            }
        };
        let choice = |on: bool, label: &'static str| {
            if on {
                Span::styled(
                    format!("[{}]", label),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {} ", label), style_muted())
            }
        };

        let lines = vec![
            Line::from(Span::styled(
                format!(" Generate forecast with {}", model),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw(" "),
                marker(Field::Finetune),
                Span::styled(format!("{:<10}", "Mode"), style_secondary()),
                choice(self.options.finetune, "Finetune"),
                Span::raw(" "),
                choice(!self.options.finetune, "No Finetune"),
            ]),
            Line::from(vec![
                Span::raw(" "),
                marker(Field::Epochs),
                Span::styled(format!("{:<10}", "Epochs"), style_secondary()),
                Span::styled(
                    format!("◂ {:>2} ▸", self.options.epochs),
                    Style::default().fg(C_INPUT_FG).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  ({}–{})", MIN_EPOCHS, MAX_EPOCHS), style_muted()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                " Enter generate  Esc cancel",
                style_muted(),
            )),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
                    .title(" Plot options ")
                    .style(Style::default().bg(C_OVERLAY_BG)),
            ),
            popup,
        );
    }
}
