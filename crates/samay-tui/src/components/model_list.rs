//! ModelList component: `[1] Models`: the model catalogue with the
//! description of the highlighted entry underneath.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use samay_proto::catalog::{self, ModelInfo, MODELS};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{
        style_default, style_secondary, style_selected, style_selected_focused, C_BUSY, C_MODEL,
        C_MUTED, C_READY, C_SEPARATOR,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct ModelList {
    models: &'static [ModelInfo],
    list_state: ListState,
    /// Rows of the list body from the last draw, for mouse hit-testing.
    list_area: Rect,
}

impl ModelList {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            models: MODELS,
            list_state,
            list_area: Rect::default(),
        }
    }

    pub fn highlighted(&self) -> Option<&'static ModelInfo> {
        self.list_state.selected().and_then(|i| self.models.get(i))
    }

    fn move_by(&mut self, delta: isize) {
        if self.models.is_empty() {
            return;
        }
        let last = self.models.len() as isize - 1;
        let cur = self.list_state.selected().unwrap_or(0) as isize;
        self.list_state.select(Some((cur + delta).clamp(0, last) as usize));
    }

    fn choose(&self) -> Vec<Action> {
        match self.highlighted() {
            Some(m) => vec![Action::SelectModel(m.id.to_string())],
            None => vec![],
        }
    }
}

impl Component for ModelList {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::SelectUp(1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::SelectDown(1)],
            KeyCode::Home => {
                self.list_state.select(Some(0));
                vec![]
            }
            KeyCode::End => {
                self.list_state.select(Some(self.models.len().saturating_sub(1)));
                vec![]
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.choose(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.move_by(-1),
            MouseEventKind::ScrollDown => self.move_by(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let a = self.list_area;
                let inside = event.column >= a.x
                    && event.column < a.x + a.width
                    && event.row >= a.y
                    && event.row < a.y + a.height;
                if inside {
                    let idx = (event.row - a.y) as usize + self.list_state.offset();
                    if idx < self.models.len() {
                        let again = self.list_state.selected() == Some(idx);
                        self.list_state.select(Some(idx));
                        // Second click on the same row picks it.
                        if again {
                            return self.choose();
                        }
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::SelectUp(n) => self.move_by(-(*n as isize)),
            Action::SelectDown(n) => self.move_by(*n as isize),
            Action::SelectModel(id) => {
                if let Some(pos) = self.models.iter().position(|m| m.id == id.as_str()) {
                    self.list_state.select(Some(pos));
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let d = &state.dashboard;
        let badge = if d.busy().load_model {
            Some(Badge {
                text: "LOADING",
                color: C_BUSY,
            })
        } else if d.model_loaded() {
            Some(Badge {
                text: "LOADED",
                color: C_READY,
            })
        } else {
            None
        };
        let block = pane_chrome("Models", Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.models.len() as u16),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);
        self.list_area = rows[0];

        let selected = d.selected_model();
        let items: Vec<ListItem> = self
            .models
            .iter()
            .map(|m| {
                let chosen = selected == Some(m.id);
                let marker = if chosen && d.model_loaded() {
                    Span::styled(" ● ", Style::default().fg(C_READY))
                } else if chosen {
                    Span::styled(" ○ ", Style::default().fg(C_MODEL))
                } else {
                    Span::styled("   ", Style::default())
                };
                let name_style = if chosen {
                    Style::default().fg(C_MODEL).add_modifier(Modifier::BOLD)
                } else {
                    style_default()
                };
                ListItem::new(Line::from(vec![marker, Span::styled(m.name, name_style)]))
            })
            .collect();

        let highlight = if focused {
            style_selected_focused()
        } else {
            style_selected()
        };
        frame.render_stateful_widget(
            List::new(items).highlight_style(highlight),
            rows[0],
            &mut self.list_state,
        );

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "─".repeat(rows[1].width as usize),
                Style::default().fg(C_SEPARATOR),
            ))),
            rows[1],
        );

        let description = match self.highlighted() {
            Some(m) => catalog::description(m.id),
            None => catalog::description(""),
        };
        let mut lines = vec![Line::from(Span::styled(description, style_secondary()))];
        if selected.is_none() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Enter to select, then l to load",
                Style::default().fg(C_MUTED),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), rows[2]);
    }

    fn min_height(&self) -> u16 {
        self.models.len() as u16 + 4
    }
}
