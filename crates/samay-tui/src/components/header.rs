//! Header component: 1-row top bar.
//!
//! Left: app name, selected model and readiness lamps. Right: service host.
//! Not focusable.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_BUSY, C_MODEL, C_MUTED, C_READY, C_SECONDARY},
};

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

fn lamp(label: &str, on: bool, busy: bool) -> Vec<Span<'static>> {
    let (glyph, color) = if busy {
        ("◐", C_BUSY)
    } else if on {
        ("●", C_READY)
    } else {
        ("○", C_MUTED)
    };
    vec![
        Span::styled(format!(" {} ", glyph), Style::default().fg(color)),
        Span::styled(label.to_string(), Style::default().fg(C_SECONDARY)),
    ]
}

/// Host part of the base URL, for a compact display.
fn host_of(base_url: &str) -> &str {
    let rest = base_url
        .split_once("://")
        .map(|(_, r)| r)
        .unwrap_or(base_url);
    rest.split('/').next().unwrap_or(rest)
}

impl Component for Header {
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let d = &state.dashboard;
        let busy = d.busy();
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(40)])
            .split(area);

        let mut left = vec![
            Span::styled(
                " samay ",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled("│ ", Style::default().fg(C_MUTED)),
        ];
        match d.selected_model() {
            Some(m) => left.push(Span::styled(
                m.to_string(),
                Style::default().fg(C_MODEL).add_modifier(Modifier::BOLD),
            )),
            None => left.push(Span::styled("no model", Style::default().fg(C_MUTED))),
        }
        left.extend(lamp("model", d.model_loaded(), busy.load_model));
        left.extend(lamp(
            if d.example_loaded() { "example" } else { "data" },
            d.data_loaded(),
            busy.upload,
        ));
        left.extend(lamp("plot", d.plot_url().is_some(), busy.generate_plot));
        if busy.finetune {
            left.extend(lamp("finetune", false, true));
        }
        frame.render_widget(Paragraph::new(Line::from(left)), cols[0]);

        let right = Line::from(Span::styled(
            format!("{} ", host_of(&state.base_url)),
            Style::default().fg(C_MUTED),
        ))
        .right_aligned();
        frame.render_widget(Paragraph::new(right), cols[1]);
    }

    fn min_height(&self) -> u16 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://svc.example.app"), "svc.example.app");
        assert_eq!(host_of("http://127.0.0.1:8000/api"), "127.0.0.1:8000");
        assert_eq!(host_of("localhost"), "localhost");
    }
}
