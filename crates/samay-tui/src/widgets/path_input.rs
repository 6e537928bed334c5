//! PathInput: wraps tui-input as the dataset path prompt.

use std::path::PathBuf;

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED};

pub enum PromptAction {
    Submitted(PathBuf),
    Cancelled,
    Edited,
}

pub struct PathInput {
    input: Input,
    active: bool,
    placeholder: String,
}

impl PathInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Esc clears typed text first and closes the prompt when already empty.
    /// Enter on an empty prompt is ignored.
    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    self.deactivate();
                    PromptAction::Cancelled
                } else {
                    self.input = Input::default();
                    PromptAction::Edited
                }
            }
            KeyCode::Enter => {
                let raw = self.input.value().trim();
                if raw.is_empty() {
                    return PromptAction::Edited;
                }
                let path = expand_path(raw);
                self.deactivate();
                PromptAction::Submitted(path)
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptAction::Edited
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(4) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();
        let span = if value.is_empty() {
            Span::styled(format!("> {}", self.placeholder), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("> {}", visible), Style::default().fg(C_INPUT_FG))
        };
        frame.render_widget(
            Paragraph::new(Line::from(span)).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

/// Expand a leading `~` to the home directory. Surrounding quotes (as left by
/// drag-and-drop into a terminal) are stripped.
pub fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(p: &mut PathInput, s: &str) {
        for c in s.chars() {
            p.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/tmp/a.csv"), PathBuf::from("/tmp/a.csv"));
        assert_eq!(expand_path("  '/tmp/b c.csv' "), PathBuf::from("/tmp/b c.csv"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/data.csv"), home.join("data.csv"));
        }
    }

    #[test]
    fn test_enter_submits_typed_path() {
        let mut p = PathInput::new("path");
        p.activate();
        type_str(&mut p, "/data/x.csv");
        match p.handle_key(key(KeyCode::Enter)) {
            PromptAction::Submitted(path) => assert_eq!(path, PathBuf::from("/data/x.csv")),
            _ => panic!("expected submit"),
        }
        assert!(!p.is_active());
    }

    #[test]
    fn test_esc_clears_then_cancels() {
        let mut p = PathInput::new("path");
        p.activate();
        type_str(&mut p, "abc");
        assert!(matches!(p.handle_key(key(KeyCode::Esc)), PromptAction::Edited));
        assert_eq!(p.input.value(), "");
        assert!(p.is_active());
        assert!(matches!(p.handle_key(key(KeyCode::Esc)), PromptAction::Cancelled));
        assert!(!p.is_active());
    }

    #[test]
    fn test_enter_on_empty_is_ignored() {
        let mut p = PathInput::new("path");
        p.activate();
        assert!(matches!(p.handle_key(key(KeyCode::Enter)), PromptAction::Edited));
        assert!(p.is_active());
    }
}
