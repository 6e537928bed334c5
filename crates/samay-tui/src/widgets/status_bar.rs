//! Status bar: bottom line with mode label and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::Workspace;
use crate::theme::{C_MODE_DIALOG, C_MODE_INPUT, C_MODE_NORMAL, C_MUTED};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// Typing a dataset path.
    Input,
    /// Plot options dialog open.
    Dialog,
}

impl InputMode {
    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Input => C_MODE_INPUT,
            Self::Dialog => C_MODE_DIALOG,
        }
    }
}

fn keys_hint(mode: InputMode, workspace: Workspace) -> &'static str {
    match mode {
        InputMode::Normal => match workspace {
            Workspace::Dashboard => {
                " ↑↓/jk select  Enter choose  l load  u upload  e example  t finetune  g plot  d download  y copy  r reset  w docs  Tab/1-3 panes  K keys  ? help  q quit"
            }
            Workspace::Docs => " ↑↓/jk scroll  w dashboard  K keys  ? help  q quit",
        },
        InputMode::Input => " type a CSV path (~ = home)  Enter upload  Esc clear/cancel",
        InputMode::Dialog => " ←→ change  ↑↓ field  f finetune  +/- epochs  Enter generate  Esc cancel",
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, workspace: Workspace) {
    let label = match mode {
        InputMode::Normal => workspace.label(),
        InputMode::Input => "PATH",
        InputMode::Dialog => "PLOT",
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_hint(mode, workspace), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
