//! Toast notifications: transient status messages plus one animated spinner
//! per running action.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use samay_proto::controller::ActionKind;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> ratatui::style::Color {
        match self {
            Self::Info => C_TOAST_INFO,
            Self::Success => C_TOAST_SUCCESS,
            Self::Warning => C_TOAST_WARNING,
            Self::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Info => "·",
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

struct SpinnerToast {
    owner: ActionKind,
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinners: Vec<SpinnerToast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinners: Vec::new(),
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(6));
    }

    /// Start or update the spinner owned by `owner`. It animates on every
    /// `tick()` and stays until resolved or dismissed.
    pub fn spinner(&mut self, owner: ActionKind, message: impl Into<String>) {
        let message = message.into();
        match self.spinners.iter_mut().find(|s| s.owner == owner) {
            Some(s) => s.message = message,
            None => self.spinners.push(SpinnerToast {
                owner,
                message,
                frame: 0,
            }),
        }
    }

    /// Replace `owner`'s spinner with a normal expiring toast.
    pub fn resolve_spinner(&mut self, owner: ActionKind, severity: Severity, message: impl Into<String>) {
        self.dismiss_spinner(owner);
        let duration = match severity {
            Severity::Error => Duration::from_secs(6),
            Severity::Warning => Duration::from_secs(4),
            _ => Duration::from_secs(3),
        };
        self.push(message, severity, duration);
    }

    pub fn dismiss_spinner(&mut self, owner: ActionKind) {
        self.spinners.retain(|s| s.owner != owner);
    }

    pub fn dismiss_all_spinners(&mut self) {
        self.spinners.clear();
    }

    /// Remove expired toasts and advance spinner frames. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        for s in &mut self.spinners {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinners.is_empty()
    }

    /// Render spinners then toasts, newest first, in the top-right of `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60);
        let bottom = area.y + area.height;
        let mut y = area.y + 1;

        let spinner_rows = self.spinners.iter().map(|s| {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            (format!(" {} {} ", icon, s.message), C_TOAST_INFO)
        });
        let toast_rows = self
            .toasts
            .iter()
            .rev()
            .take(self.max_visible)
            .map(|t| (format!(" {} {} ", t.severity.icon(), t.message), t.severity.color()));

        for (text, color) in spinner_rows.chain(toast_rows) {
            if y >= bottom {
                break;
            }
            let w = (text.chars().count() as u16).min(max_width);
            let x = area.x + area.width.saturating_sub(w + 1);
            let toast_area = Rect {
                x,
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    text,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
            y += 1;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinners_are_per_action() {
        let mut t = ToastManager::new();
        t.spinner(ActionKind::LoadModel, "Load model…");
        t.spinner(ActionKind::UploadDataset, "Upload dataset…");
        t.spinner(ActionKind::LoadModel, "Load model: STARTED");
        assert_eq!(t.spinners.len(), 2);

        t.resolve_spinner(ActionKind::LoadModel, Severity::Success, "Model loaded");
        assert_eq!(t.spinners.len(), 1);
        assert!(!t.is_empty());

        t.dismiss_all_spinners();
        assert_eq!(t.spinners.len(), 0);
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut t = ToastManager::new();
        t.info("hello");
        t.info("hello");
        assert_eq!(t.toasts.len(), 1);
    }
}
