//! Bottom keys bar with the current input mode.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::ComponentId;
use crate::theme::{C_MODE_INPUT, C_MODE_NORMAL, C_MUTED, C_PRIMARY, C_SECONDARY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// A text input owns the keyboard.
    Input,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Input => "INPUT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Input => C_MODE_INPUT,
        }
    }
}

/// Key hints for the focused pane.
pub fn key_hints(mode: InputMode, focused: Option<ComponentId>) -> &'static [(&'static str, &'static str)] {
    if mode == InputMode::Input {
        return &[("enter", "confirm"), ("esc", "cancel")];
    }
    match focused {
        Some(ComponentId::FilterBar) => &[
            ("←/→", "move"),
            ("enter", "toggle filter"),
            ("R", "reload"),
            ("tab", "next pane"),
            ("?", "help"),
        ],
        Some(ComponentId::ChannelTable) => &[
            ("/", "search"),
            ("1-5", "sort"),
            ("a/A", "add/all"),
            ("r", "refresh"),
            ("c/o", "category/geo"),
            ("y", "copy link"),
            ("?", "help"),
        ],
        Some(ComponentId::SelectionPane) => &[
            ("x/X", "remove/clear"),
            ("e", "edit"),
            ("s", "similar"),
            ("y", "copy links"),
            ("?", "help"),
        ],
        Some(ComponentId::AdPane) => &[
            ("enter", "edit"),
            ("g", "generate"),
            ("P", "publish"),
            ("?", "help"),
        ],
        Some(ComponentId::ValuePicker) => &[("enter", "apply"), ("esc", "close")],
        Some(ComponentId::HelpOverlay) | None => &[("?", "help"), ("q", "quit")],
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, focused: Option<ComponentId>) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
    )];
    for (key, desc) in key_hints(mode, focused) {
        spans.push(Span::styled(" ", Style::default()));
        spans.push(Span::styled(*key, Style::default().fg(C_PRIMARY)));
        spans.push(Span::styled(format!(" {}", desc), Style::default().fg(C_SECONDARY)));
        spans.push(Span::styled(" ·", Style::default().fg(C_MUTED)));
    }
    spans.pop();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
