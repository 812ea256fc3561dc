//! LineInput — a one-line editor over tui-input, used for search and forms.

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

#[derive(Debug, PartialEq)]
pub enum InputAction {
    Changed(String),
    Confirmed(String),
    Cancelled,
    None,
}

pub struct LineInput {
    input: Input,
    active: bool,
    prompt: &'static str,
    placeholder: String,
    /// Esc first clears text before closing (search); forms close at once.
    clear_on_esc: bool,
}

impl LineInput {
    pub fn search(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prompt: "/ ",
            placeholder: placeholder.into(),
            clear_on_esc: true,
        }
    }

    pub fn form(prompt: &'static str) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prompt,
            placeholder: String::new(),
            clear_on_esc: false,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Open pre-filled with `value`.
    pub fn activate_with(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => {
                if self.clear_on_esc && !self.input.value().is_empty() {
                    self.input = Input::default();
                    InputAction::Changed(String::new())
                } else {
                    self.deactivate();
                    InputAction::Cancelled
                }
            }
            KeyCode::Enter => {
                self.deactivate();
                InputAction::Confirmed(self.input.value().to_string())
            }
            _ => {
                let prev = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != prev {
                    InputAction::Changed(self.input.value().to_string())
                } else {
                    InputAction::None
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prompt_w = self.prompt.chars().count();
        let width = (area.width as usize).saturating_sub(prompt_w + 1);
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();
        let span = if value.is_empty() && !self.active {
            Span::styled(
                format!("{}{}", self.prompt, self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(
                format!("{}{}", self.prompt, visible),
                Style::default().fg(C_INPUT_FG),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(span)).style(Style::default().bg(C_INPUT_BG)),
            area,
        );
        if self.active && area.width > 0 {
            let cursor_x = area.x + (prompt_w + self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn search_esc_clears_then_closes() {
        let mut input = LineInput::search("search...");
        input.activate();
        assert_eq!(input.handle_key(key(KeyCode::Char('a'))), InputAction::Changed("a".into()));
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Changed(String::new()));
        assert!(input.is_active());
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Cancelled);
        assert!(!input.is_active());
    }

    #[test]
    fn form_confirms_prefilled_value() {
        let mut input = LineInput::form("cpm: ");
        input.activate_with("0.1");
        input.handle_key(key(KeyCode::Backspace));
        input.handle_key(key(KeyCode::Char('5')));
        assert_eq!(input.handle_key(key(KeyCode::Enter)), InputAction::Confirmed("0.5".into()));
        assert!(!input.is_active());
    }
}
