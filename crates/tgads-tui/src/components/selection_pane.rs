//! SelectionPane — the chosen channels, in the order they were picked.

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::theme::{style_cursor, style_default, style_muted, C_PICKED};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{pane_chrome, Badge};

pub struct SelectionPane {
    cursor: usize,
    editor: LineInput,
    list_state: ListState,
}

impl SelectionPane {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            editor: LineInput::form("channels: "),
            list_state: ListState::default(),
        }
    }

    fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn current<'a>(&self, state: &'a AppState) -> Option<&'a String> {
        state.session.selection().as_slice().get(self.cursor)
    }
}

impl Component for SelectionPane {
    fn id(&self) -> ComponentId {
        ComponentId::SelectionPane
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if self.editor.is_active() {
            return match self.editor.handle_key(key) {
                InputAction::Confirmed(text) => vec![Action::SetSelectionText(text), Action::CloseInput],
                InputAction::Cancelled => vec![Action::CloseInput],
                InputAction::Changed(_) | InputAction::None => vec![],
            };
        }

        let selection = state.session.selection();
        self.clamp(selection.len());
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(selection.len().saturating_sub(1))
            }
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.cursor = selection.len().saturating_sub(1),
            KeyCode::Char('x') | KeyCode::Delete => {
                return self
                    .current(state)
                    .map(|u| Action::Deselect(u.clone()))
                    .into_iter()
                    .collect();
            }
            KeyCode::Char('X') => return vec![Action::ClearSelection],
            KeyCode::Char('e') => {
                self.editor.activate_with(&selection.to_text());
                return vec![Action::OpenInput];
            }
            KeyCode::Char('s') => return vec![Action::FetchSimilar],
            KeyCode::Char('y') if !selection.is_empty() => {
                return vec![Action::CopyToClipboard(selection.links().join("\n"))];
            }
            KeyCode::Char('Y') if !selection.is_empty() => {
                return vec![Action::CopyToClipboard(selection.to_text())];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let len = state.session.selection().len();
        match event.kind {
            MouseEventKind::ScrollUp => self.cursor = self.cursor.saturating_sub(1),
            MouseEventKind::ScrollDown => self.cursor = (self.cursor + 1).min(len.saturating_sub(1)),
            MouseEventKind::Down(_) => {
                let top = area.y + 1;
                if event.row >= top {
                    let row = self.list_state.offset() + usize::from(event.row - top);
                    if row < len {
                        self.cursor = row;
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::ClearSelection | Action::SetSelectionText(_) => self.cursor = 0,
            Action::FocusNext | Action::FocusPrev | Action::FocusPane(_) if self.editor.is_active() => {
                self.editor.deactivate();
                return vec![Action::CloseInput];
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let selection = state.session.selection();
        self.clamp(selection.len());
        let badge = (!selection.is_empty()).then(|| Badge::new(selection.len().to_string(), C_PICKED));
        frame.render_widget(pane_chrome("selection", Some('3'), focused, badge), area);

        let inner = area.inner(Margin {
            horizontal: 1,
            vertical: 1,
        });
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(if self.editor.is_active() { 1 } else { 0 }),
            ])
            .split(inner);

        if selection.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "no channels selected (a adds the row under the cursor)",
                    style_muted(),
                ))),
                parts[0],
            );
        } else {
            let items: Vec<ListItem> = selection
                .iter()
                .map(|u| {
                    ListItem::new(Line::from(vec![
                        Span::styled("● ", Style::default().fg(C_PICKED)),
                        Span::styled(format!("@{}", u), style_default()),
                    ]))
                })
                .collect();
            self.list_state.select(Some(self.cursor));
            frame.render_stateful_widget(
                List::new(items).highlight_style(style_cursor(focused)),
                parts[0],
                &mut self.list_state,
            );
        }

        if self.editor.is_active() {
            self.editor.draw(frame, parts[1]);
        }
    }
}

impl Default for SelectionPane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_state;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(pane: &mut SelectionPane, state: &AppState, code: KeyCode) -> Vec<Action> {
        pane.handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn remove_targets_the_cursor_row() {
        let mut state = test_state();
        state.session.set_selection_text("a,b,c");
        let mut pane = SelectionPane::new();
        press(&mut pane, &state, KeyCode::Char('j'));
        let actions = press(&mut pane, &state, KeyCode::Char('x'));
        assert!(matches!(actions.as_slice(), [Action::Deselect(u)] if u == "b"));
    }

    #[test]
    fn copy_needs_a_selection() {
        let mut state = test_state();
        let mut pane = SelectionPane::new();
        assert!(press(&mut pane, &state, KeyCode::Char('y')).is_empty());
        state.session.set_selection_text("durov");
        let actions = press(&mut pane, &state, KeyCode::Char('y'));
        assert!(matches!(actions.as_slice(), [Action::CopyToClipboard(t)] if t == "https://t.me/durov"));
    }

    #[test]
    fn edit_round_trips_the_text_form() {
        let mut state = test_state();
        state.session.set_selection_text("a,b");
        let mut pane = SelectionPane::new();
        assert!(matches!(press(&mut pane, &state, KeyCode::Char('e')).as_slice(), [Action::OpenInput]));
        press(&mut pane, &state, KeyCode::Char(','));
        press(&mut pane, &state, KeyCode::Char('c'));
        let actions = press(&mut pane, &state, KeyCode::Enter);
        assert!(matches!(
            actions.as_slice(),
            [Action::SetSelectionText(t), Action::CloseInput] if t == "a,b,c"
        ));
    }
}
