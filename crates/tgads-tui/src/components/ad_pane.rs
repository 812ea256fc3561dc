//! AdPane — ad draft form: product, generated text and the publish fields.

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use tgads_core::ads::AdField;

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::markup::truncate;
use crate::theme::{style_cursor, style_default, style_muted, style_secondary, C_OK, C_PENDING};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{pane_chrome, Badge};

const LABEL_W: usize = 14;

pub struct AdPane {
    cursor: usize,
    editing: Option<AdField>,
    editor: LineInput,
}

impl AdPane {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            editing: None,
            editor: LineInput::form("> "),
        }
    }

    fn field(&self) -> AdField {
        AdField::ALL[self.cursor.min(AdField::ALL.len() - 1)]
    }

    fn close_editor(&mut self) {
        self.editor.deactivate();
        self.editing = None;
    }
}

impl Component for AdPane {
    fn id(&self) -> ComponentId {
        ComponentId::AdPane
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if let Some(field) = self.editing {
            return match self.editor.handle_key(key) {
                InputAction::Confirmed(text) => {
                    self.close_editor();
                    vec![Action::SetAdField(field, text), Action::CloseInput]
                }
                InputAction::Cancelled => {
                    self.close_editor();
                    vec![Action::CloseInput]
                }
                InputAction::Changed(_) | InputAction::None => vec![],
            };
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor = (self.cursor + 1).min(AdField::ALL.len() - 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let field = self.field();
                if field.is_choice() {
                    return vec![Action::CycleAdField(field)];
                }
                self.editing = Some(field);
                self.editor.activate_with(&state.draft.display(field));
                return vec![Action::OpenInput];
            }
            KeyCode::Char('g') => return vec![Action::GenerateAd],
            KeyCode::Char('P') => return vec![Action::PublishAd],
            KeyCode::Char('y') if !state.draft.ad_text.is_empty() => {
                return vec![Action::CopyToClipboard(state.draft.ad_text.clone())];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(_) = event.kind {
            let top = area.y + 1;
            if event.row >= top {
                let row = usize::from(event.row - top);
                if row < AdField::ALL.len() {
                    self.cursor = row;
                }
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::FocusNext | Action::FocusPrev | Action::FocusPane(_) if self.editing.is_some() => {
                self.close_editor();
                vec![Action::CloseInput]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.publishing {
            Some(Badge::new("PUBLISHING", C_PENDING))
        } else if state.generating {
            Some(Badge::new("GENERATING", C_PENDING))
        } else {
            state.last_publish.as_ref().map(|m| Badge::new(truncate(m, 24), C_OK))
        };
        frame.render_widget(pane_chrome("ad", Some('4'), focused, badge), area);

        let inner = area.inner(Margin {
            horizontal: 1,
            vertical: 1,
        });
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(AdField::ALL.len() as u16),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let value_w = (inner.width as usize).saturating_sub(LABEL_W);
        let lines: Vec<Line> = AdField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = if self.editing == Some(*field) {
                    String::new()
                } else {
                    state.draft.display(*field)
                };
                let value_style = if field.is_choice() { style_secondary() } else { style_default() };
                let line = Line::from(vec![
                    Span::styled(format!("{:<width$}", field.label(), width = LABEL_W), style_muted()),
                    Span::styled(truncate(&value, value_w), value_style),
                ]);
                if i == self.cursor {
                    line.style(style_cursor(focused))
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), parts[0]);

        if self.editing.is_some() {
            let row = Rect {
                x: parts[0].x + LABEL_W as u16,
                y: parts[0].y + self.cursor as u16,
                width: parts[0].width.saturating_sub(LABEL_W as u16),
                height: 1,
            };
            if row.y < parts[0].y + parts[0].height {
                self.editor.draw(frame, row);
            }
        }

        let preview = if state.draft.ad_text.is_empty() {
            Line::from(Span::styled("g generates ad text from the selection", style_muted()))
        } else {
            Line::from(Span::styled(state.draft.ad_text.clone(), Style::default()))
        };
        frame.render_widget(Paragraph::new(preview).wrap(Wrap { trim: false }), parts[2]);
    }
}

impl Default for AdPane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_state;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(pane: &mut AdPane, state: &AppState, code: KeyCode) -> Vec<Action> {
        pane.handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn choice_fields_cycle_and_text_fields_open_editor() {
        let state = test_state();
        let mut pane = AdPane::new();
        assert!(matches!(press(&mut pane, &state, KeyCode::Enter).as_slice(), [Action::OpenInput]));
        press(&mut pane, &state, KeyCode::Esc);

        for _ in 0..7 {
            press(&mut pane, &state, KeyCode::Down);
        }
        let actions = press(&mut pane, &state, KeyCode::Enter);
        assert!(matches!(actions.as_slice(), [Action::CycleAdField(AdField::Active)]));
    }

    #[test]
    fn edited_value_is_sent_for_the_field_under_cursor() {
        let state = test_state();
        let mut pane = AdPane::new();
        for _ in 0..3 {
            press(&mut pane, &state, KeyCode::Char('j'));
        }
        press(&mut pane, &state, KeyCode::Enter);
        press(&mut pane, &state, KeyCode::Char('5'));
        let actions = press(&mut pane, &state, KeyCode::Enter);
        assert!(matches!(
            actions.as_slice(),
            [Action::SetAdField(AdField::Cpm, v), Action::CloseInput] if v == "0.15"
        ));
    }
}
