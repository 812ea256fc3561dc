//! ValuePicker — popup listing taxonomy values for one channel field.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use tgads_core::{ChannelId, MetaField};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::centered_rect;
use crate::theme::{style_cursor, style_default, style_muted, C_BG, C_PANEL_BORDER_FOCUSED, C_PICKED};

struct Target {
    id: ChannelId,
    field: MetaField,
    username: String,
    current: String,
}

pub struct ValuePicker {
    target: Option<Target>,
    cursor: usize,
    list_state: ListState,
}

impl ValuePicker {
    pub fn new() -> Self {
        Self {
            target: None,
            cursor: 0,
            list_state: ListState::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.target.is_some()
    }

    fn open(&mut self, id: ChannelId, field: MetaField, state: &AppState) {
        let Some(rec) = state.session.fetcher().get(id) else {
            return;
        };
        let current = rec.field(field).to_string();
        self.cursor = state
            .taxonomy
            .values(field)
            .iter()
            .position(|v| *v == current)
            .unwrap_or(0);
        self.target = Some(Target {
            id,
            field,
            username: rec.username.clone(),
            current,
        });
    }
}

impl Component for ValuePicker {
    fn id(&self) -> ComponentId {
        ComponentId::ValuePicker
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        let Some(target) = &self.target else {
            return vec![];
        };
        let values = state.taxonomy.values(target.field);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return vec![Action::ClosePicker],
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(values.len().saturating_sub(1))
            }
            KeyCode::Enter => {
                if let Some(value) = values.get(self.cursor) {
                    return vec![
                        Action::EditField(target.id, target.field, value.clone()),
                        Action::ClosePicker,
                    ];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenPicker(id, field) => {
                self.open(*id, *field, state);
                if self.is_visible() {
                    return vec![Action::FocusPane(ComponentId::ValuePicker)];
                }
            }
            Action::ClosePicker => self.target = None,
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(target) = &self.target else {
            return;
        };
        let values = state.taxonomy.values(target.field);
        let height = (values.len() as u16 + 2).clamp(3, area.height.saturating_sub(4).max(3));
        let popup = centered_rect(40, height, area);
        let title = format!(" {} for @{} ", target.field.label(), target.username);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
            .title(Span::styled(title, style_default()))
            .style(Style::default().bg(C_BG));

        frame.render_widget(Clear, popup);
        if values.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("no values loaded", style_muted()))).block(block),
                popup,
            );
            return;
        }

        let items: Vec<ListItem> = values
            .iter()
            .map(|v| {
                let mark = if *v == target.current { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(C_PICKED)),
                    Span::styled(v.clone(), style_default()),
                ]))
            })
            .collect();
        self.list_state.select(Some(self.cursor.min(values.len() - 1)));
        frame.render_stateful_widget(
            List::new(items).block(block).highlight_style(style_cursor(true)),
            popup,
            &mut self.list_state,
        );
    }
}

impl Default for ValuePicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_state;
    use ratatui::crossterm::event::KeyModifiers;
    use tgads_core::protocol::Taxonomy;
    use tgads_core::ChannelRecord;

    #[test]
    fn opens_on_current_value_and_emits_edit() {
        let mut state = test_state();
        state.taxonomy = Taxonomy {
            categories: vec!["news".into(), "tech".into(), "games".into()],
            geos: vec![],
        };
        let mut rec = ChannelRecord::new(7, "seven");
        rec.category = "tech".into();
        let t = state.session.fetch_catalog();
        state.session.complete_fetch(t.seq(), Ok(vec![rec]));

        let mut picker = ValuePicker::new();
        let follow = picker.on_action(&Action::OpenPicker(7, MetaField::Category), &state);
        assert!(matches!(follow.as_slice(), [Action::FocusPane(ComponentId::ValuePicker)]));

        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        picker.handle_key(down, &state);
        let actions = picker.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::EditField(7, MetaField::Category, v), Action::ClosePicker] if v == "games"
        ));
    }

    #[test]
    fn unknown_channel_does_not_open() {
        let state = test_state();
        let mut picker = ValuePicker::new();
        assert!(picker.on_action(&Action::OpenPicker(1, MetaField::Geo), &state).is_empty());
        assert!(!picker.is_visible());
    }
}
