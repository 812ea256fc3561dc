//! FilterBar — category and geo chips; toggling one refetches the catalog.

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use tgads_core::MetaField;

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::theme::{style_cursor, style_muted, C_CATEGORY, C_ERROR, C_GEO, C_SECONDARY};
use crate::widgets::pane_chrome::pane_chrome;

const ROWS: [MetaField; 2] = [MetaField::Category, MetaField::Geo];
const LABEL_W: u16 = 10;

/// First chip to draw so that chip `cursor` fits in `avail` columns.
pub fn first_visible(widths: &[u16], cursor: usize, avail: u16) -> usize {
    let mut start = 0;
    while start < cursor {
        let used: u16 = widths[start..=cursor.min(widths.len().saturating_sub(1))]
            .iter()
            .map(|w| w + 1)
            .sum();
        if used <= avail {
            break;
        }
        start += 1;
    }
    start
}

fn chip_text(value: &str) -> String {
    format!(" {} ", value)
}

pub struct FilterBar {
    row: usize,
    cols: [usize; 2],
    /// Hit boxes from the last draw.
    chips: Vec<(Rect, MetaField, String)>,
}

impl FilterBar {
    pub fn new() -> Self {
        Self {
            row: 0,
            cols: [0, 0],
            chips: Vec::new(),
        }
    }

    fn values<'a>(&self, state: &'a AppState, row: usize) -> &'a [String] {
        state.taxonomy.values(ROWS[row])
    }

    fn current(&self, state: &AppState) -> Option<(MetaField, String)> {
        let values = self.values(state, self.row);
        values
            .get(self.cols[self.row].min(values.len().saturating_sub(1)))
            .map(|v| (ROWS[self.row], v.clone()))
    }

    fn move_col(&mut self, delta: isize, state: &AppState) {
        let len = self.values(state, self.row).len();
        if len == 0 {
            return;
        }
        let col = self.cols[self.row].min(len - 1);
        self.cols[self.row] = col.saturating_add_signed(delta).min(len - 1);
    }
}

impl Component for FilterBar {
    fn id(&self) -> ComponentId {
        ComponentId::FilterBar
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_col(-1, state),
            KeyCode::Right | KeyCode::Char('l') => self.move_col(1, state),
            KeyCode::Home => self.cols[self.row] = 0,
            KeyCode::Up | KeyCode::Char('k') => self.row = 0,
            KeyCode::Down | KeyCode::Char('j') => self.row = 1,
            KeyCode::Enter | KeyCode::Char(' ') => {
                return self
                    .current(state)
                    .map(|(field, value)| Action::ToggleFilter(field, value))
                    .into_iter()
                    .collect();
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        let hit = self.chips.iter().find(|(r, _, _)| {
            event.column >= r.x && event.column < r.x + r.width && event.row == r.y
        });
        match hit {
            Some((_, field, value)) => vec![Action::ToggleFilter(*field, value.clone())],
            None => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        frame.render_widget(pane_chrome("filters", Some('1'), focused, None), area);
        let inner = area.inner(Margin {
            horizontal: 1,
            vertical: 1,
        });
        self.chips.clear();

        if let Some(err) = &state.taxonomy_error {
            let line = Line::from(Span::styled(
                format!("taxonomy unavailable: {}", err),
                Style::default().fg(C_ERROR),
            ));
            frame.render_widget(Paragraph::new(line), inner);
            return;
        }

        for (row, field) in ROWS.iter().enumerate() {
            if row as u16 >= inner.height {
                break;
            }
            let y = inner.y + row as u16;
            let values = self.values(state, row);
            let active = state.session.filter().get(*field);
            let color = match field {
                MetaField::Category => C_CATEGORY,
                MetaField::Geo => C_GEO,
            };

            let mut spans = vec![Span::styled(
                format!("{:<width$}", field.label(), width = LABEL_W as usize),
                Style::default().fg(C_SECONDARY),
            )];
            if values.is_empty() {
                spans.push(Span::styled("…", style_muted()));
            }

            let avail = inner.width.saturating_sub(LABEL_W);
            let widths: Vec<u16> = values.iter().map(|v| chip_text(v).width() as u16).collect();
            let cursor = self.cols[row].min(values.len().saturating_sub(1));
            let start = first_visible(&widths, cursor, avail);

            let mut x = inner.x + LABEL_W;
            for (i, value) in values.iter().enumerate().skip(start) {
                let w = widths[i];
                if x + w > inner.x + inner.width {
                    break;
                }
                let mut style = if active == Some(value.as_str()) {
                    Style::default().fg(color).add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(color)
                };
                if focused && row == self.row && i == cursor {
                    style = style.patch(style_cursor(true));
                }
                spans.push(Span::styled(chip_text(value), style));
                spans.push(Span::raw(" "));
                self.chips.push((
                    Rect {
                        x,
                        y,
                        width: w,
                        height: 1,
                    },
                    *field,
                    value.clone(),
                ));
                x += w + 1;
            }

            frame.render_widget(
                Paragraph::new(Line::from(spans)),
                Rect {
                    x: inner.x,
                    y,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }
}

impl Default for FilterBar {
    fn default() -> Self {
        Self::new()
    }
}
