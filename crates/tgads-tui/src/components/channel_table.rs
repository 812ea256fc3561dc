//! ChannelTable — the windowed, searchable, sortable channel list.
//!
//! Only the rows in the session's current [`RowWindow`] are turned into
//! lines. The paragraph is then scrolled by however far the viewport top
//! sits below the first materialised row, so overscan rows stay off screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use tgads_core::catalog::{FetchState, SortField};
use tgads_core::{ChannelRecord, MetaField};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::markup::{group_digits, has_image, pad, pad_left, plain_text, truncate};
use crate::theme::{
    style_cursor, style_default, style_header, style_muted, style_secondary, C_CATEGORY, C_ERROR,
    C_GEO, C_OK, C_PENDING, C_PICKED,
};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{pane_chrome, Badge};

const MARKER_W: u16 = 2;
const USERNAME_W: u16 = 18;
const CATEGORY_W: u16 = 14;
const GEO_W: u16 = 8;
const SUBSCRIBERS_W: u16 = 12;
const MIN_TITLE_W: u16 = 8;
const DETAIL_H: u16 = 2;

/// Column widths for one table width; title takes what is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    widths: [u16; 5],
}

impl Columns {
    pub fn fit(width: u16) -> Self {
        let fixed = MARKER_W + USERNAME_W + CATEGORY_W + GEO_W + SUBSCRIBERS_W + 4;
        let title = width.saturating_sub(fixed).max(MIN_TITLE_W);
        Self {
            widths: [title, USERNAME_W, CATEGORY_W, GEO_W, SUBSCRIBERS_W],
        }
    }

    pub fn width(&self, field: SortField) -> u16 {
        self.widths[Self::slot(field)]
    }

    fn slot(field: SortField) -> usize {
        SortField::ALL.iter().position(|&f| f == field).unwrap_or(0)
    }

    /// Column under relative x, for header clicks.
    pub fn field_at(&self, x: u16) -> Option<SortField> {
        let mut left = MARKER_W;
        for (i, field) in SortField::ALL.iter().enumerate() {
            let right = left + self.widths[i];
            if x >= left && x < right {
                return Some(*field);
            }
            left = right + 1;
        }
        None
    }
}

/// Sub-areas of the table's inner rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub header: Rect,
    pub body: Rect,
    pub detail: Rect,
    pub search: Rect,
}

/// Split the table pane. Shared with the App, which sizes the viewport
/// from `body` before drawing.
pub fn table_layout(area: Rect, show_search: bool) -> TableLayout {
    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_search { 1 } else { 0 }),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(DETAIL_H),
        ])
        .split(inner);
    TableLayout {
        search: parts[0],
        header: parts[1],
        body: parts[2],
        detail: parts[3],
    }
}

/// Display position under a body row, given the scroll offset in lines.
pub fn position_at(body_row: u16, offset: u64, row_height: u32, len: usize) -> Option<usize> {
    let line = offset + u64::from(body_row);
    let pos = (line / u64::from(row_height.max(1))) as usize;
    (pos < len).then_some(pos)
}

/// Sort key bound to a digit key: 1 title … 5 subscribers.
pub fn sort_key_for(c: char) -> Option<SortField> {
    let n = c.to_digit(10)? as usize;
    SortField::ALL.get(n.checked_sub(1)?).copied()
}

pub struct ChannelTable {
    search: LineInput,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self {
            search: LineInput::search("search title, username, description..."),
        }
    }

    /// The search row shows while typing and while a query is applied.
    pub fn search_visible(&self, state: &AppState) -> bool {
        self.search.is_active() || !state.session.query().is_empty()
    }

    fn badge(state: &AppState) -> Option<Badge> {
        let session = &state.session;
        match session.fetch_state() {
            FetchState::Idle => None,
            FetchState::Loading => Some(Badge::new("LOADING", C_PENDING)),
            FetchState::Failed(_) => Some(Badge::new("ERR", C_ERROR)),
            FetchState::Ready => {
                let shown = session.view().len();
                let total = session.records().len();
                let text = if shown == total {
                    total.to_string()
                } else {
                    format!("{}/{}", shown, total)
                };
                Some(Badge::new(text, C_OK))
            }
        }
    }

    fn header_line(cols: &Columns, state: &AppState) -> Line<'static> {
        let sort = state.session.sort();
        let mut spans = vec![Span::raw(" ".repeat(MARKER_W as usize))];
        for (i, field) in SortField::ALL.iter().enumerate() {
            let arrow = if sort.key == Some(*field) { sort.dir.arrow() } else { "" };
            let label = format!("{} {}{}", i + 1, field.label(), arrow);
            let w = cols.width(*field) as usize;
            let cell = if *field == SortField::Subscribers {
                pad_left(&label, w)
            } else {
                pad(&label, w)
            };
            spans.push(Span::styled(cell, style_header()));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }

    fn row_lines(
        rec: &ChannelRecord,
        cols: &Columns,
        row_height: u32,
        cursor: bool,
        focused: bool,
        state: &AppState,
    ) -> Vec<Line<'static>> {
        let picked = state.session.selection().contains(&rec.username);
        let refreshing = state.session.fetcher().is_refreshing(rec.id);
        let marker = if refreshing {
            Span::styled("↻ ", Style::default().fg(C_PENDING))
        } else if picked {
            Span::styled("● ", Style::default().fg(C_PICKED))
        } else {
            Span::raw("  ")
        };
        let title = plain_text(&rec.title);
        let title = if title.is_empty() { rec.username.clone() } else { title };

        let cell = |field: SortField, text: &str| pad(text, cols.width(field) as usize);
        let mut main = Line::from(vec![
            marker,
            Span::styled(cell(SortField::Title, &title), style_default()),
            Span::raw(" "),
            Span::styled(cell(SortField::Username, &format!("@{}", rec.username)), style_secondary()),
            Span::raw(" "),
            Span::styled(cell(SortField::Category, &rec.category), Style::default().fg(C_CATEGORY)),
            Span::raw(" "),
            Span::styled(cell(SortField::Geo, &rec.geo), Style::default().fg(C_GEO)),
            Span::raw(" "),
            Span::styled(
                pad_left(&group_digits(rec.subscribers), cols.width(SortField::Subscribers) as usize),
                style_default(),
            ),
        ]);
        if cursor {
            main = main.style(style_cursor(focused));
        }

        let mut lines = vec![main];
        for extra in 1..row_height {
            let text = if extra == 1 {
                let width = cols.width(SortField::Title) as usize + USERNAME_W as usize;
                format!("  {}", truncate(&rec.description, width))
            } else {
                String::new()
            };
            let mut line = Line::from(Span::styled(text, style_muted()));
            if cursor {
                line = line.style(style_cursor(focused));
            }
            lines.push(line);
        }
        lines
    }

    fn empty_message(state: &AppState) -> Line<'static> {
        let session = &state.session;
        match session.fetch_state() {
            FetchState::Idle => Line::from(Span::styled("  press R to load the catalog", style_muted())),
            FetchState::Loading => Line::from(Span::styled("  loading…", Style::default().fg(C_PENDING))),
            FetchState::Failed(msg) => {
                Line::from(Span::styled(format!("  {}", msg), Style::default().fg(C_ERROR)))
            }
            FetchState::Ready if session.records().is_empty() => {
                Line::from(Span::styled("  no channels", style_muted()))
            }
            FetchState::Ready => Line::from(Span::styled(
                format!("  nothing matches \"{}\"", session.query()),
                style_muted(),
            )),
        }
    }

    fn detail_lines(state: &AppState, width: usize) -> Vec<Line<'static>> {
        let session = &state.session;
        let mut lines = Vec::new();
        if let (Some(msg), false) = (session.fetch_state().error(), session.records().is_empty()) {
            lines.push(Line::from(Span::styled(
                truncate(&format!("last fetch failed: {}", msg), width),
                Style::default().fg(C_ERROR),
            )));
        }
        if let Some(rec) = session.cursor_record() {
            let mut head = rec.preview_url();
            if has_image(&rec.photo_element) {
                head.push_str("  [photo]");
            }
            if let Some(at) = session.fetcher().loaded_at() {
                head.push_str(&format!("  · loaded {}", at.format("%H:%M:%S")));
            }
            lines.push(Line::from(Span::styled(truncate(&head, width), style_secondary())));
            lines.push(Line::from(Span::styled(truncate(&rec.description, width), style_muted())));
        }
        lines.truncate(DETAIL_H as usize);
        lines
    }

    fn cursor_actions(state: &AppState, f: impl FnOnce(&ChannelRecord) -> Action) -> Vec<Action> {
        state.session.cursor_record().map(f).into_iter().collect()
    }
}

impl Component for ChannelTable {
    fn id(&self) -> ComponentId {
        ComponentId::ChannelTable
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if self.search.is_active() {
            match key.code {
                KeyCode::Up => return vec![Action::CursorMove(-1)],
                KeyCode::Down => return vec![Action::CursorMove(1)],
                _ => {}
            }
            return match self.search.handle_key(key) {
                InputAction::Changed(q) => vec![Action::Search(q)],
                InputAction::Confirmed(_) => vec![Action::CloseInput],
                InputAction::Cancelled => vec![Action::Search(String::new()), Action::CloseInput],
                InputAction::None => vec![],
            };
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 5 } else { 1 };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::CursorMove(-step)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::CursorMove(step)],
            KeyCode::PageUp => vec![Action::Page(false)],
            KeyCode::PageDown => vec![Action::Page(true)],
            KeyCode::Home | KeyCode::Char('g') => vec![Action::CursorTo(0)],
            KeyCode::End | KeyCode::Char('G') => vec![Action::CursorLast],
            KeyCode::Char('/') => {
                self.search.activate_with(state.session.query());
                vec![Action::OpenInput]
            }
            KeyCode::Char('0') => vec![Action::ClearSort],
            KeyCode::Char(c @ '1'..='5') => sort_key_for(c).map(Action::SortBy).into_iter().collect(),
            KeyCode::Char('a') | KeyCode::Enter => vec![Action::SelectCursor],
            KeyCode::Char('A') => vec![Action::SelectAllVisible],
            KeyCode::Char('r') => Self::cursor_actions(state, |r| Action::Refresh(r.id)),
            KeyCode::Char('c') => {
                Self::cursor_actions(state, |r| Action::OpenPicker(r.id, MetaField::Category))
            }
            KeyCode::Char('o') => Self::cursor_actions(state, |r| Action::OpenPicker(r.id, MetaField::Geo)),
            KeyCode::Char('y') => Self::cursor_actions(state, |r| Action::CopyToClipboard(r.link())),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let layout = table_layout(area, self.search_visible(state));
        match event.kind {
            MouseEventKind::ScrollUp => vec![Action::Scroll(-3)],
            MouseEventKind::ScrollDown => vec![Action::Scroll(3)],
            MouseEventKind::Down(MouseButton::Left) => {
                if layout.header.height > 0 && event.row == layout.header.y {
                    let cols = Columns::fit(layout.header.width);
                    let x = event.column.saturating_sub(layout.header.x);
                    return cols.field_at(x).map(Action::SortBy).into_iter().collect();
                }
                if event.row >= layout.body.y && event.row < layout.body.y + layout.body.height {
                    let session = &state.session;
                    return position_at(
                        event.row - layout.body.y,
                        session.scroll_offset(),
                        session.viewport().row_height,
                        session.view().len(),
                    )
                    .map(Action::CursorTo)
                    .into_iter()
                    .collect();
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if matches!(action, Action::FocusNext | Action::FocusPrev | Action::FocusPane(_)) && self.search.is_active() {
            self.search.deactivate();
            return vec![Action::CloseInput];
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("channels", Some('2'), focused, Self::badge(state));
        frame.render_widget(block, area);

        let layout = table_layout(area, self.search_visible(state));
        if layout.search.height > 0 {
            self.search.draw(frame, layout.search);
        }
        let cols = Columns::fit(layout.header.width);
        frame.render_widget(Paragraph::new(Self::header_line(&cols, state)), layout.header);

        let session = &state.session;
        let view = session.view();
        if view.is_empty() {
            frame.render_widget(Paragraph::new(Self::empty_message(state)), layout.body);
        } else {
            let vp = session.viewport();
            let window = session.window();
            let cursor = session.cursor();
            let mut lines = Vec::with_capacity(window.len() * vp.row_height as usize);
            for pos in window.range() {
                if let Some(rec) = session.record_at(pos) {
                    lines.extend(Self::row_lines(rec, &cols, vp.row_height, pos == cursor, focused, state));
                }
            }
            let skip = session.scroll_offset().saturating_sub(window.space_above);
            frame.render_widget(
                Paragraph::new(lines).scroll((skip.min(u64::from(u16::MAX)) as u16, 0)),
                layout.body,
            );

            let total = vp.total_extent(view.len());
            if total > u64::from(vp.height) {
                let mut bar = ScrollbarState::new(total as usize)
                    .viewport_content_length(vp.height as usize)
                    .position(session.scroll_offset() as usize);
                frame.render_stateful_widget(
                    Scrollbar::new(ScrollbarOrientation::VerticalRight)
                        .begin_symbol(None)
                        .end_symbol(None),
                    layout.body,
                    &mut bar,
                );
            }
        }

        let detail = Self::detail_lines(state, layout.detail.width as usize);
        frame.render_widget(Paragraph::new(detail), layout.detail);
    }
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self::new()
    }
}
