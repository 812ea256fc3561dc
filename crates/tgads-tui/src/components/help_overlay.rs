//! HelpOverlay — centered popup with the keyboard reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::centered_rect;
use crate::theme::{C_MUTED, C_PANEL_BORDER, C_PRIMARY, C_SECONDARY};

pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => vec![Action::ToggleHelp],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleHelp = action {
            self.visible = !self.visible;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        if !self.visible {
            return;
        }
        let popup = centered_rect(64, 32, area);
        let lines = vec![
            Line::from(Span::styled(
                " keyboard shortcuts",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section(" catalog"),
            help_row("enter / space", "filters: toggle chip and refetch"),
            help_row("R", "reload with current filters"),
            help_row("/", "search (esc clears, esc again closes)"),
            help_row("1 … 5", "sort by column; again flips direction"),
            help_row("0", "clear sort"),
            help_row("↑ ↓ / j k", "move cursor"),
            help_row("pg up / pg dn", "page"),
            help_row("g / G", "first / last row"),
            help_row("r", "refresh channel from source"),
            help_row("c / o", "set category / geo"),
            help_row("y", "copy channel link"),
            Line::from(""),
            section(" selection"),
            help_row("a / enter", "add channel under cursor"),
            help_row("A", "replace selection with the view"),
            help_row("x / X", "remove / clear"),
            help_row("e", "edit as comma-separated text"),
            help_row("s", "fetch channels similar to selection"),
            help_row("y / Y", "copy links / names"),
            Line::from(""),
            section(" ad"),
            help_row("enter", "edit field or cycle choice"),
            help_row("g", "generate ad text"),
            help_row("P", "publish ad"),
            Line::from(""),
            help_row("tab / shift-tab", "next / previous pane"),
            help_row("q / ctrl-c", "quit"),
            Line::from(Span::styled(" press ? or esc to close", Style::default().fg(C_MUTED))),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER))
                        .style(Style::default().bg(Color::Rgb(18, 18, 26))),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
    ))
}

fn help_row<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<16}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}

impl Default for HelpOverlay {
    fn default() -> Self {
        Self::new()
    }
}
