pub mod ad_pane;
pub mod channel_table;
pub mod filter_bar;
pub mod help_overlay;
pub mod selection_pane;
pub mod value_picker;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// `percent_x` wide, `height` rows tall, centered in `r`.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(r.height)),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

#[cfg(test)]
pub(crate) fn test_state() -> crate::app_state::AppState {
    use std::sync::Arc;
    use tgads_core::config::Config;
    use tgads_core::store::{MemoryStore, StateStore};

    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    crate::app_state::AppState::new(&Config::default(), store, "http://test".into())
}
