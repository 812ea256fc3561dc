//! App — the event loop that drives the curation session.
//!
//! - `App` owns the components and the `AppState` they read.
//! - Terminal input and every backend reply arrive on one `mpsc` channel as
//!   `AppMessage`s. Network calls run on spawned tasks and never block input.
//! - Components return `Vec<Action>`; `apply_action` is the only place that
//!   mutates the session.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tgads_core::ads::{self, AdField};
use tgads_core::catalog::{EditOutcome, FetchOutcome, FetchState, FetchTicket, FieldEdit, RefreshOutcome, Viewport};
use tgads_core::config::Config;
use tgads_core::protocol::{CreateAdResponse, Taxonomy};
use tgads_core::store::StateStore;
use tgads_core::{AdsApi, CatalogApi, ChannelId, ChannelRecord, EngineResult, HttpClient};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::{
    ad_pane::AdPane, channel_table::{self, ChannelTable}, filter_bar::FilterBar,
    help_overlay::HelpOverlay, selection_pane::SelectionPane, value_picker::ValuePicker,
};
use crate::focus::FocusRing;
use crate::theme::{style_muted, style_secondary, C_BG, C_ERROR, C_OK, C_PENDING, C_PRIMARY};
use crate::widgets::status_bar::{self, InputMode};
use crate::widgets::toast::ToastManager;

/// Events fed into the main loop.
pub enum AppMessage {
    Event(Event),
    Taxonomy(EngineResult<Taxonomy>),
    Fetched {
        seq: u64,
        result: EngineResult<Vec<ChannelRecord>>,
    },
    Refreshed {
        id: ChannelId,
        result: EngineResult<ChannelRecord>,
    },
    Edited {
        edit: FieldEdit,
        result: EngineResult<()>,
    },
    AdGenerated(EngineResult<String>),
    AdCreated(EngineResult<CreateAdResponse>),
}

/// Screen areas from the last draw, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    filter_bar: Rect,
    channel_table: Rect,
    selection: Rect,
    ad: Rect,
}

pub struct App {
    state: AppState,
    config: Config,
    api: Arc<HttpClient>,
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    focus: FocusRing,
    filter_bar: FilterBar,
    channel_table: ChannelTable,
    selection_pane: SelectionPane,
    ad_pane: AdPane,
    value_picker: ValuePicker,
    help_overlay: HelpOverlay,
    toast: ToastManager,
    pane_areas: PaneAreas,
    initial_fetch: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn StateStore>, api: HttpClient, initial_fetch: bool) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let state = AppState::new(&config, store, api.base_url().to_string());
        Self {
            state,
            config,
            api: Arc::new(api),
            tx,
            rx: Some(rx),
            focus: FocusRing::new(vec![
                ComponentId::FilterBar,
                ComponentId::ChannelTable,
                ComponentId::SelectionPane,
                ComponentId::AdPane,
            ]),
            filter_bar: FilterBar::new(),
            channel_table: ChannelTable::new(),
            selection_pane: SelectionPane::new(),
            ad_pane: AdPane::new(),
            value_picker: ValuePicker::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            initial_fetch,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut rx = self
            .rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already running"))?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        self.focus.set(ComponentId::ChannelTable);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        self.spawn_taxonomy();
        if self.initial_fetch {
            let ticket = self.state.session.fetch_catalog();
            self.start_fetch(ticket);
        }

        // Toast expiry and spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next);
                    }
                }
                _ = toast_tick.tick() => {
                    needs_redraw = self.toast.tick();
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;
        info!("tgads exiting");
        Ok(())
    }

    // ── Background work ───────────────────────────────────────────────────────

    fn spawn_taxonomy(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_taxonomy().await;
            let _ = tx.send(AppMessage::Taxonomy(result)).await;
        });
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        info!("[fetch] #{} issued ({})", ticket.seq(), ticket.request.label());
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let seq = ticket.seq();
        let request = ticket.request;
        tokio::spawn(async move {
            let result = request.execute(api.as_ref()).await;
            let _ = tx.send(AppMessage::Fetched { seq, result }).await;
        });
    }

    fn spawn_refresh(&self, id: ChannelId) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_one(id).await;
            let _ = tx.send(AppMessage::Refreshed { id, result }).await;
        });
    }

    fn spawn_edit(&self, edit: FieldEdit) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = edit.send(api.as_ref()).await;
            let _ = tx.send(AppMessage::Edited { edit, result }).await;
        });
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    /// Returns whether the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                let actions = self.handle_key(key);
                for action in actions {
                    self.dispatch(action);
                }
            }
            AppMessage::Event(Event::Mouse(ev)) => {
                let actions = self.handle_mouse(ev);
                if actions.is_empty() && !matches!(ev.kind, MouseEventKind::Down(_)) {
                    return false;
                }
                for action in actions {
                    self.dispatch(action);
                }
            }
            AppMessage::Event(Event::Resize(_, _)) => {}
            AppMessage::Event(_) => return false,

            AppMessage::Taxonomy(Ok(taxonomy)) => {
                info!(
                    "[api] taxonomy: {} categories, {} geos",
                    taxonomy.categories.len(),
                    taxonomy.geos.len()
                );
                self.state.taxonomy = taxonomy;
                self.state.taxonomy_error = None;
            }
            AppMessage::Taxonomy(Err(e)) => {
                warn!("[api] taxonomy failed: {}", e);
                self.toast.error(format!("could not load filters: {}", e));
                self.state.taxonomy_error = Some(e.to_string());
            }

            AppMessage::Fetched { seq, result } => match self.state.session.complete_fetch(seq, result) {
                FetchOutcome::Applied { count } => {
                    self.toast.dismiss_spinner();
                    debug!("[fetch] #{} shows {} channels", seq, count);
                }
                FetchOutcome::Failed(msg) => {
                    self.toast.dismiss_spinner();
                    self.toast.error(format!("fetch failed: {}", msg));
                }
                FetchOutcome::Stale => return false,
            },

            AppMessage::Refreshed { id, result } => match self.state.session.complete_refresh(id, result) {
                RefreshOutcome::Patched => {
                    if let Some(rec) = self.state.session.fetcher().get(id) {
                        self.toast.success(format!("@{} refreshed", rec.username));
                    }
                }
                RefreshOutcome::Missing => debug!("[fetch] refresh of {} arrived after it left the list", id),
                RefreshOutcome::Failed(e) => self.toast.error(format!("refresh failed: {}", e)),
            },

            AppMessage::Edited { edit, result } => match self.state.session.complete_edit(&edit, result) {
                Ok(EditOutcome::Applied) => {
                    self.toast.success(format!("{} set to {}", edit.field, edit.value));
                }
                Ok(EditOutcome::Detached) => {
                    self.toast.info(format!("{} saved; channel no longer listed", edit.field));
                }
                Err(e) => self.toast.error(format!("could not set {}: {}", edit.field, e)),
            },

            AppMessage::AdGenerated(result) => {
                self.state.generating = false;
                self.toast.dismiss_spinner();
                match result {
                    Ok(text) => {
                        if let Err(e) = self.state.draft.set_text(AdField::AdText, &text) {
                            self.toast.error(e.to_string());
                        } else {
                            self.toast.success("ad text generated");
                        }
                    }
                    Err(e) => self.toast.error(format!("generation failed: {}", e)),
                }
            }
            AppMessage::AdCreated(result) => {
                self.state.publishing = false;
                self.toast.dismiss_spinner();
                match result {
                    Ok(resp) => {
                        let msg = resp.message.unwrap_or_else(|| resp.status.clone());
                        info!("[api] ad created: {} {}", resp.status, msg);
                        self.toast.success(format!("ad {}: {}", resp.status, msg));
                        self.state.last_publish = Some(resp.status);
                    }
                    Err(e) => self.toast.error(format!("publish failed: {}", e)),
                }
            }
        }
        true
    }

    // ── Input routing ─────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }
        let normal = self.state.input_mode == InputMode::Normal;

        if self.help_overlay.visible {
            let actions = self.help_overlay.handle_key(key, &self.state);
            return if actions.is_empty() { vec![Action::ToggleHelp] } else { actions };
        }
        if self.value_picker.is_visible() {
            return self.value_picker.handle_key(key, &self.state);
        }

        if normal {
            match key.code {
                KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char('?') => return vec![Action::ToggleHelp],
                KeyCode::Char('R') => return vec![Action::Reload],
                _ => {}
            }
        }
        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::FilterBar) => self.filter_bar.handle_key(key, s),
            Some(ComponentId::ChannelTable) => self.channel_table.handle_key(key, s),
            Some(ComponentId::SelectionPane) => self.selection_pane.handle_key(key, s),
            Some(ComponentId::AdPane) => self.ad_pane.handle_key(key, s),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.help_overlay.visible || self.value_picker.is_visible() {
            return vec![];
        }
        if !matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        ) {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0 && r.height > 0 && col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let s = &self.state;
        let (id, mut actions) = if hit(areas.filter_bar, event.column, event.row) {
            (ComponentId::FilterBar, self.filter_bar.handle_mouse(event, areas.filter_bar, s))
        } else if hit(areas.channel_table, event.column, event.row) {
            (ComponentId::ChannelTable, self.channel_table.handle_mouse(event, areas.channel_table, s))
        } else if hit(areas.selection, event.column, event.row) {
            (ComponentId::SelectionPane, self.selection_pane.handle_mouse(event, areas.selection, s))
        } else if hit(areas.ad, event.column, event.row) {
            (ComponentId::AdPane, self.ad_pane.handle_mouse(event, areas.ad, s))
        } else {
            return vec![];
        };
        if matches!(event.kind, MouseEventKind::Down(_)) && !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.filter_bar.on_action(&action, s));
            out.extend(self.channel_table.on_action(&action, s));
            out.extend(self.selection_pane.on_action(&action, s));
            out.extend(self.ad_pane.on_action(&action, s));
            out.extend(self.value_picker.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // One level deep.
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::Scroll(_) | Action::CursorMove(_) | Action::Noop => {}
            _ => debug!("apply_action: {:?}", action),
        }
        let session = &mut self.state.session;
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => {}

            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),

            Action::OpenInput => self.state.input_mode = InputMode::Input,
            Action::CloseInput => self.state.input_mode = InputMode::Normal,

            Action::CursorMove(delta) => session.move_cursor(delta),
            Action::CursorTo(pos) => session.cursor_to(pos),
            Action::CursorLast => {
                let last = session.view().len().saturating_sub(1);
                session.cursor_to(last);
            }
            Action::Page(down) => session.page(down),
            Action::Scroll(delta) => session.scroll_by(delta),

            Action::Search(query) => {
                session.set_query(&query);
            }
            Action::SortBy(field) => session.click_sort(field),
            Action::ClearSort => session.clear_sort(),

            Action::ToggleFilter(field, value) => {
                let ticket = session.toggle_filter(field, &value);
                self.start_fetch(ticket);
            }
            Action::Reload => {
                let ticket = session.fetch_catalog();
                self.start_fetch(ticket);
            }
            Action::FetchSimilar => match session.fetch_similar() {
                Ok(ticket) => self.start_fetch(ticket),
                Err(e) => self.toast.warning(e.to_string()),
            },
            Action::Refresh(id) => {
                if session.begin_refresh(id) {
                    self.spawn_refresh(id);
                } else {
                    self.toast.info("refresh already in flight");
                }
            }

            Action::OpenPicker(_, _) => {}
            Action::ClosePicker => self.focus.set(ComponentId::ChannelTable),
            Action::EditField(id, field, value) => {
                self.toast.info(format!("saving {}…", field));
                self.spawn_edit(FieldEdit::new(id, field, value));
            }

            Action::SelectCursor => match session.select_cursor() {
                Some(true) => {
                    let name = session.cursor_record().map(|r| r.username.clone()).unwrap_or_default();
                    self.toast.success(format!("added @{}", name));
                }
                Some(false) => self.toast.info("already selected"),
                None => {}
            },
            Action::SelectAllVisible => {
                let n = session.select_all_visible();
                self.toast.success(format!("selection set to {} channels", n));
            }
            Action::Deselect(username) => {
                session.deselect(&username);
            }
            Action::ClearSelection => {
                session.clear_selection();
                self.toast.info("selection cleared");
            }
            Action::SetSelectionText(text) => session.set_selection_text(&text),

            Action::SetAdField(field, input) => {
                if let Err(e) = self.state.draft.set_text(field, &input) {
                    self.toast.warning(e.to_string());
                }
            }
            Action::CycleAdField(field) => self.state.draft.cycle(field),
            Action::GenerateAd => self.generate_ad(),
            Action::PublishAd => self.publish_ad(),

            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let first = text.lines().next().unwrap_or_default();
                        self.toast.success(format!("copied: {}", crate::markup::truncate(first, 40)));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Noop => {}
        }
    }

    fn start_fetch(&mut self, ticket: FetchTicket) {
        self.toast.spinner(format!("loading {}…", ticket.request.label()));
        self.spawn_fetch(ticket);
    }

    fn generate_ad(&mut self) {
        if self.state.generating {
            self.toast.info("generation already running");
            return;
        }
        let request = match ads::generate_request(self.state.session.selection(), &self.state.draft) {
            Ok(r) => r,
            Err(e) => return self.toast.warning(e.to_string()),
        };
        self.state.generating = true;
        self.toast.spinner("generating ad text…");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.generate_ad(&request).await;
            let _ = tx.send(AppMessage::AdGenerated(result)).await;
        });
    }

    fn publish_ad(&mut self) {
        if self.state.publishing {
            self.toast.info("publish already running");
            return;
        }
        let request = match ads::create_request(self.state.session.selection(), &self.state.draft) {
            Ok(r) => r,
            Err(e) => return self.toast.warning(e.to_string()),
        };
        info!(
            "[api] publishing ad to {} channels ({})",
            request.channels.len(),
            request.method.label()
        );
        self.state.publishing = true;
        self.toast.spinner("publishing ad…");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.create_ad(&request).await;
            let _ = tx.send(AppMessage::AdCreated(result)).await;
        });
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(outer[2]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body[1]);

        self.pane_areas = PaneAreas {
            filter_bar: outer[1],
            channel_table: body[0],
            selection: right[0],
            ad: right[1],
        };

        // The viewport follows the table body so windowing matches the screen.
        let table = channel_table::table_layout(body[0], self.channel_table.search_visible(&self.state));
        self.state.session.set_viewport(Viewport::new(
            self.config.view.row_height,
            u32::from(table.body.height),
            self.config.view.overscan,
        ));

        self.draw_header(frame, outer[0]);

        let focused = self.focus.current();
        let s = &self.state;
        self.filter_bar
            .draw(frame, outer[1], focused == Some(ComponentId::FilterBar), s);
        self.channel_table
            .draw(frame, body[0], focused == Some(ComponentId::ChannelTable), s);
        self.selection_pane
            .draw(frame, right[0], focused == Some(ComponentId::SelectionPane), s);
        self.ad_pane.draw(frame, right[1], focused == Some(ComponentId::AdPane), s);

        let hints_for = if self.value_picker.is_visible() {
            Some(ComponentId::ValuePicker)
        } else {
            focused
        };
        status_bar::draw_keys_bar(frame, outer[3], s.input_mode, hints_for);

        self.value_picker.draw(frame, area, true, s);
        self.help_overlay.draw(frame, area, false, s);
        self.toast.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame, area: Rect) {
        let session = &self.state.session;
        let (status, color) = match session.fetch_state() {
            FetchState::Idle => ("idle".to_string(), C_PRIMARY),
            FetchState::Loading => ("loading".to_string(), C_PENDING),
            FetchState::Ready => (format!("{} channels", session.records().len()), C_OK),
            FetchState::Failed(_) => ("fetch failed".to_string(), C_ERROR),
        };
        let sort = session.sort();
        let sort_text = match sort.key {
            Some(key) => format!("{} {}", key.label(), sort.dir.arrow()),
            None => "server order".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(" tgads ", Style::default().fg(C_PRIMARY)),
            Span::styled(format!("· {} ", self.state.api_base), style_muted()),
            Span::styled("· ", style_muted()),
            Span::styled(status, Style::default().fg(color)),
            Span::styled(format!(" · sort: {} ", sort_text), style_secondary()),
            Span::styled(format!("· selected: {}", session.selection().len()), style_secondary()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}
