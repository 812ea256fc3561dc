//! One curation session: the fetched collection, the query and sort that
//! shape it, the table cursor and scroll position, and the selection.
//!
//! Everything here is synchronous. Network work happens outside with the
//! tickets and edits this type hands out, and results come back through
//! the `complete_*` methods.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::fetcher::{
    FetchOutcome, FetchRequest, FetchState, FetchTicket, Fetcher, RefreshOutcome, TaxonomyFilter,
};
use crate::catalog::mutation::{EditOutcome, FieldEdit};
use crate::catalog::pipeline::{derive, DisplayView, SortField, SortSpec};
use crate::catalog::selection::SelectionSet;
use crate::catalog::window::{RowWindow, ScrollState, Viewport};
use crate::channel::{ChannelId, ChannelRecord, MetaField};
use crate::config::FailurePolicy;
use crate::error::EngineResult;
use crate::store::StateStore;

pub const SORT_KEY: &str = "sort";

pub struct CurationSession {
    fetcher: Fetcher,
    selection: SelectionSet,
    filter: TaxonomyFilter,
    query: String,
    sort: SortSpec,
    view: DisplayView,
    viewport: Viewport,
    scroll: ScrollState,
    cursor: usize,
    store: Arc<dyn StateStore>,
}

impl CurationSession {
    /// Start a session, restoring the selection and last sort from `store`.
    pub fn new(store: Arc<dyn StateStore>, policy: FailurePolicy) -> Self {
        let sort = store.load(SORT_KEY, SortSpec::default());
        Self {
            fetcher: Fetcher::new(policy),
            selection: SelectionSet::restore(Arc::clone(&store)),
            filter: TaxonomyFilter::default(),
            query: String::new(),
            sort,
            view: DisplayView::default(),
            viewport: Viewport::default(),
            scroll: ScrollState::default(),
            cursor: 0,
            store,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn fetch_state(&self) -> &FetchState {
        self.fetcher.state()
    }

    pub fn records(&self) -> &[ChannelRecord] {
        self.fetcher.records()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn filter(&self) -> &TaxonomyFilter {
        &self.filter
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn view(&self) -> &DisplayView {
        &self.view
    }

    pub fn view_records(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.view.records(self.fetcher.records())
    }

    pub fn record_at(&self, pos: usize) -> Option<&ChannelRecord> {
        self.view
            .base_index(pos)
            .and_then(|i| self.fetcher.records().get(i))
    }

    // ── Query and sort ────────────────────────────────────────────────────

    /// Returns false when the query did not change.
    pub fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.rederive();
        true
    }

    pub fn click_sort(&mut self, field: SortField) {
        self.sort.click(field);
        self.sort_changed();
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.sort_changed();
    }

    fn sort_changed(&mut self) {
        if let Err(e) = self.store.save(SORT_KEY, &self.sort) {
            warn!("[store] failed to save sort: {:#}", e);
        }
        self.rederive();
    }

    // ── Fetching ──────────────────────────────────────────────────────────

    /// Toggle one taxonomy value and refetch with the resulting filter.
    pub fn toggle_filter(&mut self, field: MetaField, value: &str) -> FetchTicket {
        self.filter.toggle(field, value);
        self.fetch_catalog()
    }

    pub fn fetch_catalog(&mut self) -> FetchTicket {
        let request = FetchRequest::Catalog(self.filter.clone());
        self.begin(request)
    }

    /// Similarity fetch seeded by the selection; nothing is issued when it is empty.
    pub fn fetch_similar(&mut self) -> EngineResult<FetchTicket> {
        let request = FetchRequest::similar(&self.selection)?;
        Ok(self.begin(request))
    }

    fn begin(&mut self, request: FetchRequest) -> FetchTicket {
        let ticket = self.fetcher.begin(request);
        self.cursor = 0;
        self.scroll.reset();
        self.rederive();
        ticket
    }

    pub fn complete_fetch(
        &mut self,
        seq: u64,
        result: EngineResult<Vec<ChannelRecord>>,
    ) -> FetchOutcome {
        let outcome = self.fetcher.complete(seq, result);
        if outcome != FetchOutcome::Stale {
            self.rederive();
        }
        outcome
    }

    pub fn begin_refresh(&mut self, id: ChannelId) -> bool {
        self.fetcher.begin_refresh(id)
    }

    /// Single-row patch. Display order is left as it is until the next
    /// query, sort or fetch.
    pub fn complete_refresh(
        &mut self,
        id: ChannelId,
        result: EngineResult<ChannelRecord>,
    ) -> RefreshOutcome {
        self.fetcher.complete_refresh(id, result)
    }

    pub fn complete_edit(
        &mut self,
        edit: &FieldEdit,
        result: EngineResult<()>,
    ) -> EngineResult<EditOutcome> {
        edit.apply(&mut self.fetcher, result)
    }

    // ── Selection ─────────────────────────────────────────────────────────

    pub fn select(&mut self, username: &str) -> bool {
        self.selection.add(username)
    }

    /// Add the channel under the cursor. None when the view is empty.
    pub fn select_cursor(&mut self) -> Option<bool> {
        let username = self.cursor_record()?.username.clone();
        Some(self.selection.add(&username))
    }

    /// Replace the selection with every channel in the current view.
    pub fn select_all_visible(&mut self) -> usize {
        let records = self.fetcher.records();
        self.selection.add_all(self.view.records(records));
        self.selection.len()
    }

    pub fn deselect(&mut self, username: &str) -> bool {
        self.selection.remove(username)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_selection_text(&mut self, input: &str) {
        self.selection.replace_from_text(input);
    }

    // ── Cursor, viewport and scrolling ────────────────────────────────────

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll.offset()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_record(&self) -> Option<&ChannelRecord> {
        self.record_at(self.cursor)
    }

    /// Rows to build for the current scroll position.
    pub fn window(&self) -> RowWindow {
        self.viewport.window(self.scroll.offset(), self.view.len())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.scroll.clamp(&self.viewport, self.view.len());
        self.scroll
            .ensure_visible(self.cursor, &self.viewport, self.view.len());
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.view.len();
        if len == 0 {
            return;
        }
        let target = self.cursor.saturating_add_signed(delta).min(len - 1);
        self.cursor_to(target);
    }

    pub fn cursor_to(&mut self, pos: usize) {
        let len = self.view.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = pos.min(len - 1);
        self.scroll.ensure_visible(self.cursor, &self.viewport, len);
    }

    pub fn page(&mut self, down: bool) {
        let step = self.viewport.visible_rows().max(1) as isize;
        self.move_cursor(if down { step } else { -step });
    }

    /// Scroll without moving the cursor unless it would leave the screen.
    pub fn scroll_by(&mut self, delta: i64) {
        self.scroll.scroll_by(delta, &self.viewport, self.view.len());
        self.keep_cursor_on_screen();
    }

    fn rederive(&mut self) {
        self.view = derive(self.fetcher.records(), &self.query, self.sort);
        let len = self.view.len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.scroll.clamp(&self.viewport, len);
        self.keep_cursor_on_screen();
        debug!(
            "[fetch] view {} of {} (query {:?}, sort {:?})",
            len,
            self.fetcher.records().len(),
            self.query,
            self.sort.key
        );
    }

    fn keep_cursor_on_screen(&mut self) {
        let visible = self
            .viewport
            .visible_range(self.scroll.offset(), self.view.len());
        if visible.is_empty() {
            return;
        }
        if self.cursor < visible.start {
            self.cursor = visible.start;
        } else if self.cursor >= visible.end {
            self.cursor = visible.end - 1;
        }
    }
}
