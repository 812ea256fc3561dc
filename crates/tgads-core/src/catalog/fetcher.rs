//! Catalog fetch state machine.
//!
//! The fetcher owns the base collection. It never awaits anything itself:
//! callers take a [`FetchTicket`] from `begin`, run the request wherever
//! they like, and hand the result back to `complete` with the ticket's
//! sequence number. Only the newest ticket can land.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::api::CatalogApi;
use crate::catalog::selection::SelectionSet;
use crate::channel::{ChannelId, ChannelRecord, MetaField};
use crate::config::FailurePolicy;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Category and geo filter for a catalog fetch. Both axes are optional and
/// combine conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyFilter {
    pub category: Option<String>,
    pub geo: Option<String>,
}

impl TaxonomyFilter {
    /// Clicking the active value clears the axis; any other value replaces it.
    pub fn toggle(&mut self, field: MetaField, value: &str) {
        let slot = match field {
            MetaField::Category => &mut self.category,
            MetaField::Geo => &mut self.geo,
        };
        if slot.as_deref() == Some(value) {
            *slot = None;
        } else {
            *slot = Some(value.to_string());
        }
    }

    pub fn get(&self, field: MetaField) -> Option<&str> {
        match field {
            MetaField::Category => self.category.as_deref(),
            MetaField::Geo => self.geo.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.geo.is_none()
    }

    /// Query string pairs; unset axes are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(c) = &self.category {
            pairs.push(("category", c.as_str()));
        }
        if let Some(g) = &self.geo {
            pairs.push(("geo", g.as_str()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Catalog(TaxonomyFilter),
    Similar(Vec<String>),
}

impl FetchRequest {
    /// Similarity request seeded by the selection. Rejected locally when empty.
    pub fn similar(selection: &SelectionSet) -> EngineResult<Self> {
        if selection.is_empty() {
            return Err(EngineError::validation(
                "select at least one channel to search for similar ones",
            ));
        }
        Ok(FetchRequest::Similar(selection.as_slice().to_vec()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchRequest::Catalog(_) => "catalog",
            FetchRequest::Similar(_) => "similar",
        }
    }

    pub async fn execute<A: CatalogApi>(&self, api: &A) -> EngineResult<Vec<ChannelRecord>> {
        match self {
            FetchRequest::Catalog(filter) => api.fetch_catalog(filter).await,
            FetchRequest::Similar(names) => api.fetch_similar(names).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub request: FetchRequest,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    Failed(String),
    /// A newer request was issued after this one; the result was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Patched,
    /// The record left the collection while the refresh was in flight.
    Missing,
    Failed(EngineError),
}

pub struct Fetcher {
    state: FetchState,
    base: Vec<ChannelRecord>,
    latest_seq: u64,
    policy: FailurePolicy,
    refreshing: HashSet<ChannelId>,
    loaded_at: Option<DateTime<Local>>,
}

impl Fetcher {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            state: FetchState::Idle,
            base: Vec::new(),
            latest_seq: 0,
            policy,
            refreshing: HashSet::new(),
            loaded_at: None,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.base
    }

    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn index_of(&self, id: ChannelId) -> Option<usize> {
        self.base.iter().position(|r| r.id == id)
    }

    pub fn get(&self, id: ChannelId) -> Option<&ChannelRecord> {
        self.base.iter().find(|r| r.id == id)
    }

    /// Issue a new bulk request. Supersedes any request still in flight.
    pub fn begin(&mut self, request: FetchRequest) -> FetchTicket {
        self.latest_seq += 1;
        self.state = FetchState::Loading;
        if self.policy == FailurePolicy::Discard {
            self.base.clear();
        }
        info!("[fetch] #{} {} issued", self.latest_seq, request.label());
        FetchTicket {
            seq: self.latest_seq,
            request,
        }
    }

    pub fn complete(
        &mut self,
        seq: u64,
        result: EngineResult<Vec<ChannelRecord>>,
    ) -> FetchOutcome {
        if seq != self.latest_seq {
            debug!("[fetch] #{} discarded, #{} is current", seq, self.latest_seq);
            return FetchOutcome::Stale;
        }
        match result {
            Ok(records) => {
                let count = records.len();
                self.base = records;
                self.state = FetchState::Ready;
                self.loaded_at = Some(Local::now());
                let base = &self.base;
                self.refreshing.retain(|id| base.iter().any(|r| r.id == *id));
                info!("[fetch] #{} applied, {} channels", seq, count);
                FetchOutcome::Applied { count }
            }
            Err(e) => {
                let msg = e.message().to_string();
                if self.policy == FailurePolicy::Discard {
                    self.base.clear();
                }
                warn!("[fetch] #{} failed: {}", seq, msg);
                self.state = FetchState::Failed(msg.clone());
                FetchOutcome::Failed(msg)
            }
        }
    }

    /// Mark one row as refreshing. False if the id is unknown or already in flight.
    pub fn begin_refresh(&mut self, id: ChannelId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.refreshing.insert(id)
    }

    pub fn is_refreshing(&self, id: ChannelId) -> bool {
        self.refreshing.contains(&id)
    }

    /// Land a single-record refresh. Independent of the bulk sequence.
    pub fn complete_refresh(
        &mut self,
        id: ChannelId,
        result: EngineResult<ChannelRecord>,
    ) -> RefreshOutcome {
        self.refreshing.remove(&id);
        let fresh = match result {
            Ok(fresh) if fresh.id == id => fresh,
            Ok(other) => {
                let err = EngineError::transport(format!(
                    "refresh of channel {} returned channel {}",
                    id, other.id
                ));
                warn!("[fetch] {}", err);
                return RefreshOutcome::Failed(err);
            }
            Err(e) => {
                warn!("[fetch] refresh of {} failed: {}", id, e);
                return RefreshOutcome::Failed(e);
            }
        };
        match self.base.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                debug!("[fetch] refreshed {} ({} subscribers)", fresh.username, fresh.subscribers);
                *slot = fresh;
                RefreshOutcome::Patched
            }
            None => {
                debug!("[fetch] refresh of {} landed after it left the collection", id);
                RefreshOutcome::Missing
            }
        }
    }

    /// Single-field write-through patch. False if the id is not in the collection.
    pub fn patch_field(&mut self, id: ChannelId, field: MetaField, value: &str) -> bool {
        match self.base.iter_mut().find(|r| r.id == id) {
            Some(rec) => {
                rec.set_field(field, value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: ChannelId, username: &str) -> ChannelRecord {
        ChannelRecord::new(id, username)
    }

    fn catalog() -> FetchRequest {
        FetchRequest::Catalog(TaxonomyFilter::default())
    }

    #[test]
    fn happy_path() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        assert_eq!(f.state(), &FetchState::Idle);
        let t = f.begin(catalog());
        assert!(f.state().is_loading());
        let out = f.complete(t.seq(), Ok(vec![rec(1, "a"), rec(2, "b")]));
        assert_eq!(out, FetchOutcome::Applied { count: 2 });
        assert_eq!(f.state(), &FetchState::Ready);
        assert_eq!(f.records().len(), 2);
        assert!(f.loaded_at().is_some());
    }

    #[test]
    fn loading_clears_previous_data_and_error() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(catalog());
        f.complete(t.seq(), Err(EngineError::transport("boom")));
        assert_eq!(f.state().error(), Some("boom"));

        let t = f.begin(catalog());
        assert_eq!(f.state(), &FetchState::Loading);
        f.complete(t.seq(), Ok(vec![rec(1, "a")]));

        f.begin(catalog());
        assert!(f.records().is_empty());
        assert_eq!(f.state().error(), None);
    }

    #[test]
    fn older_response_is_discarded() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let first = f.begin(catalog());
        let second = f.begin(catalog());

        assert_eq!(f.complete(first.seq(), Ok(vec![rec(1, "old")])), FetchOutcome::Stale);
        assert!(f.records().is_empty());
        assert!(f.state().is_loading());

        f.complete(second.seq(), Ok(vec![rec(2, "new")]));
        assert_eq!(f.complete(first.seq(), Err(EngineError::transport("late"))), FetchOutcome::Stale);
        assert_eq!(f.records()[0].username, "new");
        assert_eq!(f.state(), &FetchState::Ready);
    }

    #[test]
    fn failure_discards_by_default() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(catalog());
        f.complete(t.seq(), Ok(vec![rec(1, "a")]));
        let t = f.begin(catalog());
        let out = f.complete(t.seq(), Err(EngineError::transport("503")));
        assert_eq!(out, FetchOutcome::Failed("503".into()));
        assert!(f.records().is_empty());
    }

    #[test]
    fn keep_stale_policy_retains_last_good_collection() {
        let mut f = Fetcher::new(FailurePolicy::KeepStale);
        let t = f.begin(catalog());
        f.complete(t.seq(), Ok(vec![rec(1, "a")]));
        let t = f.begin(catalog());
        assert_eq!(f.records().len(), 1);
        f.complete(t.seq(), Err(EngineError::transport("503")));
        assert_eq!(f.records().len(), 1);
        assert_eq!(f.state().error(), Some("503"));
    }

    #[test]
    fn refresh_patches_one_row_and_leaves_state_alone() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(catalog());
        f.complete(t.seq(), Ok(vec![rec(1, "a"), rec(2, "b")]));

        assert!(f.begin_refresh(2));
        assert!(!f.begin_refresh(2));
        assert!(!f.begin_refresh(99));
        assert!(f.is_refreshing(2));
        assert!(!f.is_refreshing(1));

        let mut fresh = rec(2, "b");
        fresh.subscribers = 900;
        assert_eq!(f.complete_refresh(2, Ok(fresh)), RefreshOutcome::Patched);
        assert!(!f.is_refreshing(2));
        assert_eq!(f.get(2).map(|r| r.subscribers), Some(900));
        assert_eq!(f.get(1), Some(&rec(1, "a")));
        assert_eq!(f.state(), &FetchState::Ready);
    }

    #[test]
    fn refresh_is_independent_of_bulk_sequence() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(catalog());
        f.complete(t.seq(), Ok(vec![rec(1, "a")]));
        assert!(f.begin_refresh(1));

        let bulk = f.begin(catalog());
        f.complete(bulk.seq(), Ok(vec![rec(5, "e")]));
        assert!(!f.is_refreshing(1));
        assert_eq!(f.complete_refresh(1, Ok(rec(1, "a"))), RefreshOutcome::Missing);
        assert_eq!(f.records(), &[rec(5, "e")]);
    }

    #[test]
    fn refresh_failure_and_mismatched_id_change_nothing() {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(catalog());
        f.complete(t.seq(), Ok(vec![rec(1, "a")]));
        f.begin_refresh(1);
        let out = f.complete_refresh(1, Err(EngineError::transport("timeout")));
        assert!(matches!(out, RefreshOutcome::Failed(_)));
        let out = f.complete_refresh(1, Ok(rec(2, "imposter")));
        assert!(matches!(out, RefreshOutcome::Failed(EngineError::Transport(_))));
        assert_eq!(f.records(), &[rec(1, "a")]);
    }

    #[test]
    fn taxonomy_toggle_rules() {
        let mut filter = TaxonomyFilter::default();
        filter.toggle(MetaField::Category, "news");
        filter.toggle(MetaField::Geo, "us");
        assert_eq!(filter.query_pairs(), vec![("category", "news"), ("geo", "us")]);

        filter.toggle(MetaField::Category, "tech");
        assert_eq!(filter.get(MetaField::Category), Some("tech"));

        filter.toggle(MetaField::Category, "tech");
        assert_eq!(filter.query_pairs(), vec![("geo", "us")]);
        filter.toggle(MetaField::Geo, "us");
        assert!(filter.is_empty());
    }
}
