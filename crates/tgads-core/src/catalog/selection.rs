use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::channel::{channel_link, ChannelRecord};
use crate::store::StateStore;

pub const SELECTION_KEY: &str = "channels";

/// Ordered, duplicate-free list of chosen usernames.
///
/// Mirrored to the store after every mutation that changes it; the
/// in-memory list stays authoritative if a write fails.
pub struct SelectionSet {
    items: Vec<String>,
    seen: HashSet<String>,
    store: Arc<dyn StateStore>,
}

// Older state files hold the selection as one comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSelection {
    List(Vec<String>),
    Text(String),
}

impl SelectionSet {
    pub fn empty(store: Arc<dyn StateStore>) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            store,
        }
    }

    /// Restore from the store, deduplicating whatever was saved.
    pub fn restore(store: Arc<dyn StateStore>) -> Self {
        let stored = store.load::<Option<StoredSelection>>(SELECTION_KEY, None);
        let mut set = Self::empty(store);
        match stored {
            Some(StoredSelection::List(list)) => set.adopt(list),
            Some(StoredSelection::Text(text)) => set.adopt(split_usernames(&text)),
            None => {}
        }
        debug!("[selection] restored {} channels", set.len());
        set
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.seen.contains(username)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Append unless already present. Returns whether the set changed.
    pub fn add(&mut self, username: &str) -> bool {
        if username.is_empty() || self.seen.contains(username) {
            return false;
        }
        self.seen.insert(username.to_string());
        self.items.push(username.to_string());
        self.persist();
        true
    }

    pub fn remove(&mut self, username: &str) -> bool {
        if !self.seen.remove(username) {
            return false;
        }
        self.items.retain(|u| u != username);
        self.persist();
        true
    }

    /// Replace the contents with `usernames`, keeping first-seen order.
    pub fn replace_all<I, S>(&mut self, usernames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adopt(usernames);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.persist();
    }

    /// Replace the contents with the usernames of `records`, in order.
    pub fn add_all<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a ChannelRecord>,
    {
        self.replace_all(records.into_iter().map(|r| r.username.as_str()));
    }

    /// Comma-separated editing form: split, trim, drop empties, replace.
    pub fn replace_from_text(&mut self, input: &str) {
        self.replace_all(split_usernames(input));
    }

    pub fn to_text(&self) -> String {
        self.items.join(",")
    }

    pub fn links(&self) -> Vec<String> {
        self.items.iter().map(|u| channel_link(u)).collect()
    }

    fn adopt<I, S>(&mut self, usernames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.clear();
        self.seen.clear();
        for name in usernames {
            let name = name.into();
            if name.is_empty() || self.seen.contains(&name) {
                continue;
            }
            self.seen.insert(name.clone());
            self.items.push(name);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(SELECTION_KEY, &self.items) {
            warn!("[selection] failed to persist {} channels: {:#}", self.items.len(), e);
        }
    }
}

fn split_usernames(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
