//! Search and sort over a fetched collection.
//!
//! [`derive`] never touches the base collection. It returns positions into
//! it, so a view is cheap to rebuild on every keystroke and rows are read
//! straight from the base when drawn.

use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::channel::ChannelRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Title,
    Username,
    Category,
    Geo,
    Subscribers,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Title,
        SortField::Username,
        SortField::Category,
        SortField::Geo,
        SortField::Subscribers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Username => "username",
            SortField::Category => "category",
            SortField::Geo => "geo",
            SortField::Subscribers => "subscribers",
        }
    }

    fn text<'a>(self, rec: &'a ChannelRecord) -> &'a str {
        match self {
            SortField::Title => rec.title.as_str(),
            SortField::Username => &rec.username,
            SortField::Category => &rec.category,
            SortField::Geo => &rec.geo,
            SortField::Subscribers => "",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn flip(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDir::Asc => "▲",
            SortDir::Desc => "▼",
        }
    }
}

/// Active sort column. `key: None` keeps fetch order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub key: Option<SortField>,
    #[serde(default)]
    pub dir: SortDir,
}

impl SortSpec {
    pub fn by(key: SortField, dir: SortDir) -> Self {
        Self { key: Some(key), dir }
    }

    /// Column header click: same column flips, another column starts ascending.
    pub fn click(&mut self, field: SortField) {
        if self.key == Some(field) {
            self.dir = self.dir.flip();
        } else {
            self.key = Some(field);
            self.dir = SortDir::Asc;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Display order as positions into the base collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayView {
    rows: Vec<usize>,
}

impl DisplayView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Base index shown at display position `pos`.
    pub fn base_index(&self, pos: usize) -> Option<usize> {
        self.rows.get(pos).copied()
    }

    pub fn records<'a>(
        &'a self,
        base: &'a [ChannelRecord],
    ) -> impl Iterator<Item = &'a ChannelRecord> + 'a {
        self.rows.iter().filter_map(move |&i| base.get(i))
    }
}

/// Case-insensitive substring match on title, username or description.
/// `needle` must already be trimmed and lower-cased.
pub fn matches(rec: &ChannelRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    rec.title.as_str().to_lowercase().contains(needle)
        || rec.username.to_lowercase().contains(needle)
        || rec.description.to_lowercase().contains(needle)
}

pub fn derive(base: &[ChannelRecord], query: &str, sort: SortSpec) -> DisplayView {
    let needle = query.trim().to_lowercase();
    let mut rows: Vec<usize> = (0..base.len())
        .filter(|&i| matches(&base[i], &needle))
        .collect();

    if let Some(key) = sort.key {
        let order = TextOrder::new();
        let by_key = |a: &usize, b: &usize| -> Ordering { order.records(key, &base[*a], &base[*b]) };
        match sort.dir {
            SortDir::Asc => rows.sort_by(by_key),
            SortDir::Desc => rows.sort_by(|a, b| by_key(a, b).reverse()),
        }
    }

    DisplayView { rows }
}

/// Field comparators. Text uses root-locale collation at tertiary strength:
/// accented letters sort beside their base letter, and lowercase precedes
/// uppercase when nothing else differs.
pub struct TextOrder {
    collator: Option<Collator>,
}

impl TextOrder {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("[pipeline] collator unavailable, sorting by code point: {}", e);
                None
            }
        };
        Self { collator }
    }

    pub fn text(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(c) => c.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| b.cmp(a))
    }

    /// Typed comparator for one field, ascending.
    pub fn records(&self, key: SortField, a: &ChannelRecord, b: &ChannelRecord) -> Ordering {
        match key {
            SortField::Subscribers => a.subscribers.cmp(&b.subscribers),
            _ => self.text(key.text(a), key.text(b)),
        }
    }
}

impl Default for TextOrder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, username: &str, title: &str, subs: u64, category: &str) -> ChannelRecord {
        let mut r = ChannelRecord::new(id, username);
        r.title = title.into();
        r.subscribers = subs;
        r.category = category.into();
        r
    }

    fn ids(view: &DisplayView, base: &[ChannelRecord]) -> Vec<i64> {
        view.records(base).map(|r| r.id).collect()
    }

    fn sample() -> Vec<ChannelRecord> {
        vec![
            rec(1, "alpha", "Crypto Daily", 500, "crypto"),
            rec(2, "bravo", "Rust News", 10, "tech"),
            rec(3, "charlie", "daily memes", 500, "fun"),
            rec(4, "delta", "Tech Today", 70, "tech"),
        ]
    }

    #[test]
    fn empty_query_keeps_everything_in_fetch_order() {
        let base = sample();
        let view = derive(&base, "   ", SortSpec::default());
        assert_eq!(ids(&view, &base), vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_is_case_insensitive_over_three_fields() {
        let mut base = sample();
        base[3].description = "All about DAILY builds".into();
        let view = derive(&base, " Daily ", SortSpec::default());
        assert_eq!(ids(&view, &base), vec![1, 3, 4]);

        let view = derive(&base, "BRAV", SortSpec::default());
        assert_eq!(ids(&view, &base), vec![2]);
    }

    #[test]
    fn no_match_and_empty_base_give_empty_views() {
        let base = sample();
        assert!(derive(&base, "zzz", SortSpec::default()).is_empty());
        assert!(derive(&[], "", SortSpec::by(SortField::Title, SortDir::Asc)).is_empty());
    }

    #[test]
    fn subscribers_desc_then_toggle() {
        let base = vec![rec(1, "a", "A", 500, ""), rec(2, "b", "B", 10, "")];
        let mut sort = SortSpec::default();
        sort.click(SortField::Subscribers);
        sort.click(SortField::Subscribers);
        assert_eq!(sort.dir, SortDir::Desc);
        assert_eq!(ids(&derive(&base, "", sort), &base), vec![1, 2]);

        sort.click(SortField::Subscribers);
        assert_eq!(ids(&derive(&base, "", sort), &base), vec![2, 1]);
    }

    #[test]
    fn clicking_another_column_resets_to_ascending() {
        let mut sort = SortSpec::by(SortField::Title, SortDir::Desc);
        sort.click(SortField::Geo);
        assert_eq!(sort, SortSpec::by(SortField::Geo, SortDir::Asc));
    }

    #[test]
    fn ties_keep_base_order_in_both_directions() {
        let base = sample();
        let asc = derive(&base, "", SortSpec::by(SortField::Subscribers, SortDir::Asc));
        let desc = derive(&base, "", SortSpec::by(SortField::Subscribers, SortDir::Desc));
        assert_eq!(ids(&asc, &base), vec![2, 4, 1, 3]);
        assert_eq!(ids(&desc, &base), vec![1, 3, 4, 2]);

        let asc = derive(&base, "", SortSpec::by(SortField::Category, SortDir::Asc));
        let desc = derive(&base, "", SortSpec::by(SortField::Category, SortDir::Desc));
        assert_eq!(ids(&asc, &base), vec![1, 3, 2, 4]);
        assert_eq!(ids(&desc, &base), vec![2, 4, 3, 1]);
    }

    #[test]
    fn text_sort_ignores_case_and_treats_empty_as_smallest() {
        let base = vec![
            rec(1, "b", "beta", 0, ""),
            rec(2, "a", "Alpha", 0, ""),
            rec(3, "c", "", 0, ""),
            rec(4, "d", "alpha", 0, ""),
        ];
        let view = derive(&base, "", SortSpec::by(SortField::Title, SortDir::Asc));
        assert_eq!(ids(&view, &base), vec![3, 4, 2, 1]);
    }

    #[test]
    fn text_sort_follows_collation_for_accents_and_cyrillic() {
        let titles = ["Zebra", "Éclair", "apple", "ёлка", "жук"];
        let base: Vec<ChannelRecord> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| rec(i as i64, &format!("u{i}"), t, 0, ""))
            .collect();
        let sorted = |dir| -> Vec<String> {
            derive(&base, "", SortSpec::by(SortField::Title, dir))
                .records(&base)
                .map(|r| r.title.as_str().to_string())
                .collect()
        };
        assert_eq!(sorted(SortDir::Asc), vec!["apple", "Éclair", "Zebra", "ёлка", "жук"]);
        assert_eq!(sorted(SortDir::Desc), vec!["жук", "ёлка", "Zebra", "Éclair", "apple"]);
    }

    #[test]
    fn sorting_a_narrow_search_only_orders_the_matches() {
        let base = vec![
            rec(1, "news_b", "Новости Б", 0, ""),
            rec(2, "other", "Погода", 0, ""),
            rec(3, "news_a", "новости а", 0, ""),
        ];
        let view = derive(&base, "НОВОСТИ", SortSpec::by(SortField::Title, SortDir::Asc));
        assert_eq!(ids(&view, &base), vec![3, 1]);
    }

    #[test]
    fn derive_does_not_touch_base() {
        let base = sample();
        let before = base.clone();
        let _ = derive(&base, "tech", SortSpec::by(SortField::Username, SortDir::Desc));
        assert_eq!(base, before);
    }

    #[test]
    fn sort_spec_serde_shape() {
        let spec = SortSpec::by(SortField::Subscribers, SortDir::Desc);
        let v = serde_json::to_value(spec).unwrap();
        assert_eq!(v, serde_json::json!({"key": "subscribers", "dir": "desc"}));
    }
}
