use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

/// Catalog identifier. Stable across fetches.
pub type ChannelId = i64;

/// Pre-rendered HTML fragment as delivered by the catalog (titles, avatars).
///
/// The engine never parses or sanitises it; it is stored, searched and
/// sorted as the raw string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Markup {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Markup {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One channel as returned by the catalog backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Markup,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photo_element: Markup,
    #[serde(default, deserialize_with = "lenient_count")]
    pub subscribers: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub geo: String,
}

impl ChannelRecord {
    pub fn new(id: ChannelId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            title: Markup::default(),
            description: String::new(),
            photo_element: Markup::default(),
            subscribers: 0,
            category: String::new(),
            geo: String::new(),
        }
    }

    /// Public web preview of the channel.
    pub fn preview_url(&self) -> String {
        format!("https://t.me/s/{}", self.username)
    }

    pub fn link(&self) -> String {
        channel_link(&self.username)
    }

    pub fn field(&self, field: MetaField) -> &str {
        match field {
            MetaField::Category => &self.category,
            MetaField::Geo => &self.geo,
        }
    }

    pub fn set_field(&mut self, field: MetaField, value: impl Into<String>) {
        match field {
            MetaField::Category => self.category = value.into(),
            MetaField::Geo => self.geo = value.into(),
        }
    }
}

pub fn channel_link(username: &str) -> String {
    format!("https://t.me/{}", username)
}

/// The two per-channel attributes a user may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaField {
    Category,
    Geo,
}

impl MetaField {
    pub fn label(self) -> &'static str {
        match self {
            MetaField::Category => "category",
            MetaField::Geo => "geo",
        }
    }
}

impl std::fmt::Display for MetaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// The catalog has shipped subscriber counts as numbers, numeric strings and null.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_count<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<RawCount>::deserialize(de)? {
        Some(RawCount::Unsigned(n)) => n,
        Some(RawCount::Signed(n)) => n.max(0) as u64,
        Some(RawCount::Float(f)) if f.is_finite() && f > 0.0 => f as u64,
        Some(RawCount::Text(s)) => parse_count_text(&s),
        _ => 0,
    };
    Ok(count)
}

fn parse_count_text(s: &str) -> u64 {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return n;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_record() {
        let rec: ChannelRecord = serde_json::from_str(
            r#"{"id":42,"username":"rustlang","title":"<b>Rust</b>","description":"news",
                "photo_element":"<img src=x>","subscribers":1200,"category":"tech","geo":"us"}"#,
        )
        .unwrap();
        assert_eq!(rec.id, 42);
        assert_eq!(rec.title.as_str(), "<b>Rust</b>");
        assert_eq!(rec.subscribers, 1200);
        assert_eq!(rec.field(MetaField::Geo), "us");
    }

    #[test]
    fn nulls_and_missing_fields_become_empty() {
        let rec: ChannelRecord = serde_json::from_str(
            r#"{"id":1,"username":"a","title":null,"category":null,"subscribers":null}"#,
        )
        .unwrap();
        assert!(rec.title.is_empty());
        assert_eq!(rec.description, "");
        assert_eq!(rec.category, "");
        assert_eq!(rec.geo, "");
        assert_eq!(rec.subscribers, 0);
    }

    #[test]
    fn subscriber_count_is_lenient() {
        let parse = |v: &str| -> u64 {
            let json = format!(r#"{{"id":1,"username":"a","subscribers":{}}}"#, v);
            serde_json::from_str::<ChannelRecord>(&json).unwrap().subscribers
        };
        assert_eq!(parse("\"1500\""), 1500);
        assert_eq!(parse("\" 77 \""), 77);
        assert_eq!(parse("\"n/a\""), 0);
        assert_eq!(parse("-5"), 0);
        assert_eq!(parse("12.9"), 12);
        assert_eq!(parse("true"), 0);
    }

    #[test]
    fn set_field_touches_only_that_field() {
        let mut rec = ChannelRecord::new(7, "chan");
        rec.category = "news".into();
        rec.set_field(MetaField::Geo, "de");
        assert_eq!(rec.category, "news");
        assert_eq!(rec.geo, "de");
    }

    #[test]
    fn links() {
        let rec = ChannelRecord::new(1, "durov");
        assert_eq!(rec.preview_url(), "https://t.me/s/durov");
        assert_eq!(rec.link(), "https://t.me/durov");
    }
}
