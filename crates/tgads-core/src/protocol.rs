use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, ChannelRecord, MetaField};

/// Paths relative to `api.base_url`.
pub mod endpoints {
    use super::{ChannelId, MetaField};

    pub const CATEGORIES: &str = "categories/";
    pub const GEOS: &str = "geos/";
    pub const CHANNELS: &str = "channels/";
    pub const SIMILAR: &str = "channels/similar";
    pub const GENERATE_AD: &str = "ads/generate";
    pub const ADS: &str = "ads/";

    pub fn refresh(id: ChannelId) -> String {
        format!("channels/{}/get-new-data", id)
    }

    pub fn field(id: ChannelId, field: MetaField) -> String {
        format!("channels/{}/{}", id, field.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarRequest {
    pub channels_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoUpdate {
    pub geo: String,
}

/// Selectable category and geo values, fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<String>,
    pub geos: Vec<String>,
}

impl Taxonomy {
    pub fn values(&self, field: MetaField) -> &[String] {
        match field {
            MetaField::Category => &self.categories,
            MetaField::Geo => &self.geos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAdRequest {
    pub channels_names: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAdResponse {
    #[serde(default)]
    pub ad_message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdTargetType {
    #[default]
    Channel,
    Search,
    Bot,
}

impl AdTargetType {
    pub fn next(self) -> Self {
        match self {
            Self::Channel => Self::Search,
            Self::Search => Self::Bot,
            Self::Bot => Self::Channel,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Search => "search",
            Self::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdMethod {
    #[default]
    Draft,
    Save,
}

impl AdMethod {
    pub fn toggle(self) -> Self {
        match self {
            Self::Draft => Self::Save,
            Self::Save => Self::Draft,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Save => "save",
        }
    }
}

/// Body of `POST ads/`. Budget fields are passed through as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAdRequest {
    pub text: String,
    pub promote_url: String,
    pub cpm: f64,
    pub views_per_user: u32,
    pub budget: f64,
    pub daily_budget: f64,
    pub active: bool,
    pub target_type: AdTargetType,
    pub channels: Vec<String>,
    pub method: AdMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAdResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Reduce a non-success response to the message shown to the user.
///
/// Order: a JSON object's `error` string, a bare JSON string, the raw text
/// body, and finally the status line.
pub fn error_message(status: u16, reason: Option<&str>, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    if let Ok(text) = serde_json::from_str::<String>(body) {
        return text;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match reason {
        Some(reason) => format!("API error: {} {}", status, reason),
        None => format!("API error: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins() {
        let msg = error_message(400, Some("Bad Request"), r#"{"error":"no such geo","code":7}"#);
        assert_eq!(msg, "no such geo");
    }

    #[test]
    fn json_string_body() {
        assert_eq!(error_message(500, None, r#""backend down""#), "backend down");
    }

    #[test]
    fn text_body_then_status_line() {
        assert_eq!(error_message(502, Some("Bad Gateway"), "upstream\n"), "upstream");
        assert_eq!(
            error_message(404, Some("Not Found"), "  "),
            "API error: 404 Not Found"
        );
    }

    #[test]
    fn create_ad_wire_names() {
        let req = CreateAdRequest {
            text: "hi".into(),
            promote_url: "https://t.me/x".into(),
            cpm: 0.1,
            views_per_user: 0,
            budget: 0.1,
            daily_budget: 0.1,
            active: false,
            target_type: AdTargetType::Bot,
            channels: vec!["a".into()],
            method: AdMethod::Save,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["target_type"], "bot");
        assert_eq!(v["method"], "save");
        assert_eq!(v["views_per_user"], 0);
        assert_eq!(v["daily_budget"], 0.1);
    }

    #[test]
    fn catalog_response_ignores_echoed_filters() {
        let resp: CatalogResponse = serde_json::from_str(
            r#"{"channels":[{"id":1,"username":"a"}],"category":"news","geo":null}"#,
        )
        .unwrap();
        assert_eq!(resp.channels.len(), 1);
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::refresh(9), "channels/9/get-new-data");
        assert_eq!(endpoints::field(9, MetaField::Geo), "channels/9/geo");
    }
}
