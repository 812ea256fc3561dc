//! Channel curation engine for the tgads ad-campaign tool.
//!
//! Holds the catalog model, the fetch/derive/select state machine that the
//! terminal front-end drives, and the HTTP client for the catalog backend.

pub mod ads;
pub mod api;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod platform;
pub mod protocol;
pub mod store;

pub use api::{AdsApi, CatalogApi, HttpClient};
pub use channel::{ChannelId, ChannelRecord, Markup, MetaField};
pub use error::{EngineError, EngineResult};
