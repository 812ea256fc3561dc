//! Backend boundary: the catalog and ad services the engine talks to.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use futures_util::future::try_join;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::TaxonomyFilter;
use crate::channel::{ChannelId, ChannelRecord, MetaField};
use crate::config::ApiConfig;
use crate::error::{EngineError, EngineResult};
use crate::protocol::{
    endpoints, CatalogResponse, CategoryUpdate, CreateAdRequest, CreateAdResponse,
    GenerateAdRequest, GenerateAdResponse, GeoUpdate, SimilarRequest, Taxonomy,
};

pub trait CatalogApi: Send + Sync {
    fn fetch_catalog(
        &self,
        filter: &TaxonomyFilter,
    ) -> impl Future<Output = EngineResult<Vec<ChannelRecord>>> + Send;

    fn fetch_similar(
        &self,
        usernames: &[String],
    ) -> impl Future<Output = EngineResult<Vec<ChannelRecord>>> + Send;

    fn fetch_one(&self, id: ChannelId) -> impl Future<Output = EngineResult<ChannelRecord>> + Send;

    fn set_category(&self, id: ChannelId, value: &str)
        -> impl Future<Output = EngineResult<()>> + Send;

    fn set_geo(&self, id: ChannelId, value: &str) -> impl Future<Output = EngineResult<()>> + Send;

    fn fetch_taxonomy(&self) -> impl Future<Output = EngineResult<Taxonomy>> + Send;
}

pub trait AdsApi: Send + Sync {
    /// Returns the generated ad text.
    fn generate_ad(
        &self,
        request: &GenerateAdRequest,
    ) -> impl Future<Output = EngineResult<String>> + Send;

    fn create_ad(
        &self,
        request: &CreateAdRequest,
    ) -> impl Future<Output = EngineResult<CreateAdResponse>> + Send;
}

/// reqwest client bound to one backend base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("tgads/", env!("CARGO_PKG_VERSION")));
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> EngineResult<Response> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let msg = crate::protocol::error_message(status.as_u16(), status.canonical_reason(), &body);
        debug!("[api] {} -> {}", status, msg);
        Err(EngineError::Transport(msg))
    }

    async fn send_json<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> EngineResult<T> {
        let body = self.send(request).await?.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| EngineError::transport(format!("invalid response from {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        debug!("[api] GET {}", path);
        self.send_json(path, self.client.get(self.url(path))).await
    }
}

impl CatalogApi for HttpClient {
    async fn fetch_catalog(&self, filter: &TaxonomyFilter) -> EngineResult<Vec<ChannelRecord>> {
        debug!("[api] GET {} {:?}", endpoints::CHANNELS, filter.query_pairs());
        let request = self
            .client
            .get(self.url(endpoints::CHANNELS))
            .query(&filter.query_pairs());
        let resp: CatalogResponse = self.send_json(endpoints::CHANNELS, request).await?;
        Ok(resp.channels)
    }

    async fn fetch_similar(&self, usernames: &[String]) -> EngineResult<Vec<ChannelRecord>> {
        debug!("[api] POST {} ({} seeds)", endpoints::SIMILAR, usernames.len());
        let body = SimilarRequest {
            channels_names: usernames.to_vec(),
        };
        let request = self.client.post(self.url(endpoints::SIMILAR)).json(&body);
        self.send_json(endpoints::SIMILAR, request).await
    }

    async fn fetch_one(&self, id: ChannelId) -> EngineResult<ChannelRecord> {
        self.get_json(&endpoints::refresh(id)).await
    }

    async fn set_category(&self, id: ChannelId, value: &str) -> EngineResult<()> {
        let path = endpoints::field(id, MetaField::Category);
        debug!("[api] PUT {}", path);
        let body = CategoryUpdate {
            category: value.to_string(),
        };
        self.send(self.client.put(self.url(&path)).json(&body)).await?;
        Ok(())
    }

    async fn set_geo(&self, id: ChannelId, value: &str) -> EngineResult<()> {
        let path = endpoints::field(id, MetaField::Geo);
        debug!("[api] PUT {}", path);
        let body = GeoUpdate {
            geo: value.to_string(),
        };
        self.send(self.client.put(self.url(&path)).json(&body)).await?;
        Ok(())
    }

    async fn fetch_taxonomy(&self) -> EngineResult<Taxonomy> {
        let (categories, geos) = try_join(
            self.get_json::<Vec<String>>(endpoints::CATEGORIES),
            self.get_json::<Vec<String>>(endpoints::GEOS),
        )
        .await?;
        Ok(Taxonomy { categories, geos })
    }
}

impl AdsApi for HttpClient {
    async fn generate_ad(&self, request: &GenerateAdRequest) -> EngineResult<String> {
        debug!("[api] POST {} ({} channels)", endpoints::GENERATE_AD, request.channels_names.len());
        let req = self.client.post(self.url(endpoints::GENERATE_AD)).json(request);
        let resp: GenerateAdResponse = self.send_json(endpoints::GENERATE_AD, req).await?;
        Ok(resp.ad_message)
    }

    async fn create_ad(&self, request: &CreateAdRequest) -> EngineResult<CreateAdResponse> {
        debug!("[api] POST {} method={}", endpoints::ADS, request.method.label());
        let req = self.client.post(self.url(endpoints::ADS)).json(request);
        self.send_json(endpoints::ADS, req).await
    }
}
