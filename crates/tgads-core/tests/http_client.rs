use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use tgads_core::catalog::TaxonomyFilter;
use tgads_core::config::ApiConfig;
use tgads_core::protocol::{
    AdMethod, AdTargetType, CategoryUpdate, CreateAdRequest, GenerateAdRequest, SimilarRequest,
};
use tgads_core::{AdsApi, CatalogApi, EngineError, HttpClient};

async fn list_categories() -> Json<Value> {
    Json(json!(["news", "tech"]))
}

async fn list_geos() -> Json<Value> {
    Json(json!(["us", "de"]))
}

async fn list_channels(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let category = params.get("category").cloned().unwrap_or_else(|| "any".into());
    let geo = params.get("geo").cloned().unwrap_or_else(|| "any".into());
    Json(json!({
        "channels": [
            {"id": 1, "username": format!("{category}_{geo}"), "title": "<b>One</b>",
             "subscribers": "1500", "category": category, "geo": null},
            {"id": 2, "username": "second", "subscribers": 20}
        ],
        "category": params.get("category"),
    }))
}

async fn similar(Json(body): Json<SimilarRequest>) -> Json<Value> {
    let records: Vec<Value> = body
        .channels_names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"id": 100 + i, "username": format!("like_{name}")}))
        .collect();
    Json(Value::Array(records))
}

async fn refresh(Path(id): Path<i64>) -> axum::response::Response {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "channel not found"}))).into_response();
    }
    Json(json!({"id": id, "username": "fresh", "subscribers": 77})).into_response()
}

async fn set_category(Path(_id): Path<i64>, Json(body): Json<CategoryUpdate>) -> axum::response::Response {
    if body.category == "forbidden" {
        return (StatusCode::FORBIDDEN, Json(json!("category not allowed"))).into_response();
    }
    Json(json!({"ok": true})).into_response()
}

async fn set_geo(Path(_id): Path<i64>) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn generate(Json(body): Json<GenerateAdRequest>) -> Json<Value> {
    Json(json!({
        "ad_message": format!("{} for {}", body.description, body.channels_names.join(","))
    }))
}

async fn create(Json(body): Json<CreateAdRequest>) -> axum::response::Response {
    if body.cpm > 100.0 {
        return (StatusCode::BAD_REQUEST, "cpm too high").into_response();
    }
    Json(json!({"status": "ok", "message": format!("{} {:?}", body.channels.len(), body.method)}))
        .into_response()
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!([]))
}

async fn serve() -> String {
    let api = Router::new()
        .route("/categories/", get(list_categories))
        .route("/geos/", get(list_geos))
        .route("/channels/", get(list_channels))
        .route("/channels/similar", post(similar))
        .route("/channels/:id/get-new-data", get(refresh))
        .route("/channels/:id/category", put(set_category))
        .route("/channels/:id/geo", put(set_geo))
        .route("/ads/generate", post(generate))
        .route("/ads/", post(create));
    let app = Router::new()
        .nest("/api/v1", api)
        .route("/slow/categories/", get(slow))
        .route("/slow/geos/", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: String, timeout: u64) -> HttpClient {
    HttpClient::new(&ApiConfig {
        base_url,
        request_timeout_secs: timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn catalog_fetch_sends_only_set_filters_and_decodes_leniently() {
    let root = serve().await;
    let api = client(format!("{root}/api/v1/"), 5);

    let filter = TaxonomyFilter {
        category: Some("news".into()),
        geo: None,
    };
    let channels = api.fetch_catalog(&filter).await.unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].username, "news_any");
    assert_eq!(channels[0].subscribers, 1500);
    assert_eq!(channels[0].geo, "");
    assert_eq!(channels[0].title.as_str(), "<b>One</b>");
    assert_eq!(channels[1].description, "");

    let all = api.fetch_catalog(&TaxonomyFilter::default()).await.unwrap();
    assert_eq!(all[0].username, "any_any");
}

#[tokio::test]
async fn taxonomy_similar_and_refresh() {
    let root = serve().await;
    let api = client(format!("{root}/api/v1"), 5);

    let taxonomy = api.fetch_taxonomy().await.unwrap();
    assert_eq!(taxonomy.categories, vec!["news", "tech"]);
    assert_eq!(taxonomy.geos, vec!["us", "de"]);

    let similar = api
        .fetch_similar(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    let names: Vec<_> = similar.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, vec!["like_a", "like_b"]);

    let fresh = api.fetch_one(9).await.unwrap();
    assert_eq!((fresh.id, fresh.subscribers), (9, 77));
}

#[tokio::test]
async fn error_bodies_become_transport_messages() {
    let root = serve().await;
    let api = client(format!("{root}/api/v1"), 5);

    assert_eq!(
        api.fetch_one(404).await.unwrap_err(),
        EngineError::transport("channel not found")
    );
    assert_eq!(
        api.set_category(1, "forbidden").await.unwrap_err(),
        EngineError::transport("category not allowed")
    );
    assert_eq!(
        api.set_geo(1, "us").await.unwrap_err(),
        EngineError::transport("API error: 500 Internal Server Error")
    );
    api.set_category(1, "tech").await.unwrap();
}

#[tokio::test]
async fn ads_round_trip() {
    let root = serve().await;
    let api = client(format!("{root}/api/v1"), 5);

    let text = api
        .generate_ad(&GenerateAdRequest {
            channels_names: vec!["durov".into(), "tg".into()],
            description: "coffee".into(),
        })
        .await
        .unwrap();
    assert_eq!(text, "coffee for durov,tg");

    let mut req = CreateAdRequest {
        text,
        promote_url: "https://t.me/shop".into(),
        cpm: 0.1,
        views_per_user: 0,
        budget: 0.1,
        daily_budget: 0.1,
        active: false,
        target_type: AdTargetType::Channel,
        channels: vec!["durov".into()],
        method: AdMethod::Save,
    };
    let resp = api.create_ad(&req).await.unwrap();
    assert_eq!(resp.status, "ok");
    assert_eq!(resp.message.as_deref(), Some("1 Save"));

    req.cpm = 500.0;
    assert_eq!(
        api.create_ad(&req).await.unwrap_err(),
        EngineError::transport("cpm too high")
    );
}

#[tokio::test]
async fn timeout_becomes_transport_error() {
    let root = serve().await;
    let api = client(format!("{root}/slow"), 1);
    let err = api.fetch_taxonomy().await.unwrap_err();
    assert_eq!(err, EngineError::transport("request timed out"));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(format!("http://{addr}/api/v1"), 5);
    let err = api.fetch_catalog(&TaxonomyFilter::default()).await.unwrap_err();
    assert!(!err.is_validation());
    assert!(!err.message().is_empty());
}
