//! HTTP transport tests: routes, status codes, and cache headers.

use chrono::DateTime;
use lot_catalog::config::Config;
use lot_catalog::materialize::materialize_snapshots;
use lot_catalog::query::QueryService;
use lot_catalog::server::build_router;
use lot_catalog_core::models::{row, RawRow};
use lot_catalog_core::source::memory::InMemoryRecordSource;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn rows() -> Vec<RawRow> {
    vec![
        row(&[
            ("vin", "V1"),
            ("stock", "A1"),
            ("model", "F-150"),
            ("trim", "XLT"),
            ("paint", "Oxford White"),
            ("msrp", "52000"),
        ]),
        row(&[
            ("vin", "V2"),
            ("stock", "A2"),
            ("model", "Explorer"),
            ("trim", "ST"),
            ("paint", "Rapid Red"),
            ("msrp", "55000"),
        ]),
    ]
}

/// Start a server on an ephemeral port and return its base URL and source.
async fn start_server(tmp: &TempDir) -> (String, Arc<InMemoryRecordSource>) {
    let config: Config = toml::from_str(&format!(
        r#"[source]
path = "{}/inventory.sqlite"

[snapshot]
dir = "{}/cache"
refresh_interval_secs = 0

[query]
fresh_max_age_secs = 120
stale_max_age_secs = 10
max_per_page = 50
"#,
        tmp.path().display(),
        tmp.path().display()
    ))
    .unwrap();
    let config = Arc::new(config);

    let source = Arc::new(InMemoryRecordSource::new(
        rows(),
        DateTime::from_timestamp(1_760_000_000, 0).unwrap(),
    ));
    materialize_snapshots(&config, source.as_ref(), false)
        .await
        .unwrap();

    let service = Arc::new(QueryService::new(config.clone(), source.clone()).unwrap());
    let app = build_router(config, service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{}", addr), source)
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_inventory_snapshot_headers_and_304() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;
    let client = reqwest::Client::new();
    let url = format!("{}/inventory?per_page=1&lite=1", base);

    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let etag = resp.headers()["etag"].to_str().unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(resp.headers()["cache-control"], "public, max-age=120");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["servedFrom"], "snapshot");
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["perPage"], 1);
    assert_eq!(body["stale"], false);
    assert_eq!(body["vehicles"][0]["vin"], "V1");
    assert!(body.get("facets").is_none());

    let again = client
        .get(&url)
        .header("If-None-Match", etag.as_str())
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 304);
    assert_eq!(again.headers()["etag"].to_str().unwrap(), etag);
}

#[tokio::test]
async fn test_stale_snapshot_is_not_revalidated() {
    let tmp = TempDir::new().unwrap();
    let (base, source) = start_server(&tmp).await;
    let client = reqwest::Client::new();
    let url = format!("{}/inventory", base);

    let resp = client.get(&url).send().await.unwrap();
    let etag = resp.headers()["etag"].to_str().unwrap().to_string();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["stale"], false);

    source.touch(DateTime::from_timestamp(1_760_000_060, 0).unwrap());
    let resp = client
        .get(&url)
        .header("If-None-Match", etag.as_str())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_ne!(resp.headers()["etag"].to_str().unwrap(), etag);
    assert_eq!(
        resp.headers()["cache-control"],
        "public, max-age=10, must-revalidate"
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["servedFrom"], "snapshot");
    assert_eq!(body["stale"], true);
}

#[tokio::test]
async fn test_filtered_inventory_scans() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    let resp = reqwest::get(format!("{}/inventory?model=explorer&facets=1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["cache-control"],
        "public, max-age=10, must-revalidate"
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["servedFrom"], "scan");
    assert_eq!(body["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(body["vehicles"][0]["vin"], "V2");
    assert_eq!(body["facets"]["model"]["f150"], 1);
}

#[tokio::test]
async fn test_per_page_is_clamped() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    let body: Value = reqwest::get(format!("{}/inventory?per_page=5000", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["perPage"], 50);
}

#[tokio::test]
async fn test_malformed_params_are_bad_request() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    for query in ["page=two", "sort=cheapest", "price_min=abc"] {
        let resp = reqwest::get(format!("{}/inventory?{}", base, query))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "query: {}", query);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn test_stock_param_returns_single_vehicle_list() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    let body: Value = reqwest::get(format!("{}/inventory?stock=A2", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(body["vehicles"][0]["vin"], "V2");

    let body: Value = reqwest::get(format!("{}/inventory?stock=NOPE", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["vehicles"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_vehicle_detail_and_404() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = start_server(&tmp).await;

    let resp = reqwest::get(format!("{}/inventory/A1", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["vehicle"]["vin"], "V1");
    assert_eq!(body["servedFrom"], "scan");

    let resp = reqwest::get(format!("{}/inventory/NOPE", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}
