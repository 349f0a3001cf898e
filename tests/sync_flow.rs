//! End-to-end runs against a mock review API and a JSON store on disk

use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use review_sync::{sync, Config, JsonStore, ReviewApiClient, ReviewStore, StoredReview, SyncError};

const SHOP: &str = "12345";

/// Review number `i`; every third one is low rated, every fifth one is blank
fn api_review(i: u64) -> Value {
    let rating = if i % 3 == 0 { 2 } else { 5 };
    let text = if i % 5 == 0 { "" } else { "Beautiful work" };
    json!({
        "shop_id": 12345,
        "listing_id": i,
        "transaction_id": 1000 + i,
        "buyer_user_id": 2000 + i,
        "rating": rating,
        "review": text,
        "language": "en",
        "image_url_fullxfull": null,
        "create_timestamp": 1_700_000_000 + i,
        "update_timestamp": 1_700_000_000 + i
    })
}

fn expected_listing_ids(total: u64) -> Vec<i64> {
    (0..total)
        .filter(|i| i % 3 != 0 && i % 5 != 0)
        .map(|i| i as i64)
        .collect()
}

async fn mount_page(server: &MockServer, offset: u64, reviews: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/shops/{SHOP}/reviews")))
        .and(query_param("limit", "100"))
        .and(query_param("offset", offset.to_string()))
        .and(header("x-api-key", "test-key"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 200,
            "results": reviews
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.page_delay_ms = 0;
    config.fetch.max_reviews = None;
    config
}

#[tokio::test]
async fn test_two_pages_then_empty_replaces_collection() {
    let server = MockServer::start().await;
    mount_page(&server, 0, (0..100).map(api_review).collect()).await;
    mount_page(&server, 100, (100..200).map(api_review).collect()).await;
    mount_page(&server, 200, Vec::new()).await;

    let dir = tempdir().unwrap();
    let config = test_config();

    // stale content from an earlier run
    let store = JsonStore::new(dir.path(), &config.store.database, &config.store.collection).unwrap();
    store
        .insert_many(&[StoredReview {
            listing_id: Some(999_999),
            rating: Some(5),
            review: Some("old".to_string()),
            ..Default::default()
        }])
        .await
        .unwrap();

    let client = ReviewApiClient::new(&server.uri(), SHOP, "test-key");
    let report = sync(&client, dir.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(report.pages_requested, 3);
    assert_eq!(report.fetched, 200);

    let expected = expected_listing_ids(200);
    assert_eq!(report.eligible, expected.len());
    assert_eq!(report.inserted, expected.len() as u64);

    let stored = store.load_all().await.unwrap();
    let ids: Vec<i64> = stored.iter().filter_map(|d| d.listing_id).collect();
    assert_eq!(ids, expected);
    assert!(stored.iter().all(|d| d.rating.unwrap_or(0) >= 4));

    let raw = std::fs::read_to_string(dir.path().join("bbpcontent/reviews.json")).unwrap();
    assert!(raw.contains("\"buyerid\""));
    assert!(!raw.contains("\"buyer_user_id\""));

    server.verify().await;
}

#[tokio::test]
async fn test_ceiling_stops_paging() {
    let server = MockServer::start().await;
    mount_page(&server, 0, (0..100).map(api_review).collect()).await;
    mount_page(&server, 100, (100..200).map(api_review).collect()).await;

    let dir = tempdir().unwrap();
    let mut config = test_config();
    config.fetch.max_reviews = Some(200);

    let client = ReviewApiClient::new(&server.uri(), SHOP, "test-key");
    let report = sync(&client, dir.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(report.pages_requested, 2);
    assert_eq!(report.fetched, 200);

    server.verify().await;
}

#[tokio::test]
async fn test_decode_failure_keeps_previous_collection() {
    let server = MockServer::start().await;
    mount_page(&server, 0, (0..100).map(api_review).collect()).await;
    Mock::given(method("GET"))
        .and(path(format!("/shops/{SHOP}/reviews")))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"count\": 1, \"results\": ["))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = test_config();
    let store = JsonStore::new(dir.path(), &config.store.database, &config.store.collection).unwrap();
    let previous = StoredReview {
        listing_id: Some(42),
        rating: Some(5),
        review: Some("keep me".to_string()),
        ..Default::default()
    };
    store.insert_many(std::slice::from_ref(&previous)).await.unwrap();

    let client = ReviewApiClient::new(&server.uri(), SHOP, "test-key");
    let err = sync(&client, dir.path().to_str().unwrap(), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Decode { offset: 100, .. }));
    assert_eq!(store.load_all().await.unwrap(), vec![previous]);
}
