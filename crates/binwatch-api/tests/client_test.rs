#![allow(clippy::unwrap_used)]
// Integration tests for `BinwatchClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use binwatch_api::{BinwatchClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BinwatchClient) {
    let server = MockServer::start().await;
    let client = BinwatchClient::from_url(&server.uri(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn bin_json(id: &str, fill: f64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Bin {id}"),
        "location": {"latitude": 40.78, "longitude": -73.96, "address": "5th Ave"},
        "fill_level": fill,
        "battery_level": 64.0,
        "status": status,
        "last_updated": "2024-03-01T08:00:00.000000",
        "is_full": fill >= 90.0,
        "temperature": 18.5,
        "humidity": 55.0
    })
}

// ── Read endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn test_api_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Smart Dustbin Monitoring API",
            "status": "active",
            "bins_count": 12
        })))
        .mount(&server)
        .await;

    let status = client.api_status().await.unwrap();
    assert_eq!(status.status, "active");
    assert_eq!(status.bins_count, 12);
}

#[tokio::test]
async fn test_list_dustbins() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dustbins"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([bin_json("a", 95.0, "online"), bin_json("b", 12.0, "offline")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bins = client.list_dustbins().await.unwrap();
    assert_eq!(bins.len(), 2);
    assert_eq!(bins[0].id, "a");
    assert!(bins[0].is_full);
    assert_eq!(bins[1].status, "offline");
}

#[tokio::test]
async fn test_get_dustbin_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dustbins/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Dustbin not found"})))
        .mount(&server)
        .await;

    let err = client.get_dustbin("missing").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Dustbin not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_notifications_sends_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .and(query_param("limit", "20"))
        .and(query_param("unread_only", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "n1",
            "dustbin_id": "a",
            "dustbin_name": "Bin a",
            "message": "Bin a is 95% full",
            "type": "full",
            "priority": "critical",
            "timestamp": "2024-03-01T08:00:00",
            "is_read": false
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let notes = client.list_notifications(20, true).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].priority, "critical");
    assert!(!notes[0].is_read);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_bins": 12,
            "full_bins": 3,
            "offline_bins": 1,
            "low_battery_bins": 2,
            "unread_notifications": 5,
            "avg_fill_level": 61.4,
            "last_updated": "2024-03-01T08:00:00"
        })))
        .mount(&server)
        .await;

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_bins, 12);
    assert_eq!(stats.unread_notifications, 5);
    assert!((stats.avg_fill_level - 61.4).abs() < f64::EPSILON);
}

// ── Write endpoints ─────────────────────────────────────────────────

#[tokio::test]
async fn test_mark_notification_read() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/notifications/n1/read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Notification marked as read"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.mark_notification_read("n1").await.unwrap();
    assert_eq!(ack.message, "Notification marked as read");
}

#[tokio::test]
async fn test_initialize_demo_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/initialize-demo-data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Demo data initialized", "bins": 12})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.initialize_demo_data().await.unwrap();
    assert_eq!(ack.bins, 12);
}

#[tokio::test]
async fn test_simulate_iot_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/simulate/iot-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "IoT data simulated successfully",
            "timestamp": "2024-03-01T08:00:00.5"
        })))
        .mount(&server)
        .await;

    let ack = client.simulate_iot_data().await.unwrap();
    assert!(ack.timestamp.is_some());
}

// ── Failure mapping ─────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dustbins"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = client.list_dustbins().await;
    assert!(
        matches!(result, Err(Error::Api { status: 500, .. })),
        "expected Api 500, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_bins": "twelve"})))
        .mount(&server)
        .await;

    let result = client.dashboard_stats().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    let client = BinwatchClient::from_url(
        &server.uri(),
        &TransportConfig::with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/dustbins"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = client.list_dustbins().await;
    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout, got: {result:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = BinwatchClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
        Duration::from_secs(1),
    );

    let result = client.list_dustbins().await;
    assert!(
        matches!(result, Err(Error::Transport(_) | Error::Timeout { .. })),
        "expected transport failure, got: {result:?}"
    );
}
