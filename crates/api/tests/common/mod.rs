//! Common test utilities for integration tests.
//!
//! Every test app runs against its own migrated in-memory SQLite database,
//! so tests are independent and need no external services.

// Not every integration test uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use pillwatch_api::{
    app::{create_app, AppState},
    config::{
        Config, DatabaseConfig, LoggingConfig, MonitorConfig, NotificationsConfig, RadioConfig,
        ServerConfig,
    },
    services::{ConsoleSink, NotificationCenter},
};
use serde_json::json;
use sqlx::SqlitePool;
use tower::ServiceExt;

/// Create a migrated in-memory database pool.
pub async fn create_test_pool() -> SqlitePool {
    persistence::db::create_memory_pool()
        .await
        .expect("Failed to create in-memory database")
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        monitor: MonitorConfig {
            rssi_threshold: -55,
            sensor_open_threshold: 128,
            due_window_secs: 60,
            evaluation_interval_secs: 60,
            box_count: 10,
            auto_start: false,
        },
        radio: RadioConfig::default(),
        notifications: NotificationsConfig::default(),
    }
}

/// A router together with the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn create_test_app_with_pool(pool: SqlitePool) -> TestApp {
    let notifications = Arc::new(NotificationCenter::new(Arc::new(ConsoleSink)));
    let state = AppState::new(test_config(), pool.clone(), notifications).await;
    TestApp {
        router: create_app(state.clone()),
        state,
        pool,
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_pool(create_test_pool().await).await
}

/// Build a request with a JSON body.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request without a body.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    empty_request(Method::GET, uri)
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// One advertisement in the bridge wire format.
///
/// `sensor` becomes the first manufacturer payload byte; above 128 reads as open.
pub fn advertisement(beacon_id: &str, name: Option<&str>, rssi: i16, sensor: u8) -> serde_json::Value {
    json!({
        "beaconId": beacon_id,
        "name": name,
        "rssi": rssi,
        "manufacturerData": [sensor, 0],
    })
}

/// Powers the radio and starts scanning through the API.
pub async fn start_scanning(app: &TestApp) {
    app.send(json_request(
        Method::POST,
        "/api/v1/beacons/radio",
        json!({ "powered": true }),
    ))
    .await;
    app.state.tracker.start_scanning().await.unwrap();
}

pub async fn post_advertisements(app: &TestApp, advertisements: Vec<serde_json::Value>) -> Response {
    app.send(json_request(
        Method::POST,
        "/api/v1/beacons/advertisements",
        json!({ "advertisements": advertisements }),
    ))
    .await
}

pub async fn assign(app: &TestApp, beacon_id: &str, box_number: u8) -> Response {
    app.send(json_request(
        Method::POST,
        "/api/v1/mappings",
        json!({ "beaconId": beacon_id, "boxNumber": box_number }),
    ))
    .await
}

/// Adds entries through the API and returns the created entries.
pub async fn add_medications(app: &TestApp, entries: serde_json::Value) -> Vec<serde_json::Value> {
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": entries }),
        ))
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    parse_response_body(response).await["medications"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}
