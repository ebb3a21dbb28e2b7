use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Local;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{
    alert, beacons, health, mappings, medications, monitoring, notifications, schedule,
};
use crate::services::{MonitoringSession, NotificationCenter, Tracker};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub tracker: Tracker,
    pub session: Arc<MonitoringSession>,
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    /// Restores persisted state and wires the tracker to the notification center.
    pub async fn new(
        config: Config,
        pool: SqlitePool,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        let tracker = Tracker::load(
            pool.clone(),
            notifications.clone(),
            config.monitor.thresholds(),
            Local::now().naive_local(),
        )
        .await;
        let session = Arc::new(MonitoringSession::new(
            tracker.clone(),
            config.monitor.evaluation_interval_secs,
        ));

        Self {
            pool,
            config: Arc::new(config),
            tracker,
            session,
            notifications,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // The watch and phone UIs run on the local network.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let monitoring_routes = Router::new()
        .route("/api/v1/monitoring", get(monitoring::get_monitoring))
        .route("/api/v1/monitoring/start", post(monitoring::start_monitoring))
        .route("/api/v1/monitoring/stop", post(monitoring::stop_monitoring))
        .route("/api/v1/schedule/status", get(schedule::get_status))
        .route("/api/v1/alert", get(alert::get_alert))
        .route(
            "/api/v1/alert/:alert_id/acknowledge",
            post(alert::acknowledge_alert),
        )
        .route(
            "/api/v1/notifications/pending",
            get(notifications::list_pending),
        );

    let beacon_routes = Router::new()
        .route("/api/v1/beacons", get(beacons::list_beacons))
        .route("/api/v1/beacons/unassigned", get(beacons::list_unassigned))
        .route(
            "/api/v1/beacons/advertisements",
            post(beacons::ingest_advertisements),
        )
        .route("/api/v1/beacons/radio", post(beacons::set_radio_power))
        .route(
            "/api/v1/mappings",
            get(mappings::list_mappings).post(mappings::assign_beacon),
        )
        .route(
            "/api/v1/mappings/:beacon_id",
            delete(mappings::unassign_beacon),
        );

    let medication_routes = Router::new()
        .route(
            "/api/v1/medications",
            get(medications::list_medications).post(medications::add_medications),
        )
        .route(
            "/api/v1/medications/available-boxes",
            get(medications::available_boxes),
        )
        .route(
            "/api/v1/medications/:id",
            put(medications::update_medication).delete(medications::delete_medication),
        );

    Router::new()
        .merge(public_routes)
        .merge(monitoring_routes)
        .merge(beacon_routes)
        .merge(medication_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
