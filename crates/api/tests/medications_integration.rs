//! Integration tests for medication schedule endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    add_medications, create_test_app, create_test_app_with_pool, empty_request, get_request,
    json_request, parse_response_body,
};
use serde_json::json;

#[tokio::test]
async fn test_add_batch_returns_entries() {
    let app = create_test_app().await;

    let added = add_medications(
        &app,
        json!([
            { "time": "08:00", "boxNumber": 1 },
            { "time": "20:30", "boxNumber": 2 },
        ]),
    )
    .await;

    assert_eq!(added.len(), 2);
    assert_eq!(added[0]["time"], "08:00");
    assert_eq!(added[1]["boxNumber"], 2);
    assert!(added[0]["id"].as_str().is_some());

    let body = parse_response_body(app.send(get_request("/api/v1/medications")).await).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_add_batch_schedules_daily_reminders() {
    let app = create_test_app().await;
    let added = add_medications(&app, json!([{ "time": "08:00", "boxNumber": 1 }])).await;
    let id = added[0]["id"].as_str().unwrap();

    let body =
        parse_response_body(app.send(get_request("/api/v1/notifications/pending")).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["notifications"][0]["id"], id);
    assert_eq!(body["notifications"][0]["title"], "Medication Reminder");
    assert_eq!(body["notifications"][0]["trigger"]["type"], "calendar");
    assert_eq!(body["notifications"][0]["trigger"]["repeats_daily"], true);
}

#[tokio::test]
async fn test_add_batch_with_scheduled_box_conflicts_atomically() {
    let app = create_test_app().await;
    add_medications(&app, json!([{ "time": "08:00", "boxNumber": 1 }])).await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": [
                { "time": "09:00", "boxNumber": 2 },
                { "time": "10:00", "boxNumber": 1 },
            ]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Nothing from the rejected batch was stored.
    let body = parse_response_body(app.send(get_request("/api/v1/medications")).await).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_add_batch_with_duplicate_box_conflicts() {
    let app = create_test_app().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": [
                { "time": "08:00", "boxNumber": 3 },
                { "time": "20:00", "boxNumber": 3 },
            ]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_invalid_entries_rejected() {
    let app = create_test_app().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": [{ "time": "08:00", "boxNumber": 0 }] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "entries[0].box_number");

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": [] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/medications",
            json!({ "entries": [{ "time": "25:00", "boxNumber": 1 }] }),
        ))
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_update_entry() {
    let app = create_test_app().await;
    let added = add_medications(&app, json!([{ "time": "08:00", "boxNumber": 1 }])).await;
    let id = added[0]["id"].as_str().unwrap();

    let response = app
        .send(json_request(
            Method::PUT,
            &format!("/api/v1/medications/{}", id),
            json!({ "time": "09:15", "boxNumber": 4 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["id"], id);
    assert_eq!(body["time"], "09:15");
    assert_eq!(body["boxNumber"], 4);

    let pending =
        parse_response_body(app.send(get_request("/api/v1/notifications/pending")).await).await;
    assert_eq!(pending["total"], 1);
    assert_eq!(
        pending["notifications"][0]["body"],
        "Time to take your medication from Box 4."
    );
}

#[tokio::test]
async fn test_update_to_taken_box_conflicts() {
    let app = create_test_app().await;
    let added = add_medications(
        &app,
        json!([
            { "time": "08:00", "boxNumber": 1 },
            { "time": "20:00", "boxNumber": 2 },
        ]),
    )
    .await;
    let id = added[0]["id"].as_str().unwrap();

    let response = app
        .send(json_request(
            Method::PUT,
            &format!("/api/v1/medications/{}", id),
            json!({ "time": "08:00", "boxNumber": 2 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_keeping_own_box_succeeds() {
    let app = create_test_app().await;
    let added = add_medications(&app, json!([{ "time": "08:00", "boxNumber": 1 }])).await;
    let id = added[0]["id"].as_str().unwrap();

    let response = app
        .send(json_request(
            Method::PUT,
            &format!("/api/v1/medications/{}", id),
            json!({ "time": "07:45", "boxNumber": 1 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_entry_not_found() {
    let app = create_test_app().await;
    let response = app
        .send(json_request(
            Method::PUT,
            "/api/v1/medications/00000000-0000-0000-0000-000000000000",
            json!({ "time": "08:00", "boxNumber": 1 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_entry_cancels_reminder() {
    let app = create_test_app().await;
    let added = add_medications(&app, json!([{ "time": "08:00", "boxNumber": 1 }])).await;
    let id = added[0]["id"].as_str().unwrap();

    let response = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/v1/medications/{}", id),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = parse_response_body(app.send(get_request("/api/v1/medications")).await).await;
    assert_eq!(body["total"], 0);
    let pending =
        parse_response_body(app.send(get_request("/api/v1/notifications/pending")).await).await;
    assert_eq!(pending["total"], 0);

    let response = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/v1/medications/{}", id),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_boxes() {
    let app = create_test_app().await;
    let added = add_medications(
        &app,
        json!([
            { "time": "08:00", "boxNumber": 1 },
            { "time": "20:00", "boxNumber": 3 },
        ]),
    )
    .await;
    let first = added[0]["id"].as_str().unwrap();

    let body = parse_response_body(
        app.send(get_request("/api/v1/medications/available-boxes"))
            .await,
    )
    .await;
    assert_eq!(body["boxes"], json!([2, 4, 5, 6, 7, 8, 9, 10]));

    let body = parse_response_body(
        app.send(get_request(&format!(
            "/api/v1/medications/available-boxes?excluding={}&staged=2,4",
            first
        )))
        .await,
    )
    .await;
    assert_eq!(body["boxes"], json!([1, 5, 6, 7, 8, 9, 10]));
}

#[tokio::test]
async fn test_available_boxes_invalid_staged_rejected() {
    let app = create_test_app().await;
    let response = app
        .send(get_request("/api/v1/medications/available-boxes?staged=1,x"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_entries_and_reminders_restored_after_restart() {
    let app = create_test_app().await;
    let added = add_medications(&app, json!([{ "time": "21:00", "boxNumber": 6 }])).await;

    let restarted = create_test_app_with_pool(app.pool.clone()).await;
    let body = parse_response_body(restarted.send(get_request("/api/v1/medications")).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["medications"][0]["id"], added[0]["id"]);
    assert_eq!(body["medications"][0]["time"], "21:00");

    let pending = parse_response_body(
        restarted
            .send(get_request("/api/v1/notifications/pending"))
            .await,
    )
    .await;
    assert_eq!(pending["total"], 1);
}
