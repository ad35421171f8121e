use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::FixedClock;
use infrastructure::InMemoryTodoRepository;
use serde_json::{json, Value};
use todo_api::{app_with_state, AppState};
use tower::ServiceExt; // for `oneshot`

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 6, 30, 0).unwrap()
}

fn test_app() -> Router {
    let state = AppState::new(
        Arc::new(InMemoryTodoRepository::new()),
        Arc::new(FixedClock::new(fixed_now())),
    );
    app_with_state(state)
}

fn days_from_now(days: i64) -> String {
    (fixed_now() + Duration::days(days))
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_then_get_returns_same_representation() {
    // Arrange
    let app = test_app();
    let deadline = days_from_now(3);

    // Act
    let (status, created) = call(
        &app,
        "POST",
        "/api/v1/todos",
        Some(json!({
            "title": "Submit assignment",
            "description": "chapter 4",
            "deadline_at": deadline,
        })),
    )
    .await;
    let (get_status, fetched) = call(&app, "GET", "/api/v1/todos/1", None).await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(get_status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(created["deadline_at"], json!(deadline));
    assert_eq!(created["created_at"], json!("2024-05-10T06:30:00"));
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    // Arrange
    let app = test_app();
    call(
        &app,
        "POST",
        "/api/v1/todos",
        Some(json!({"title": "Read paper", "description": "section 2"})),
    )
    .await;

    // Act
    let (status, updated) = call(&app, "PUT", "/api/v1/todos/1", Some(json!({"completed": true}))).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Read paper");
    assert_eq!(updated["description"], "section 2");
    assert_eq!(updated["completed"], true);
    let (_, fetched) = call(&app, "GET", "/api/v1/todos/1", None).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn update_can_clear_nullable_fields() {
    let app = test_app();
    call(
        &app,
        "POST",
        "/api/v1/todos",
        Some(json!({"title": "x", "description": "y", "deadline_at": days_from_now(1)})),
    )
    .await;

    let (status, updated) = call(
        &app,
        "PUT",
        "/api/v1/todos/1",
        Some(json!({"description": null, "deadline_at": null})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], Value::Null);
    assert_eq!(updated["deadline_at"], Value::Null);
}

#[tokio::test]
async fn invalid_update_body_wins_over_missing_id() {
    let app = test_app();

    let (status, body) = call(&app, "PUT", "/api/v1/todos/999", Some(json!({"id": 3}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "request contains unexpected keys: id"}));
}

#[tokio::test]
async fn update_with_valid_body_on_missing_id_returns_404() {
    let app = test_app();

    let (status, body) = call(&app, "PUT", "/api/v1/todos/999", Some(json!({"title": "t"}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Todo not found"}));
}

#[tokio::test]
async fn update_with_empty_object_is_malformed() {
    let app = test_app();
    call(&app, "POST", "/api/v1/todos", Some(json!({"title": "x"}))).await;

    let (status, body) = call(&app, "PUT", "/api/v1/todos/1", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "request missing json"}));
}

#[tokio::test]
async fn list_without_params_returns_everything() {
    let app = test_app();
    for (title, completed) in [("a", false), ("b", true), ("c", false)] {
        call(
            &app,
            "POST",
            "/api/v1/todos",
            Some(json!({"title": title, "completed": completed})),
        )
        .await;
    }

    let (status, body) = call(&app, "GET", "/api/v1/todos", None).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn list_with_completed_flag() {
    let app = test_app();
    for (title, completed) in [("open", false), ("done", true)] {
        call(
            &app,
            "POST",
            "/api/v1/todos",
            Some(json!({"title": title, "completed": completed})),
        )
        .await;
    }

    // 空でない値はすべて「完了済みのみ」
    for raw in ["true", "false", "0", "no"] {
        let (_, only_done) = call(&app, "GET", &format!("/api/v1/todos?completed={raw}"), None).await;

        assert_eq!(only_done.as_array().unwrap().len(), 1, "{raw}");
        assert_eq!(only_done[0]["title"], "done");
    }
    let (_, empty_flag) = call(&app, "GET", "/api/v1/todos?completed=", None).await;
    assert_eq!(empty_flag.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_with_window_limits_by_deadline() {
    // Arrange: 締切が 0 日後・5 日後・10 日後
    let app = test_app();
    for days in [0, 5, 10] {
        call(
            &app,
            "POST",
            "/api/v1/todos",
            Some(json!({"title": format!("due in {days}"), "deadline_at": days_from_now(days)})),
        )
        .await;
    }
    call(&app, "POST", "/api/v1/todos", Some(json!({"title": "someday"}))).await;

    // Act
    let (status, body) = call(&app, "GET", "/api/v1/todos?window=6", None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["due in 0", "due in 5"]);
}

#[tokio::test]
async fn list_with_invalid_window_returns_400() {
    let app = test_app();

    for raw in ["abc", "-1", "1.5"] {
        let (status, body) = call(&app, "GET", &format!("/api/v1/todos?window={raw}"), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
        assert_eq!(
            body,
            json!({"error": format!("window is not a valid integer: {raw}")})
        );
    }
}

#[tokio::test]
async fn delete_unknown_id_twice_returns_empty_object() {
    let app = test_app();

    for _ in 0..2 {
        let (status, body) = call(&app, "DELETE", "/api/v1/todos/12345", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }
}

#[tokio::test]
async fn client_supplied_id_is_honoured() {
    let app = test_app();

    let (status, created) = call(&app, "POST", "/api/v1/todos", Some(json!({"id": 42, "title": "x"}))).await;
    let (_, next) = call(&app, "POST", "/api/v1/todos", Some(json!({"title": "y"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 42);
    assert_eq!(next["id"], 43);
}
