use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, Db, MockState, TodayListBody, TodayStatus, TodayTodo, YesterdayListBody, YesterdayTodo};
use tokio::sync::RwLock;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn bare_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn seeded() -> Db {
    Arc::new(RwLock::new(MockState {
        todays: vec![
            TodayTodo::new(1, "First"),
            TodayTodo::new(2, "Second"),
            TodayTodo::new(3, "Third").completed(),
        ],
        yesterdays: vec![YesterdayTodo {
            todo_id: 9,
            content: "Old".to_string(),
        }],
        tomorrows: Vec::new(),
    }))
}

async fn send(db: &Db, request: Request<String>) -> axum::response::Response {
    router(Arc::clone(db)).oneshot(request).await.unwrap()
}

async fn today_ids(db: &Db) -> Vec<i64> {
    db.read().await.todays.iter().map(|t| t.todo_id).collect()
}

// --- list ---

#[tokio::test]
async fn list_todays_empty() {
    let resp = app().oneshot(bare_request("GET", "/todays?page=0&size=50")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TodayListBody = body_json(resp).await;
    assert!(body.todays.is_empty());
    assert_eq!(body.total_page_count, 0);
}

#[tokio::test]
async fn list_todays_pages_in_order() {
    let db = seeded();
    let resp = send(&db, bare_request("GET", "/todays?page=0&size=2")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TodayListBody = body_json(resp).await;
    let ids: Vec<i64> = body.todays.iter().map(|t| t.todo_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(body.total_page_count, 2);
}

#[tokio::test]
async fn list_todays_far_page_is_empty() {
    let db = seeded();
    let uri = format!("/todays?page={}&size=50", usize::MAX);
    let resp = send(&db, bare_request("GET", &uri)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TodayListBody = body_json(resp).await;
    assert!(body.todays.is_empty());
    assert_eq!(body.total_page_count, 1);
}

#[tokio::test]
async fn list_yesterdays() {
    let db = seeded();
    let resp = send(&db, bare_request("GET", "/yesterdays?page=0&size=15")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: YesterdayListBody = body_json(resp).await;
    assert_eq!(body.yesterdays.len(), 1);
    assert_eq!(body.yesterdays[0].content, "Old");
}

// --- completion ---

#[tokio::test]
async fn achieve_toggles_today_status() {
    let db = seeded();
    let resp = send(&db, bare_request("PATCH", "/todo/1/achieve")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(db.read().await.todays[0].today_status, TodayStatus::Completed);

    send(&db, bare_request("PATCH", "/todo/1/achieve")).await;
    assert_eq!(db.read().await.todays[0].today_status, TodayStatus::Incomplete);
}

#[tokio::test]
async fn achieve_clears_yesterday_todo() {
    let db = seeded();
    let resp = send(&db, bare_request("PATCH", "/todo/9/achieve")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(db.read().await.yesterdays.is_empty());
}

#[tokio::test]
async fn achieve_unknown_returns_404() {
    let resp = app().oneshot(bare_request("PATCH", "/todo/42/achieve")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- swipe ---

#[tokio::test]
async fn swipe_moves_todo_to_tomorrow() {
    let db = seeded();
    let resp = send(&db, json_request("PATCH", "/swipe", r#"{"todoId":2}"#)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(today_ids(&db).await, vec![1, 3]);
    assert_eq!(db.read().await.tomorrows[0].todo_id, 2);
}

#[tokio::test]
async fn swipe_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("PATCH", "/swipe", r#"{"id":2}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- drag and drop ---

#[tokio::test]
async fn drag_and_drop_reorders_incomplete_and_keeps_completed_last() {
    let db = seeded();
    let resp = send(
        &db,
        json_request("PATCH", "/drag-and-drop", r#"{"type":"TODAY","todoIds":[2,1]}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(today_ids(&db).await, vec![2, 1, 3]);
}

#[tokio::test]
async fn drag_and_drop_rejects_completed_ids() {
    let db = seeded();
    let resp = send(
        &db,
        json_request("PATCH", "/drag-and-drop", r#"{"type":"TODAY","todoIds":[3,1]}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(today_ids(&db).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn drag_and_drop_rejects_other_lists() {
    let db = seeded();
    let resp = send(
        &db,
        json_request("PATCH", "/drag-and-drop", r#"{"type":"BACKLOG","todoIds":[2,1]}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- item edits ---

#[tokio::test]
async fn bookmark_and_repeat_toggle() {
    let db = seeded();
    assert_eq!(send(&db, bare_request("PATCH", "/todo/2/bookmark")).await.status(), StatusCode::OK);
    assert_eq!(send(&db, bare_request("PATCH", "/todo/2/repeat")).await.status(), StatusCode::OK);

    let state = db.read().await;
    assert!(state.todays[1].is_bookmark);
    assert!(state.todays[1].is_repeat);
}

#[tokio::test]
async fn deadline_sets_and_clears() {
    let db = seeded();
    let resp = send(
        &db,
        json_request("PATCH", "/todo/1/deadline", r#"{"deadline":"2030-01-01"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    {
        let state = db.read().await;
        assert_eq!(state.todays[0].deadline.unwrap().to_string(), "2030-01-01");
        assert!(state.todays[0].dday.unwrap() > 0);
    }

    send(&db, json_request("PATCH", "/todo/1/deadline", r#"{"deadline":null}"#)).await;
    let state = db.read().await;
    assert!(state.todays[0].deadline.is_none());
    assert!(state.todays[0].dday.is_none());
}

#[tokio::test]
async fn deadline_bad_date_returns_422() {
    let db = seeded();
    let resp = send(
        &db,
        json_request("PATCH", "/todo/1/deadline", r#"{"deadline":"01/15/2024"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- delete ---

#[tokio::test]
async fn delete_todo_returns_204() {
    let db = seeded();
    let resp = send(&db, bare_request("DELETE", "/todo/1")).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(today_ids(&db).await, vec![2, 3]);
}

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app().oneshot(bare_request("DELETE", "/todo/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_returns_400() {
    let resp = app().oneshot(bare_request("PATCH", "/todo/abc/bookmark")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
