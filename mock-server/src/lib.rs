use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodayStatus {
    Incomplete,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTodo {
    pub todo_id: i64,
    pub content: String,
    pub today_status: TodayStatus,
    pub is_bookmark: bool,
    pub dday: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub is_repeat: bool,
}

impl TodayTodo {
    pub fn new(todo_id: i64, content: &str) -> Self {
        Self {
            todo_id,
            content: content.to_string(),
            today_status: TodayStatus::Incomplete,
            is_bookmark: false,
            dday: None,
            deadline: None,
            is_repeat: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.today_status = TodayStatus::Completed;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayTodo {
    pub todo_id: i64,
    pub content: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayListBody {
    pub todays: Vec<TodayTodo>,
    pub total_page_count: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayListBody {
    pub yesterdays: Vec<YesterdayTodo>,
    pub total_page_count: u32,
}

#[derive(Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    50
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoIdBody {
    pub todo_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragAndDropBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub todo_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct DeadlineBody {
    pub deadline: Option<NaiveDate>,
}

/// Everything the server knows. `todays` is kept in display order.
#[derive(Clone, Debug, Default)]
pub struct MockState {
    pub todays: Vec<TodayTodo>,
    pub yesterdays: Vec<YesterdayTodo>,
    /// Todos swiped to tomorrow, in swipe order.
    pub tomorrows: Vec<TodayTodo>,
}

impl MockState {
    pub fn with_todays(todays: Vec<TodayTodo>) -> Self {
        Self {
            todays,
            ..Self::default()
        }
    }

    /// Sample data for running the binary locally.
    pub fn demo() -> Self {
        Self {
            todays: vec![
                TodayTodo::new(1, "Plan the week"),
                TodayTodo::new(2, "Reply to Mina"),
                TodayTodo::new(3, "Water the plants").completed(),
            ],
            yesterdays: vec![YesterdayTodo {
                todo_id: 4,
                content: "Finish the slides".to_string(),
            }],
            tomorrows: Vec::new(),
        }
    }

    fn today_mut(&mut self, todo_id: i64) -> Result<&mut TodayTodo, StatusCode> {
        self.todays
            .iter_mut()
            .find(|t| t.todo_id == todo_id)
            .ok_or(StatusCode::NOT_FOUND)
    }
}

pub type Db = Arc<RwLock<MockState>>;

pub fn app() -> Router {
    app_with(MockState::default())
}

pub fn app_with(state: MockState) -> Router {
    router(Arc::new(RwLock::new(state)))
}

/// Router over shared state, so tests can inspect the server side.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/todays", get(list_todays))
        .route("/yesterdays", get(list_yesterdays))
        .route("/swipe", patch(swipe))
        .route("/drag-and-drop", patch(drag_and_drop))
        .route("/todo/{id}", delete(delete_todo))
        .route("/todo/{id}/achieve", patch(toggle_completion))
        .route("/todo/{id}/bookmark", patch(toggle_bookmark))
        .route("/todo/{id}/deadline", patch(update_deadline))
        .route("/todo/{id}/repeat", patch(toggle_repeat))
        .with_state(db)
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, router(db)).await
}

fn page_of<T: Clone>(items: &[T], paging: &Paging) -> (Vec<T>, u32) {
    let size = paging.size.max(1);
    let pages = u32::try_from(items.len().div_ceil(size)).unwrap_or(u32::MAX);
    let page = items
        .iter()
        .skip(paging.page.saturating_mul(size))
        .take(size)
        .cloned()
        .collect();
    (page, pages)
}

async fn list_todays(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<TodayListBody> {
    let state = db.read().await;
    let (todays, total_page_count) = page_of(&state.todays, &paging);
    Json(TodayListBody {
        todays,
        total_page_count,
    })
}

async fn list_yesterdays(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<YesterdayListBody> {
    let state = db.read().await;
    let (yesterdays, total_page_count) = page_of(&state.yesterdays, &paging);
    Json(YesterdayListBody {
        yesterdays,
        total_page_count,
    })
}

async fn swipe(State(db): State<Db>, Json(input): Json<TodoIdBody>) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    let index = state
        .todays
        .iter()
        .position(|t| t.todo_id == input.todo_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let todo = state.todays.remove(index);
    debug!(todo_id = todo.todo_id, "swiped to tomorrow");
    state.tomorrows.push(todo);
    Ok(StatusCode::OK)
}

/// Toggles a today todo, or completes (and clears) a yesterday one.
async fn toggle_completion(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    if let Ok(todo) = state.today_mut(id) {
        todo.today_status = match todo.today_status {
            TodayStatus::Incomplete => TodayStatus::Completed,
            TodayStatus::Completed => TodayStatus::Incomplete,
        };
        return Ok(StatusCode::OK);
    }
    let before = state.yesterdays.len();
    state.yesterdays.retain(|t| t.todo_id != id);
    if state.yesterdays.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::OK)
}

/// Listed ids come first in the given order, unlisted incomplete todos
/// follow, completed todos keep the tail.
async fn drag_and_drop(State(db): State<Db>, Json(input): Json<DragAndDropBody>) -> Result<StatusCode, StatusCode> {
    if input.kind != "TODAY" {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut state = db.write().await;
    let mut reordered = Vec::with_capacity(state.todays.len());
    for id in &input.todo_ids {
        let todo = state
            .todays
            .iter()
            .find(|t| t.todo_id == *id && t.today_status == TodayStatus::Incomplete)
            .ok_or(StatusCode::NOT_FOUND)?;
        reordered.push(todo.clone());
    }
    let rest = state
        .todays
        .iter()
        .filter(|t| t.today_status == TodayStatus::Incomplete && !input.todo_ids.contains(&t.todo_id));
    reordered.extend(rest.cloned());
    let completed = state
        .todays
        .iter()
        .filter(|t| t.today_status == TodayStatus::Completed);
    reordered.extend(completed.cloned());
    state.todays = reordered;
    Ok(StatusCode::OK)
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    let before = state.todays.len() + state.yesterdays.len();
    state.todays.retain(|t| t.todo_id != id);
    state.yesterdays.retain(|t| t.todo_id != id);
    if state.todays.len() + state.yesterdays.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_bookmark(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    let todo = state.today_mut(id)?;
    todo.is_bookmark = !todo.is_bookmark;
    Ok(StatusCode::OK)
}

async fn update_deadline(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<DeadlineBody>,
) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    let todo = state.today_mut(id)?;
    let today = Local::now().date_naive();
    todo.deadline = input.deadline;
    todo.dday = input.deadline.map(|d| d.signed_duration_since(today).num_days());
    Ok(StatusCode::OK)
}

async fn toggle_repeat(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    let todo = state.today_mut(id)?;
    todo.is_repeat = !todo.is_repeat;
    Ok(StatusCode::OK)
}
