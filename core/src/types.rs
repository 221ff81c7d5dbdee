//! Domain DTOs for the Poptato API.
//!
//! # Design
//! The wire format is camelCase JSON. The types are defined independently
//! from the mock-server crate; integration tests catch schema drift between
//! the two.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier the server assigns to a todo.
pub type TodoId = i64;

/// Order-persistence context for the today list.
pub const TODAY_ORDER_TYPE: &str = "TODAY";

/// Completion state of an item on the today list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodayStatus {
    Incomplete,
    Completed,
}

impl TodayStatus {
    pub fn toggled(self) -> Self {
        match self {
            TodayStatus::Incomplete => TodayStatus::Completed,
            TodayStatus::Completed => TodayStatus::Incomplete,
        }
    }
}

/// A todo as shown on the today list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodayItem {
    #[serde(rename = "todoId")]
    pub id: TodoId,
    pub content: String,
    #[serde(rename = "todayStatus")]
    pub status: TodayStatus,
    #[serde(default)]
    pub is_bookmark: bool,
    /// Days until the deadline, negative once it has passed.
    #[serde(default)]
    pub dday: Option<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub is_repeat: bool,
}

impl TodayItem {
    pub fn is_completed(&self) -> bool {
        self.status == TodayStatus::Completed
    }

    /// Set the deadline and recompute `dday` against `today`.
    pub fn set_deadline(&mut self, deadline: Option<NaiveDate>, today: NaiveDate) {
        self.deadline = deadline;
        self.dday = deadline.map(|d| days_until(d, today));
    }
}

/// Whole days from `today` to `deadline`.
pub fn days_until(deadline: NaiveDate, today: NaiveDate) -> i64 {
    deadline.signed_duration_since(today).num_days()
}

/// Body of `GET /todays`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodayListResponse {
    pub todays: Vec<TodayItem>,
    #[serde(default)]
    pub total_page_count: u32,
}

/// A todo left over from yesterday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayItem {
    #[serde(rename = "todoId")]
    pub id: TodoId,
    pub content: String,
}

/// Body of `GET /yesterdays`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayListResponse {
    pub yesterdays: Vec<YesterdayItem>,
    #[serde(default)]
    pub total_page_count: u32,
}

/// Request payload naming a single todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoIdRequest {
    pub todo_id: TodoId,
}

/// Request payload overwriting the server-side order of a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DragAndDropRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub todo_ids: Vec<TodoId>,
}

/// Request payload for a deadline change. `None` clears the deadline and is
/// sent as an explicit `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateDeadlineRequest {
    pub deadline: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn today_item_reads_wire_names() {
        let item: TodayItem = serde_json::from_str(
            r#"{"todoId":7,"content":"Write report","todayStatus":"COMPLETED","isBookmark":true,"dday":3,"deadline":"2024-01-13","isRepeat":false}"#,
        )
        .unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.status, TodayStatus::Completed);
        assert!(item.is_bookmark);
        assert_eq!(item.dday, Some(3));
        assert_eq!(item.deadline, Some(date("2024-01-13")));
    }

    #[test]
    fn today_item_tolerates_missing_optional_fields() {
        let item: TodayItem =
            serde_json::from_str(r#"{"todoId":1,"content":"a","todayStatus":"INCOMPLETE"}"#).unwrap();
        assert!(!item.is_bookmark);
        assert!(!item.is_repeat);
        assert!(item.deadline.is_none());
        assert!(item.dday.is_none());
    }

    #[test]
    fn set_deadline_recomputes_dday() {
        let mut item: TodayItem =
            serde_json::from_str(r#"{"todoId":1,"content":"a","todayStatus":"INCOMPLETE"}"#).unwrap();
        item.set_deadline(Some(date("2024-01-15")), date("2024-01-10"));
        assert_eq!(item.dday, Some(5));
        item.set_deadline(Some(date("2024-01-08")), date("2024-01-10"));
        assert_eq!(item.dday, Some(-2));
        item.set_deadline(None, date("2024-01-10"));
        assert_eq!(item.dday, None);
    }

    #[test]
    fn drag_and_drop_request_uses_type_key() {
        let body = serde_json::to_value(DragAndDropRequest {
            kind: TODAY_ORDER_TYPE.to_string(),
            todo_ids: vec![3, 1],
        })
        .unwrap();
        assert_eq!(body["type"], "TODAY");
        assert_eq!(body["todoIds"], serde_json::json!([3, 1]));
    }

    #[test]
    fn cleared_deadline_serializes_as_null() {
        let body = serde_json::to_value(UpdateDeadlineRequest { deadline: None }).unwrap();
        assert!(body.get("deadline").unwrap().is_null());
    }
}
