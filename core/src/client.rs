//! Stateless HTTP request builder and response parser for the Poptato API.
//!
//! # Design
//! `PoptatoClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Mutations answer with an empty or ignorable body, so they
//! share `parse_ack`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    DragAndDropRequest, TodayListResponse, TodoId, TodoIdRequest, UpdateDeadlineRequest,
    YesterdayListResponse,
};

/// Synchronous, stateless client for the Poptato API.
#[derive(Debug, Clone)]
pub struct PoptatoClient {
    base_url: String,
}

impl PoptatoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_today_list(&self, page: u32, size: u32) -> HttpRequest {
        self.bare(HttpMethod::Get, format!("/todays?page={page}&size={size}"))
    }

    pub fn build_yesterday_list(&self, page: u32, size: u32) -> HttpRequest {
        self.bare(HttpMethod::Get, format!("/yesterdays?page={page}&size={size}"))
    }

    pub fn build_swipe(&self, todo_id: TodoId) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Patch, "/swipe".to_string(), &TodoIdRequest { todo_id })
    }

    pub fn build_toggle_completion(&self, todo_id: TodoId) -> HttpRequest {
        self.bare(HttpMethod::Patch, format!("/todo/{todo_id}/achieve"))
    }

    pub fn build_drag_and_drop(&self, kind: &str, todo_ids: &[TodoId]) -> Result<HttpRequest, ApiError> {
        let input = DragAndDropRequest {
            kind: kind.to_string(),
            todo_ids: todo_ids.to_vec(),
        };
        self.with_json(HttpMethod::Patch, "/drag-and-drop".to_string(), &input)
    }

    pub fn build_delete_todo(&self, todo_id: TodoId) -> HttpRequest {
        self.bare(HttpMethod::Delete, format!("/todo/{todo_id}"))
    }

    pub fn build_toggle_bookmark(&self, todo_id: TodoId) -> HttpRequest {
        self.bare(HttpMethod::Patch, format!("/todo/{todo_id}/bookmark"))
    }

    pub fn build_update_deadline(
        &self,
        todo_id: TodoId,
        deadline: Option<NaiveDate>,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(
            HttpMethod::Patch,
            format!("/todo/{todo_id}/deadline"),
            &UpdateDeadlineRequest { deadline },
        )
    }

    pub fn build_toggle_repeat(&self, todo_id: TodoId) -> HttpRequest {
        self.bare(HttpMethod::Patch, format!("/todo/{todo_id}/repeat"))
    }

    pub fn parse_today_list(&self, response: HttpResponse) -> Result<TodayListResponse, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_yesterday_list(&self, response: HttpResponse) -> Result<YesterdayListResponse, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Accept any 2xx answer to a mutation.
    pub fn parse_ack(&self, response: HttpResponse) -> Result<(), ApiError> {
        if response.is_success() {
            return Ok(());
        }
        check_status(&response, 200)
    }

    fn bare(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json<T: Serialize>(&self, method: HttpMethod, path: String, input: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
