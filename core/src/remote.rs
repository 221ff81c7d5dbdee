//! Async seams between the stores and the Poptato API.
//!
//! `Transport` executes one plain-data `HttpRequest`. `TodoService` pairs a
//! transport with the stateless `PoptatoClient` and implements `TodoRemote`,
//! the operation-level trait the stores are written against.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::client::PoptatoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{TodayListResponse, TodoId, YesterdayListResponse};

/// Executes HTTP round-trips. Non-2xx statuses are returned as data.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Remote operations consumed by `TodayListStore` and `YesterdayReview`.
#[async_trait]
pub trait TodoRemote: Send + Sync {
    async fn today_list(&self, page: u32, size: u32) -> Result<TodayListResponse, ApiError>;
    async fn yesterday_list(&self, page: u32, size: u32) -> Result<YesterdayListResponse, ApiError>;
    async fn swipe(&self, todo_id: TodoId) -> Result<(), ApiError>;
    async fn toggle_completion(&self, todo_id: TodoId) -> Result<(), ApiError>;
    async fn drag_and_drop(&self, kind: &str, todo_ids: &[TodoId]) -> Result<(), ApiError>;
    async fn delete_todo(&self, todo_id: TodoId) -> Result<(), ApiError>;
    async fn toggle_bookmark(&self, todo_id: TodoId) -> Result<(), ApiError>;
    async fn update_deadline(&self, todo_id: TodoId, deadline: Option<NaiveDate>) -> Result<(), ApiError>;
    async fn toggle_repeat(&self, todo_id: TodoId) -> Result<(), ApiError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        debug!(method = request.method.as_str(), path = %request.path, "sending request");

        let mut builder = self.http.request(method, &request.path);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::TransportError(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// `TodoRemote` over any `Transport`.
#[derive(Debug, Clone)]
pub struct TodoService<T> {
    client: PoptatoClient,
    transport: T,
}

impl<T: Transport> TodoService<T> {
    pub fn new(client: PoptatoClient, transport: T) -> Self {
        Self { client, transport }
    }
}

impl TodoService<ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(PoptatoClient::new(&config.base_url), ReqwestTransport::default())
    }
}

#[async_trait]
impl<T: Transport> TodoRemote for TodoService<T> {
    async fn today_list(&self, page: u32, size: u32) -> Result<TodayListResponse, ApiError> {
        let response = self.transport.execute(self.client.build_today_list(page, size)).await?;
        self.client.parse_today_list(response)
    }

    async fn yesterday_list(&self, page: u32, size: u32) -> Result<YesterdayListResponse, ApiError> {
        let response = self.transport.execute(self.client.build_yesterday_list(page, size)).await?;
        self.client.parse_yesterday_list(response)
    }

    async fn swipe(&self, todo_id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_swipe(todo_id)?).await?;
        self.client.parse_ack(response)
    }

    async fn toggle_completion(&self, todo_id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_toggle_completion(todo_id)).await?;
        self.client.parse_ack(response)
    }

    async fn drag_and_drop(&self, kind: &str, todo_ids: &[TodoId]) -> Result<(), ApiError> {
        let request = self.client.build_drag_and_drop(kind, todo_ids)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_ack(response)
    }

    async fn delete_todo(&self, todo_id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_todo(todo_id)).await?;
        self.client.parse_ack(response)
    }

    async fn toggle_bookmark(&self, todo_id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_toggle_bookmark(todo_id)).await?;
        self.client.parse_ack(response)
    }

    async fn update_deadline(&self, todo_id: TodoId, deadline: Option<NaiveDate>) -> Result<(), ApiError> {
        let request = self.client.build_update_deadline(todo_id, deadline)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_ack(response)
    }

    async fn toggle_repeat(&self, todo_id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_toggle_repeat(todo_id)).await?;
        self.client.parse_ack(response)
    }
}
