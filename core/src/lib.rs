//! Client core for the Poptato task service.
//!
//! # Overview
//! Keeps the "Today" list of the current session in sync with the Poptato
//! API under optimistic updates, and turns drag gestures into a persisted
//! order. The HTTP layer is split the host-does-IO way: `PoptatoClient`
//! builds and parses plain-data requests, a `Transport` executes them.
//!
//! # Design
//! - `TodayListStore` is a single-writer actor; `TodayListHandle` is its
//!   cloneable front door.
//! - `ReorderController` is a pure state machine over any `Vec`.
//! - Stores depend on the `TodoRemote` trait, so tests swap in fakes and the
//!   mock server covers the wire format end to end.
//! - Session flags and the calendar date are injected (`SessionState`,
//!   `Clock`) rather than read from globals.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod remote;
pub mod reorder;
pub mod session;
pub mod store;
pub mod types;
pub mod yesterday;

pub use client::PoptatoClient;
pub use config::{load_config, load_config_from, ClientConfig};
pub use error::{ApiError, StoreClosed};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use remote::{ReqwestTransport, TodoRemote, TodoService, Transport};
pub use reorder::{DragState, DropOutcome, ReorderController};
pub use session::{Clock, FixedClock, SessionState, SystemClock};
pub use store::{TodayListHandle, TodayListStore, TodayView, TODAY_PAGE_SIZE};
pub use types::{
    days_until, DragAndDropRequest, TodayItem, TodayListResponse, TodayStatus, TodoId, TodoIdRequest,
    UpdateDeadlineRequest, YesterdayItem, YesterdayListResponse, TODAY_ORDER_TYPE,
};
pub use yesterday::YesterdayReview;
