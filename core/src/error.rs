//! Error types for the Poptato client core.
//!
//! # Design
//! `ApiError` is the one "remote operation failed" kind: every transport,
//! status and decoding failure lands here. `NotFound` keeps its own variant
//! because a missing todo is the common server-side rejection for stale ids.

use thiserror::Error;

/// Errors returned by request builders, response parsers and transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404, the referenced todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    TransportError(String),
}

/// Returned by store handles once the owning actor has stopped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("today list store is no longer running")]
pub struct StoreClosed;
