//! HTTP client for the REST backend.
//!
//! This module provides a request orchestrator that:
//! - Cancels an in-flight request when an identical one is issued
//! - Caches envelope payloads in memory with a per-entry TTL
//! - Retries transport failures after a fixed delay
//! - Keeps a reference-counted loading indicator balanced across calls

mod cache;
mod client;
mod dedup;
mod envelope;
mod error;
mod fingerprint;
mod hooks;
mod loading;
mod options;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, ResponseCache};
pub use client::{ClientSettings, HttpClient};
pub use dedup::{CancelHandle, CancelReason, PendingRequests};
pub use envelope::{ApiResponse, SUCCESS_CODE};
pub use error::HttpError;
pub use fingerprint::{build_url, Fingerprint};
pub use hooks::{ConsoleNotifier, Navigator, Notifier, TracingNavigator, TracingNotifier};
pub use loading::{LoadingCounter, LoadingGuard};
pub use options::{
  default_validate_status, CacheConfig, CacheOption, CacheStrategy, RequestBody, RequestOptions,
  StatusPredicate,
};
pub use transport::{
  ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
