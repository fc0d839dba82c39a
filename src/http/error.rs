use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Every way a request can fail. Returned only when the call was made with
/// `throw_error`; otherwise the client reports the failure and resolves `None`.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
  /// Superseded by a newer call with the same fingerprint
  #[error("{message}")]
  Duplicate { message: String },

  #[error("{message}")]
  Cancelled { message: String },

  #[error("request timed out after {}ms", after.as_millis())]
  TimedOut { after: Duration },

  #[error("{message}")]
  Transport { message: String, connect: bool },

  #[error("HTTP error! status: {status}")]
  HttpStatus { status: u16 },

  /// The envelope reported a non-200 business code
  #[error("{message}")]
  Business {
    code: i64,
    message: String,
    data: Option<Value>,
  },

  /// 304 arrived but there was nothing cached to serve
  #[error("304 Not Modified but no cache available for {key}")]
  StaleCachePrecondition { key: String },

  #[error("invalid response: {message}")]
  InvalidResponse { message: String },

  #[error("invalid request: {message}")]
  InvalidRequest { message: String },

  #[error("{message}")]
  Io { message: String },
}

impl HttpError {
  /// HTTP status or business code; -1 for client-side failures.
  pub fn code(&self) -> i64 {
    match self {
      HttpError::HttpStatus { status } => i64::from(*status),
      HttpError::Business { code, .. } => *code,
      HttpError::StaleCachePrecondition { .. } => 304,
      _ => -1,
    }
  }

  /// Stable tag for matching on the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      HttpError::Duplicate { .. } => "duplicate",
      HttpError::Cancelled { .. } => "cancelled",
      HttpError::TimedOut { .. } => "timeout",
      HttpError::Transport { .. } => "transport",
      HttpError::HttpStatus { .. } => "http_status",
      HttpError::Business { .. } => "business",
      HttpError::StaleCachePrecondition { .. } => "stale_cache",
      HttpError::InvalidResponse { .. } => "invalid_response",
      HttpError::InvalidRequest { .. } => "invalid_request",
      HttpError::Io { .. } => "io",
    }
  }

  /// Transport-level failures are the only retryable kind.
  pub fn is_retryable(&self) -> bool {
    matches!(self, HttpError::TimedOut { .. } | HttpError::Transport { .. })
  }
}
