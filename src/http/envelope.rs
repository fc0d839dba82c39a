use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Business code that marks a successful call, independent of HTTP status.
pub const SUCCESS_CODE: i64 = 200;

/// The `{code, message, data}` wrapper every API response uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
  pub code: i64,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub data: T,
}

impl<T> ApiResponse<T> {
  pub fn is_success(&self) -> bool {
    self.code == SUCCESS_CODE
  }

  /// The server message, or `fallback` when the server sent none.
  pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
    if self.message.trim().is_empty() {
      fallback
    } else {
      &self.message
    }
  }
}
