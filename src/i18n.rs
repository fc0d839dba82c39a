//! Localized user-facing messages for the HTTP client.

use serde::Deserialize;

/// Supported display languages.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  En,
  #[default]
  Zh,
}

impl Locale {
  /// Parse a language tag such as `en`, `en-US` or `zh_CN`.
  pub fn from_tag(tag: &str) -> Option<Self> {
    let primary = tag
      .split(['-', '_'])
      .next()
      .unwrap_or_default()
      .to_ascii_lowercase();
    match primary.as_str() {
      "en" => Some(Locale::En),
      "zh" => Some(Locale::Zh),
      _ => None,
    }
  }

  /// Resolve a message key to display text.
  pub fn text(self, key: MessageKey) -> &'static str {
    match self {
      Locale::En => en(key),
      Locale::Zh => zh(key),
    }
  }
}

/// Message keys of the `network` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
  DuplicateRequest,
  RequestTimeout,
  OperationSuccess,
  OperationFailed,
  RequestCanceled,
  RequestSendFailed,
  Unauthorized,
  Forbidden,
  NotFound,
  ServerError,
  NetworkError,
  NetworkConnectionFailed,
  LoadingText,
}

fn en(key: MessageKey) -> &'static str {
  match key {
    MessageKey::DuplicateRequest => "Repeat requests, automatically cancel",
    MessageKey::RequestTimeout => "Request timeout",
    MessageKey::OperationSuccess => "Operation is successful",
    MessageKey::OperationFailed => "Operation failed",
    MessageKey::RequestCanceled => "Request canceled",
    MessageKey::RequestSendFailed => "Request send failed",
    MessageKey::Unauthorized => "Unauthorized, please log in again",
    MessageKey::Forbidden => "Access denied",
    MessageKey::NotFound => "The requested resource does not exist",
    MessageKey::ServerError => "Internal server error",
    MessageKey::NetworkError => "Network exception. Please try again later.",
    MessageKey::NetworkConnectionFailed => {
      "The network connection failed. Please check the network"
    }
    MessageKey::LoadingText => "Loading...",
  }
}

fn zh(key: MessageKey) -> &'static str {
  match key {
    MessageKey::DuplicateRequest => "重复请求，已自动取消",
    MessageKey::RequestTimeout => "请求超时",
    MessageKey::OperationSuccess => "操作成功",
    MessageKey::OperationFailed => "操作失败",
    MessageKey::RequestCanceled => "请求被取消",
    MessageKey::RequestSendFailed => "请求发送失败",
    MessageKey::Unauthorized => "未授权，请重新登录",
    MessageKey::Forbidden => "拒绝访问",
    MessageKey::NotFound => "请求的资源不存在",
    MessageKey::ServerError => "服务器内部错误",
    MessageKey::NetworkError => "网络异常，请稍后重试",
    MessageKey::NetworkConnectionFailed => "网络连接失败，请检查网络",
    MessageKey::LoadingText => "加载中...",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_tag_accepts_regions() {
    assert_eq!(Locale::from_tag("en-US"), Some(Locale::En));
    assert_eq!(Locale::from_tag("zh_CN"), Some(Locale::Zh));
    assert_eq!(Locale::from_tag("ZH"), Some(Locale::Zh));
    assert_eq!(Locale::from_tag("fr"), None);
    assert_eq!(Locale::from_tag(""), None);
  }

  #[test]
  fn test_default_locale_is_chinese() {
    assert_eq!(Locale::default(), Locale::Zh);
  }

  #[test]
  fn test_text_lookup() {
    assert_eq!(Locale::En.text(MessageKey::LoadingText), "Loading...");
    assert_eq!(Locale::Zh.text(MessageKey::RequestTimeout), "请求超时");
  }
}
