//! Per-call request configuration.

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether an HTTP status is acceptable.
pub type StatusPredicate = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Default status check: any 2xx, plus 304 Not Modified.
pub fn default_validate_status(status: u16) -> bool {
  (200..300).contains(&status) || status == 304
}

/// Whether a fresh cache hit short-circuits the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheStrategy {
  /// Serve a valid cache entry without touching the network
  #[default]
  CacheFirst,
  /// Always fetch; fall back to a valid cache entry if the network fails
  NetworkFirst,
}

/// Cache settings for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
  /// Entry lifetime; falls back to the client default when unset
  pub ttl: Option<Duration>,
  /// Custom cache key; defaults to the request fingerprint
  pub key: Option<String>,
  pub strategy: CacheStrategy,
}

impl CacheConfig {
  pub fn with_ttl(ttl: Duration) -> Self {
    Self {
      ttl: Some(ttl),
      ..Self::default()
    }
  }

  pub fn key(mut self, key: impl Into<String>) -> Self {
    self.key = Some(key.into());
    self
  }

  pub fn strategy(mut self, strategy: CacheStrategy) -> Self {
    self.strategy = strategy;
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheOption {
  #[default]
  Disabled,
  Enabled(CacheConfig),
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
  Json(Value),
  /// A multipart form with a single `file` part
  File { file_name: String, bytes: Vec<u8> },
}

/// Options for a single request. Defaults mirror the behavior the rest of
/// the application relies on: de-duplicated, with a loading indicator, no
/// success toast, no retry, errors handled (not returned), caching off.
#[derive(Clone)]
pub struct RequestOptions {
  pub method: Method,
  /// Query parameters; `Value::Null` entries are left out of the URL
  pub params: BTreeMap<String, Value>,
  pub body: Option<RequestBody>,
  pub headers: Vec<(String, String)>,
  /// Per-attempt timeout; falls back to the client default when unset
  pub timeout: Option<Duration>,
  /// Number of extra attempts after a transport failure
  pub retry: u32,
  pub prevent_duplicate: bool,
  pub show_loading: bool,
  pub show_success: bool,
  /// Return errors to the caller instead of resolving `None`
  pub throw_error: bool,
  pub cache: CacheOption,
  pub validate_status: StatusPredicate,
}

impl Default for RequestOptions {
  fn default() -> Self {
    Self {
      method: Method::GET,
      params: BTreeMap::new(),
      body: None,
      headers: Vec::new(),
      timeout: None,
      retry: 0,
      prevent_duplicate: true,
      show_loading: true,
      show_success: false,
      throw_error: false,
      cache: CacheOption::Disabled,
      validate_status: Arc::new(default_validate_status),
    }
  }
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.params.insert(key.into(), value.into());
    self
  }

  pub fn params(mut self, params: BTreeMap<String, Value>) -> Self {
    self.params.extend(params);
    self
  }

  pub fn json(mut self, body: Value) -> Self {
    self.body = Some(RequestBody::Json(body));
    self
  }

  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn retry(mut self, retry: u32) -> Self {
    self.retry = retry;
    self
  }

  pub fn prevent_duplicate(mut self, enabled: bool) -> Self {
    self.prevent_duplicate = enabled;
    self
  }

  pub fn show_loading(mut self, enabled: bool) -> Self {
    self.show_loading = enabled;
    self
  }

  pub fn show_success(mut self, enabled: bool) -> Self {
    self.show_success = enabled;
    self
  }

  pub fn throw_error(mut self, enabled: bool) -> Self {
    self.throw_error = enabled;
    self
  }

  /// Enable caching with the client's default TTL, cache-first.
  pub fn cached(self) -> Self {
    self.cache(CacheConfig::default())
  }

  pub fn cache(mut self, config: CacheConfig) -> Self {
    self.cache = CacheOption::Enabled(config);
    self
  }

  pub fn no_cache(mut self) -> Self {
    self.cache = CacheOption::Disabled;
    self
  }

  pub fn validate_status<F>(mut self, predicate: F) -> Self
  where
    F: Fn(u16) -> bool + Send + Sync + 'static,
  {
    self.validate_status = Arc::new(predicate);
    self
  }

  /// Cache settings in effect, if caching applies to this method.
  ///
  /// Only GET and POST responses are cached.
  pub(crate) fn cache_config(&self) -> Option<&CacheConfig> {
    match &self.cache {
      CacheOption::Enabled(config) if is_cacheable(&self.method) => Some(config),
      _ => None,
    }
  }
}

fn is_cacheable(method: &Method) -> bool {
  *method == Method::GET || *method == Method::POST
}

impl fmt::Debug for RequestOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RequestOptions")
      .field("method", &self.method)
      .field("params", &self.params)
      .field("body", &self.body)
      .field("headers", &self.headers)
      .field("timeout", &self.timeout)
      .field("retry", &self.retry)
      .field("prevent_duplicate", &self.prevent_duplicate)
      .field("show_loading", &self.show_loading)
      .field("show_success", &self.show_success)
      .field("throw_error", &self.throw_error)
      .field("cache", &self.cache)
      .finish_non_exhaustive()
  }
}
