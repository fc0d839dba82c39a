//! Request orchestration: de-duplication, caching, retry, timeout and the
//! loading indicator around a single [`Transport`].

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::cache::ResponseCache;
use super::dedup::{CancelHandle, CancelReason, PendingGuard, PendingRequests};
use super::envelope::ApiResponse;
use super::error::HttpError;
use super::fingerprint::{build_url, Fingerprint};
use super::hooks::{Navigator, Notifier, TracingNavigator, TracingNotifier};
use super::loading::LoadingCounter;
use super::options::{CacheStrategy, RequestBody, RequestOptions};
use super::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::config::{Config, DEFAULT_CACHE_TTL_MS, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS};
use crate::i18n::{Locale, MessageKey};

/// Client-wide defaults applied when a call does not override them.
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
  pub timeout: Duration,
  pub cache_ttl: Duration,
  pub retry_delay: Duration,
  pub locale: Locale,
}

impl Default for ClientSettings {
  fn default() -> Self {
    Self {
      timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
      cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
      retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
      locale: Locale::default(),
    }
  }
}

impl ClientSettings {
  pub fn from_config(config: &Config) -> Self {
    Self {
      timeout: config.timeout(),
      cache_ttl: config.cache_ttl(),
      retry_delay: config.retry_delay(),
      locale: config.locale,
    }
  }
}

/// Resolved cache parameters for one call.
struct CachePlan {
  key: String,
  ttl: Duration,
  strategy: CacheStrategy,
}

/// HTTP client for the book-management API.
///
/// The pending-request table, response cache and loading counter are owned
/// by the client; clones share them.
#[derive(Clone)]
pub struct HttpClient {
  transport: Arc<dyn Transport>,
  base_url: Url,
  settings: ClientSettings,
  notifier: Arc<dyn Notifier>,
  navigator: Arc<dyn Navigator>,
  pending: Arc<PendingRequests>,
  cache: Arc<ResponseCache>,
  loading: Arc<LoadingCounter>,
}

impl HttpClient {
  /// Build a client that talks to the configured backend over reqwest.
  pub fn new(config: &Config) -> color_eyre::Result<Self> {
    let transport = ReqwestTransport::new()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    Ok(Self::with_transport(
      config.base_url()?,
      ClientSettings::from_config(config),
      Arc::new(transport),
    ))
  }

  pub fn with_transport(
    base_url: Url,
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
  ) -> Self {
    Self {
      transport,
      base_url,
      settings,
      notifier: Arc::new(TracingNotifier),
      navigator: Arc::new(TracingNavigator),
      pending: Arc::new(PendingRequests::new()),
      cache: Arc::new(ResponseCache::new()),
      loading: Arc::new(LoadingCounter::new(settings.locale)),
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
    self.navigator = navigator;
    self
  }

  pub fn cache(&self) -> &ResponseCache {
    &self.cache
  }

  pub fn loading(&self) -> &LoadingCounter {
    &self.loading
  }

  pub fn pending(&self) -> &PendingRequests {
    &self.pending
  }

  pub fn settings(&self) -> &ClientSettings {
    &self.settings
  }

  fn text(&self, key: MessageKey) -> &'static str {
    self.settings.locale.text(key)
  }

  /// Fingerprint a call would be registered under.
  pub fn fingerprint(&self, path: &str, options: &RequestOptions) -> Fingerprint {
    Fingerprint::compute(path, &options.method, &options.params, options.body.as_ref())
  }

  /// Cancel a pending call. Returns false if nothing was pending.
  pub fn cancel(&self, fingerprint: &Fingerprint) -> bool {
    self.pending.cancel_with(fingerprint, CancelReason::User)
  }

  pub fn cancel_all(&self) -> usize {
    self.pending.cancel_all(CancelReason::User)
  }

  /// Issue a request and unwrap the envelope payload into `T`.
  ///
  /// Every failure is reported to the notifier (duplicates excepted) and then
  /// either returned, when `throw_error` is set, or swallowed as `Ok(None)`.
  pub async fn request<T: DeserializeOwned>(
    &self,
    path: &str,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError> {
    let result = self.execute(path, &options).await.and_then(|data| {
      serde_json::from_value::<T>(data).map_err(|e| HttpError::InvalidResponse {
        message: e.to_string(),
      })
    });

    match result {
      Ok(data) => Ok(Some(data)),
      Err(err) => self.settle(err, &options),
    }
  }

  fn settle<T>(&self, err: HttpError, options: &RequestOptions) -> Result<Option<T>, HttpError> {
    self.report(&err);
    if options.throw_error {
      Err(err)
    } else {
      Ok(None)
    }
  }

  pub async fn get<T, P>(
    &self,
    path: &str,
    params: &P,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError>
  where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
  {
    let params = match params_from(params) {
      Ok(params) => params,
      Err(err) => return self.settle(err, &options),
    };
    self
      .request(path, options.method(Method::GET).params(params))
      .await
  }

  pub async fn post<T, B>(
    &self,
    path: &str,
    body: &B,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let body = match body_from(body) {
      Ok(body) => body,
      Err(err) => return self.settle(err, &options),
    };
    self
      .request(path, options.method(Method::POST).json(body))
      .await
  }

  pub async fn put<T, B>(
    &self,
    path: &str,
    body: &B,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let body = match body_from(body) {
      Ok(body) => body,
      Err(err) => return self.settle(err, &options),
    };
    self
      .request(path, options.method(Method::PUT).json(body))
      .await
  }

  pub async fn patch<T, B>(
    &self,
    path: &str,
    body: &B,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let body = match body_from(body) {
      Ok(body) => body,
      Err(err) => return self.settle(err, &options),
    };
    self
      .request(path, options.method(Method::PATCH).json(body))
      .await
  }

  pub async fn delete<T: DeserializeOwned>(
    &self,
    path: &str,
    options: RequestOptions,
  ) -> Result<Option<T>, HttpError> {
    self.request(path, options.method(Method::DELETE)).await
  }

  /// POST a multipart form with a single `file` part.
  pub async fn upload<T: DeserializeOwned>(
    &self,
    path: &str,
    file_name: &str,
    bytes: Vec<u8>,
    mut options: RequestOptions,
  ) -> Result<Option<T>, HttpError> {
    options.method = Method::POST;
    options.body = Some(RequestBody::File {
      file_name: file_name.to_string(),
      bytes,
    });
    self.request(path, options).await
  }

  /// Fetch raw bytes from `path` and write them to `dest`.
  ///
  /// The body is not an envelope, so this bypasses de-duplication, caching
  /// and envelope handling. Returns the number of bytes written.
  pub async fn download(&self, path: &str, dest: &Path) -> Result<u64, HttpError> {
    let result = self.fetch_to_file(path, dest).await;
    match &result {
      Ok(_) => self.notifier.success(self.text(MessageKey::OperationSuccess)),
      Err(err) => {
        warn!(path, error = %err, "download failed");
        self.notifier.error(self.text(MessageKey::OperationFailed));
      }
    }
    result
  }

  async fn fetch_to_file(&self, path: &str, dest: &Path) -> Result<u64, HttpError> {
    let url =
      build_url(&self.base_url, path, &BTreeMap::new()).map_err(|e| HttpError::InvalidRequest {
        message: e.to_string(),
      })?;
    let request = TransportRequest {
      method: Method::GET,
      url,
      headers: Vec::new(),
      body: None,
    };

    let _loading = self.loading.guard();
    let response = self
      .attempt(&request, &CancelHandle::new(), self.settings.timeout)
      .await?;
    if !(200..300).contains(&response.status) {
      return Err(HttpError::HttpStatus {
        status: response.status,
      });
    }

    tokio::fs::write(dest, &response.body)
      .await
      .map_err(|e| HttpError::Io {
        message: format!("failed to write {}: {}", dest.display(), e),
      })?;
    Ok(response.body.len() as u64)
  }

  /// Run a call to completion and return the envelope payload.
  async fn execute(&self, path: &str, options: &RequestOptions) -> Result<Value, HttpError> {
    let fingerprint = self.fingerprint(path, options);
    let url =
      build_url(&self.base_url, path, &options.params).map_err(|e| HttpError::InvalidRequest {
        message: format!("{}{}: {}", self.base_url, path, e),
      })?;

    let plan = options.cache_config().map(|config| CachePlan {
      key: config
        .key
        .clone()
        .unwrap_or_else(|| fingerprint.to_string()),
      ttl: config.ttl.unwrap_or(self.settings.cache_ttl),
      strategy: config.strategy,
    });

    if let Some(plan) = plan.as_ref().filter(|p| p.strategy == CacheStrategy::CacheFirst) {
      if let Some(hit) = self.cache.get(&plan.key) {
        debug!(key = %plan.key, url = %url, "cache hit");
        return Ok(hit);
      }
    }

    let handle = CancelHandle::new();
    let _pending = options
      .prevent_duplicate
      .then(|| PendingGuard::register(&self.pending, fingerprint.clone(), &handle));
    let _loading = options.show_loading.then(|| self.loading.guard());

    let request = TransportRequest {
      method: options.method.clone(),
      url,
      headers: options.headers.clone(),
      body: options.body.clone(),
    };
    let timeout = options.timeout.unwrap_or(self.settings.timeout);
    let started = Instant::now();
    debug!(method = %request.method, url = %request.url, "request");

    let mut attempt: u32 = 0;
    let outcome = loop {
      attempt += 1;
      match self.attempt(&request, &handle, timeout).await {
        Err(err) if err.is_retryable() && attempt <= options.retry => {
          warn!(attempt, error = %err, url = %request.url, "attempt failed, retrying");
          tokio::select! {
            biased;
            _ = handle.cancelled() => break Err(self.cancellation_error(&handle)),
            _ = tokio::time::sleep(self.settings.retry_delay) => {}
          }
        }
        other => break other,
      }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let response = match outcome {
      Ok(response) => response,
      Err(err) => {
        if err.is_retryable() {
          if let Some(plan) = plan.as_ref().filter(|p| p.strategy == CacheStrategy::NetworkFirst) {
            if let Some(stale) = self.cache.get(&plan.key) {
              warn!(key = %plan.key, error = %err, "network failed, serving cached response");
              return Ok(stale);
            }
          }
        }
        debug!(url = %request.url, elapsed_ms, attempts = attempt, error = %err, "request failed");
        return Err(err);
      }
    };

    let data = self.interpret(response, options, plan.as_ref(), &fingerprint)?;
    debug!(url = %request.url, elapsed_ms, attempts = attempt, "response");
    Ok(data)
  }

  /// One network attempt, raced against cancellation and the timeout.
  async fn attempt(
    &self,
    request: &TransportRequest,
    handle: &CancelHandle,
    timeout: Duration,
  ) -> Result<TransportResponse, HttpError> {
    let outcome = tokio::select! {
      biased;
      _ = handle.cancelled() => return Err(self.cancellation_error(handle)),
      _ = tokio::time::sleep(timeout) => Err(HttpError::TimedOut { after: timeout }),
      result = self.transport.send(request.clone()) => result.map_err(|e| HttpError::Transport {
        message: e.to_string(),
        connect: e.is_connect(),
      }),
    };

    // A superseded call settles as cancelled whatever the attempt produced
    if handle.is_cancelled() {
      return Err(self.cancellation_error(handle));
    }
    outcome
  }

  fn cancellation_error(&self, handle: &CancelHandle) -> HttpError {
    match handle.reason() {
      Some(CancelReason::User) => HttpError::Cancelled {
        message: self.text(MessageKey::RequestCanceled).to_string(),
      },
      Some(CancelReason::Duplicate) | None => HttpError::Duplicate {
        message: self.text(MessageKey::DuplicateRequest).to_string(),
      },
    }
  }

  /// Turn a transport response into the envelope payload.
  fn interpret(
    &self,
    response: TransportResponse,
    options: &RequestOptions,
    plan: Option<&CachePlan>,
    fingerprint: &Fingerprint,
  ) -> Result<Value, HttpError> {
    let status = response.status;
    if !(options.validate_status)(status) {
      return Err(HttpError::HttpStatus { status });
    }

    if status == 304 {
      let key = plan.map(|p| p.key.clone()).unwrap_or_else(|| fingerprint.to_string());
      return match plan.and_then(|p| self.cache.get(&p.key)) {
        Some(cached) => {
          debug!(key = %key, "304 not modified, using cache");
          Ok(cached)
        }
        None => Err(HttpError::StaleCachePrecondition { key }),
      };
    }

    let envelope: ApiResponse =
      serde_json::from_slice(&response.body).map_err(|e| HttpError::InvalidResponse {
        message: e.to_string(),
      })?;

    if !envelope.is_success() {
      return Err(HttpError::Business {
        code: envelope.code,
        message: envelope
          .message_or(self.text(MessageKey::OperationFailed))
          .to_string(),
        data: Some(envelope.data),
      });
    }

    if options.show_success {
      self
        .notifier
        .success(envelope.message_or(self.text(MessageKey::OperationSuccess)));
    }
    if let Some(plan) = plan {
      self.cache.set(plan.key.clone(), envelope.data.clone(), plan.ttl);
      debug!(key = %plan.key, ttl_ms = plan.ttl.as_millis() as u64, "response cached");
    }
    Ok(envelope.data)
  }

  /// Surface a failure to the user.
  fn report(&self, err: &HttpError) {
    match err {
      HttpError::Duplicate { .. } => {}
      HttpError::HttpStatus { status } => {
        let key = match status {
          401 => MessageKey::Unauthorized,
          403 => MessageKey::Forbidden,
          404 => MessageKey::NotFound,
          500 => MessageKey::ServerError,
          _ => MessageKey::NetworkError,
        };
        self.notifier.error(self.text(key));
        if *status == 401 {
          self.navigator.redirect_to_login();
        }
      }
      HttpError::TimedOut { .. } => self.notifier.error(self.text(MessageKey::RequestTimeout)),
      HttpError::Transport { connect: true, .. } => {
        self.notifier.error(self.text(MessageKey::NetworkConnectionFailed))
      }
      HttpError::Transport { .. } => self.notifier.error(self.text(MessageKey::RequestSendFailed)),
      HttpError::Cancelled { message } | HttpError::Business { message, .. } => {
        self.notifier.error(message)
      }
      other => self.notifier.error(&other.to_string()),
    }
  }
}

fn params_from<P: Serialize + ?Sized>(params: &P) -> Result<BTreeMap<String, Value>, HttpError> {
  match serde_json::to_value(params) {
    Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
    Ok(Value::Null) => Ok(BTreeMap::new()),
    Ok(other) => Err(HttpError::InvalidRequest {
      message: format!("query parameters must be an object, got {}", other),
    }),
    Err(e) => Err(HttpError::InvalidRequest {
      message: e.to_string(),
    }),
  }
}

fn body_from<B: Serialize + ?Sized>(body: &B) -> Result<Value, HttpError> {
  serde_json::to_value(body).map_err(|e| HttpError::InvalidRequest {
    message: e.to_string(),
  })
}
