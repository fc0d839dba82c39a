//! Test doubles: a scripted transport and recording collaborators.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::hooks::{Navigator, Notifier};
use super::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// One scripted reply, optionally delayed.
#[derive(Debug, Clone)]
pub(crate) struct Step {
  delay: Duration,
  result: Result<TransportResponse, TransportError>,
}

impl Step {
  /// A 200 response wrapping `data` in a success envelope.
  pub(crate) fn ok(data: Value) -> Self {
    Self::envelope(200, "success", data)
  }

  pub(crate) fn envelope(code: i64, message: &str, data: Value) -> Self {
    let body = json!({"code": code, "message": message, "data": data});
    Self::raw(200, body.to_string().into_bytes())
  }

  pub(crate) fn status(status: u16) -> Self {
    Self::raw(status, Vec::new())
  }

  pub(crate) fn raw(status: u16, body: Vec<u8>) -> Self {
    Self {
      delay: Duration::ZERO,
      result: Ok(TransportResponse { status, body }),
    }
  }

  pub(crate) fn refused() -> Self {
    Self {
      delay: Duration::ZERO,
      result: Err(TransportError::Connect("connection refused".to_string())),
    }
  }

  pub(crate) fn after(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}

/// Replies with its steps in order, one per attempt.
pub(crate) struct ScriptedTransport {
  steps: Mutex<VecDeque<Step>>,
  requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
  pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
    Arc::new(Self {
      steps: Mutex::new(steps.into_iter().collect()),
      requests: Mutex::new(Vec::new()),
    })
  }

  pub(crate) fn attempts(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  pub(crate) fn requests(&self) -> Vec<TransportRequest> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
    self.requests.lock().unwrap().push(request);
    let step = self.steps.lock().unwrap().pop_front();
    match step {
      Some(step) => {
        tokio::time::sleep(step.delay).await;
        step.result
      }
      None => Err(TransportError::Other("no scripted response left".to_string())),
    }
  }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
  successes: Mutex<Vec<String>>,
  errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
  pub(crate) fn successes(&self) -> Vec<String> {
    self.successes.lock().unwrap().clone()
  }

  pub(crate) fn errors(&self) -> Vec<String> {
    self.errors.lock().unwrap().clone()
  }
}

impl Notifier for RecordingNotifier {
  fn success(&self, message: &str) {
    self.successes.lock().unwrap().push(message.to_string());
  }

  fn error(&self, message: &str) {
    self.errors.lock().unwrap().push(message.to_string());
  }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
  redirects: AtomicUsize,
}

impl RecordingNavigator {
  pub(crate) fn redirects(&self) -> usize {
    self.redirects.load(Ordering::SeqCst)
  }
}

impl Navigator for RecordingNavigator {
  fn redirect_to_login(&self) {
    self.redirects.fetch_add(1, Ordering::SeqCst);
  }
}
