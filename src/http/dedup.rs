//! Table of in-flight requests keyed by fingerprint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio_util::sync::CancellationToken;

use super::fingerprint::Fingerprint;

/// Why a pending call was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
  /// Superseded by a newer call with the same fingerprint
  Duplicate,
  /// Cancelled explicitly by the caller
  User,
}

/// Cancellation handle for one call. Clones share state; the first reason
/// recorded wins.
#[derive(Debug, Clone)]
pub struct CancelHandle {
  id: u64,
  token: CancellationToken,
  reason: Arc<OnceLock<CancelReason>>,
}

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

impl CancelHandle {
  pub fn new() -> Self {
    Self {
      id: NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed),
      token: CancellationToken::new(),
      reason: Arc::new(OnceLock::new()),
    }
  }

  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn cancel(&self, reason: CancelReason) {
    let _ = self.reason.set(reason);
    self.token.cancel();
  }

  pub fn reason(&self) -> Option<CancelReason> {
    self.reason.get().copied()
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Resolves once the handle is cancelled.
  pub async fn cancelled(&self) {
    self.token.cancelled().await
  }
}

impl Default for CancelHandle {
  fn default() -> Self {
    Self::new()
  }
}

/// At most one live handle per fingerprint.
#[derive(Debug, Default)]
pub struct PendingRequests {
  entries: Mutex<HashMap<Fingerprint, CancelHandle>>,
}

impl PendingRequests {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<Fingerprint, CancelHandle>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register `handle` under `fingerprint`, cancelling whatever was there.
  pub fn register(&self, fingerprint: Fingerprint, handle: CancelHandle) {
    if let Some(previous) = self.entries().insert(fingerprint, handle) {
      previous.cancel(CancelReason::Duplicate);
    }
  }

  /// Cancel and drop the entry for `fingerprint`. No-op when absent.
  pub fn cancel_and_remove(&self, fingerprint: &Fingerprint) -> bool {
    self.cancel_with(fingerprint, CancelReason::Duplicate)
  }

  /// Cancel on behalf of the caller.
  pub fn cancel_with(&self, fingerprint: &Fingerprint, reason: CancelReason) -> bool {
    match self.entries().remove(fingerprint) {
      Some(handle) => {
        handle.cancel(reason);
        true
      }
      None => false,
    }
  }

  /// Drop the entry only if it still belongs to call `id`.
  pub fn remove(&self, fingerprint: &Fingerprint, id: u64) {
    let mut entries = self.entries();
    if entries.get(fingerprint).is_some_and(|h| h.id() == id) {
      entries.remove(fingerprint);
    }
  }

  /// Cancel every pending call. Returns how many were cancelled.
  pub fn cancel_all(&self, reason: CancelReason) -> usize {
    let drained: Vec<CancelHandle> = self.entries().drain().map(|(_, h)| h).collect();
    for handle in &drained {
      handle.cancel(reason);
    }
    drained.len()
  }

  pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
    self.entries().contains_key(fingerprint)
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }
}

/// Removes a call's pending entry when the call settles.
pub(crate) struct PendingGuard<'a> {
  table: &'a PendingRequests,
  fingerprint: Fingerprint,
  id: u64,
}

impl<'a> PendingGuard<'a> {
  pub(crate) fn register(
    table: &'a PendingRequests,
    fingerprint: Fingerprint,
    handle: &CancelHandle,
  ) -> Self {
    table.register(fingerprint.clone(), handle.clone());
    Self {
      table,
      fingerprint,
      id: handle.id(),
    }
  }
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    self.table.remove(&self.fingerprint, self.id);
  }
}
