//! Reentrant loading-indicator counter.

use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use crate::i18n::{Locale, MessageKey};

/// Counts calls that asked for a loading indicator.
///
/// Visibility is published on a watch channel and only changes on the
/// 0 -> 1 and 1 -> 0 transitions.
#[derive(Debug)]
pub struct LoadingCounter {
  count: Mutex<usize>,
  visible: watch::Sender<bool>,
  locale: Locale,
}

impl LoadingCounter {
  pub fn new(locale: Locale) -> Self {
    let (visible, _) = watch::channel(false);
    Self {
      count: Mutex::new(0),
      visible,
      locale,
    }
  }

  pub fn acquire(&self) {
    let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
    *count += 1;
    if *count == 1 {
      debug!(text = self.locale.text(MessageKey::LoadingText), "loading shown");
      self.visible.send_replace(true);
    }
  }

  /// Decrement, floored at zero.
  pub fn release(&self) {
    let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
    if *count == 0 {
      return;
    }
    *count -= 1;
    if *count == 0 {
      debug!("loading hidden");
      self.visible.send_replace(false);
    }
  }

  /// Acquire now, release when the guard drops.
  pub fn guard(&self) -> LoadingGuard<'_> {
    self.acquire();
    LoadingGuard { counter: self }
  }

  pub fn count(&self) -> usize {
    *self.count.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn is_visible(&self) -> bool {
    *self.visible.borrow()
  }

  /// Subscribe to visibility transitions.
  pub fn subscribe(&self) -> watch::Receiver<bool> {
    self.visible.subscribe()
  }
}

impl Default for LoadingCounter {
  fn default() -> Self {
    Self::new(Locale::default())
  }
}

pub struct LoadingGuard<'a> {
  counter: &'a LoadingCounter,
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    self.counter.release();
  }
}
