//! Collaborators the client reports to: user notifications and navigation.

use tracing::{info, warn};

/// Surfaces short success/failure messages to the user.
pub trait Notifier: Send + Sync {
  fn success(&self, message: &str);
  fn error(&self, message: &str);
}

/// Reacts to an expired or missing session.
pub trait Navigator: Send + Sync {
  fn redirect_to_login(&self);
}

/// Routes notifications into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn success(&self, message: &str) {
    info!(message, "notify success");
  }

  fn error(&self, message: &str) {
    warn!(message, "notify error");
  }
}

/// Prints notifications to stderr, leaving stdout for command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn success(&self, message: &str) {
    info!(message, "notify success");
    eprintln!("✔ {}", message);
  }

  fn error(&self, message: &str) {
    warn!(message, "notify error");
    eprintln!("✘ {}", message);
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
  fn redirect_to_login(&self) {
    warn!("session rejected, login required");
  }
}
