//! Transient status-bar notifications.

use ratatui::prelude::Color;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Warning,
  Error,
}

impl ToastLevel {
  pub fn color(&self) -> Color {
    match self {
      ToastLevel::Success => Color::Green,
      ToastLevel::Warning => Color::Yellow,
      ToastLevel::Error => Color::Red,
    }
  }
}

/// A single notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub level: ToastLevel,
  pub message: String,
}

impl Toast {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Success,
      message: message.into(),
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Warning,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Error,
      message: message.into(),
    }
  }
}

/// How long a toast stays on screen.
const TOAST_TTL: Duration = Duration::from_secs(4);

/// Holds the currently displayed toast, replacing it on each show and
/// dropping it once its display time is up.
#[derive(Debug, Default)]
pub struct ToastState {
  current: Option<(Toast, Instant)>,
}

impl ToastState {
  pub fn show(&mut self, toast: Toast) {
    self.current = Some((toast, Instant::now() + TOAST_TTL));
  }

  /// Expire the toast if its time is up. Call from the event-loop tick.
  pub fn tick(&mut self) {
    let expired = matches!(&self.current, Some((_, expires)) if Instant::now() >= *expires);
    if expired {
      self.current = None;
    }
  }

  pub fn current(&self) -> Option<&Toast> {
    self.current.as_ref().map(|(toast, _)| toast)
  }
}
