//! Cancellable debounce timer for search-as-you-type.
//!
//! Owned by the view that uses it, polled from the event-loop tick. Each
//! `submit` re-arms the timer; the value is released once the quiet period
//! has elapsed. No global timer state anywhere.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  pending: Option<(String, Instant)>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Schedule a value, replacing and re-arming any pending one.
  pub fn submit(&mut self, value: String) {
    self.pending = Some((value, Instant::now() + self.delay));
  }

  /// Drop any pending value.
  pub fn cancel(&mut self) {
    self.pending = None;
  }

  /// Release the pending value if its quiet period has elapsed.
  pub fn poll(&mut self) -> Option<String> {
    let elapsed = matches!(&self.pending, Some((_, deadline)) if Instant::now() >= *deadline);
    if elapsed {
      self.pending.take().map(|(value, _)| value)
    } else {
      None
    }
  }
}
