//! Async query abstraction for data fetching with explicit state.
//!
//! A `Query<T>` owns the fetching logic for one piece of data and tracks it
//! through a tagged state machine: `Idle -> Loading -> Success | Error`, with
//! `Loading` again on every refresh. There are no loading/error/data boolean
//! triples; each variant carries exactly the data that is valid in it.
//!
//! Two behaviors matter for refresh UX:
//!
//! - The previous successful payload rides along through `Loading` and
//!   `Error`, so a failed or in-flight refresh never blanks the screen.
//! - `refetch()` drops the channel of any pending fetch before starting a new
//!   one, so a slow stale response can never overwrite a newer result.
//!
//! # Example
//!
//! ```ignore
//! let client = client.clone();
//! let mut query = Query::new(move || {
//!     let client = client.clone();
//!     async move { client.get_sprint_data("PROJ", false).await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In the event-loop tick
//! if query.poll() {
//!     // State changed, re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query.
///
/// `previous` in `Loading` and `Error` is the last successful payload, kept
/// around so the UI can keep rendering it.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// A fetch is in flight
  Loading { previous: Option<T> },
  /// The last fetch succeeded
  Success(T),
  /// The last fetch failed
  Error { message: String, previous: Option<T> },
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading { .. })
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error { .. })
  }

  /// The latest successful payload, regardless of what happened since.
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      QueryState::Loading { previous } | QueryState::Error { previous, .. } => previous.as_ref(),
      QueryState::Idle => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error { message, .. } => Some(message),
      _ => None,
    }
  }

  /// Take the payload out of the state, leaving `Idle` behind.
  fn take_data(&mut self) -> Option<T> {
    match std::mem::replace(self, QueryState::Idle) {
      QueryState::Idle => None,
      QueryState::Loading { previous } => previous,
      QueryState::Success(data) => Some(data),
      QueryState::Error { previous, .. } => previous,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query with poll-based result delivery.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure returning a future; it runs once per
  /// `fetch()`/`refetch()` call on the tokio runtime.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching unless a fetch is already in flight.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a new fetch, cancelling any pending one.
  ///
  /// Dropping the receiver orphans the in-flight task; its late result has
  /// nowhere to land and can never clobber the newer fetch.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed. Call this from the event-loop tick.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(message)) => {
        let previous = self.state.take_data();
        self.state = QueryState::Error { message, previous };
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        let previous = self.state.take_data();
        self.state = QueryState::Error {
          message: "Query was cancelled".to_string(),
          previous,
        };
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let previous = self.state.take_data();
    self.state = QueryState::Loading { previous };

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by refetch(); that's the cancellation.
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Something went wrong".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Something went wrong"));
    assert_eq!(query.data(), None);
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_previous_data() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let fail = Arc::new(AtomicBool::new(false));
    let fail_flag = fail.clone();

    let mut query = Query::new(move || {
      let fail = fail_flag.clone();
      async move {
        if fail.load(Ordering::SeqCst) {
          Err("backend down".to_string())
        } else {
          Ok(42)
        }
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&42));

    // Refresh fails; the old payload must still be served.
    fail.store(true, Ordering::SeqCst);
    query.refetch();
    assert!(query.is_loading());
    assert_eq!(query.data(), Some(&42));

    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert!(query.is_error());
    assert_eq!(query.error(), Some("backend down"));
    assert_eq!(query.data(), Some(&42));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    assert!(query.is_loading());

    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_refetch_cancels_pending() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Refetch drops the first receiver; only the second result lands.
    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    assert_eq!(query.data(), Some(&1));
  }
}
