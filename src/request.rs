//! Background requests for the UI loop.
//!
//! Views spawn REST calls onto the tokio runtime and get the results back as
//! messages, drained on every tick:
//!
//! ```ignore
//! let client = self.client.clone();
//! self.requests.spawn(async move { Msg::Deleted(client.delete::<Students>(&id).await) });
//!
//! // In the tick handler
//! for msg in self.requests.poll() {
//!     self.handle(msg);
//! }
//! ```

use std::future::Future;
use tokio::sync::mpsc;

/// Runs futures in the background and collects their outputs in completion order.
pub struct RequestQueue<M> {
  tx: mpsc::UnboundedSender<M>,
  rx: mpsc::UnboundedReceiver<M>,
  in_flight: usize,
}

impl<M: Send + 'static> RequestQueue<M> {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      tx,
      rx,
      in_flight: 0,
    }
  }

  /// Start `future` on the runtime. Its output shows up in a later `poll`.
  pub fn spawn<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = M> + Send + 'static,
  {
    self.in_flight += 1;
    let tx = self.tx.clone();
    tokio::spawn(async move {
      // Receiver is gone once the view is dropped
      let _ = tx.send(future.await);
    });
  }

  /// Every message that arrived since the last poll, without blocking
  pub fn poll(&mut self) -> Vec<M> {
    let mut out = Vec::new();
    while let Ok(msg) = self.rx.try_recv() {
      self.in_flight = self.in_flight.saturating_sub(1);
      out.push(msg);
    }
    out
  }

  /// Whether any spawned request has not reported back yet
  pub fn is_busy(&self) -> bool {
    self.in_flight > 0
  }
}

impl<M: Send + 'static> Default for RequestQueue<M> {
  fn default() -> Self {
    Self::new()
  }
}

impl<M> std::fmt::Debug for RequestQueue<M> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RequestQueue")
      .field("in_flight", &self.in_flight)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_results_arrive_on_poll() {
    let mut queue = RequestQueue::new();
    assert!(queue.poll().is_empty());

    queue.spawn(async { 42 });
    assert!(queue.is_busy());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(queue.poll(), vec![42]);
    assert!(!queue.is_busy());
  }

  #[tokio::test]
  async fn test_completion_order() {
    let mut queue = RequestQueue::new();
    queue.spawn(async {
      tokio::time::sleep(Duration::from_millis(50)).await;
      "slow"
    });
    queue.spawn(async { "fast" });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(queue.poll(), vec!["fast"]);
    assert!(queue.is_busy());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(queue.poll(), vec!["slow"]);
    assert!(!queue.is_busy());
  }
}
