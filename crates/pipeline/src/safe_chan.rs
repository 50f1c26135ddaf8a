//! The safe-channel primitive (§4.D): an mpsc sender wrapped so `close()`
//! is idempotent under concurrent callers, mirroring the Go `safeChan`'s
//! mutex-guarded `closed` flag. `Pipeline` holds one of these for its
//! add-side channel (`tjobs`): the `Pipeline` value itself outlives the
//! point where no more contexts will be submitted, so `close()` needs to
//! be an explicit, callable-more-than-once operation rather than "drop the
//! sender". The inter-stage channels (`rjobs`/`ajobs`) don't need this:
//! each worker of a stage holds its own plain `mpsc::Sender` clone and the
//! channel closes naturally once every one of those tasks returns and
//! drops its clone.

use tokio::sync::{mpsc, Mutex};

pub struct SafeSender<T> {
  inner: Mutex<Option<mpsc::Sender<T>>>,
}

#[derive(Debug, thiserror::Error)]
#[error("send on a closed channel")]
pub struct SendOnClosed;

impl<T> SafeSender<T> {
  pub fn new(sender: mpsc::Sender<T>) -> Self {
    Self {
      inner: Mutex::new(Some(sender)),
    }
  }

  /// Sends `value`, or fails if this side has already been closed.
  pub async fn send(&self, value: T) -> Result<(), SendOnClosed> {
    let guard = self.inner.lock().await;
    match guard.as_ref() {
      Some(sender) => sender.send(value).await.map_err(|_| SendOnClosed),
      None => Err(SendOnClosed),
    }
  }

  /// Drops the underlying sender exactly once, no matter how many
  /// concurrent callers invoke `close`. A later call is a no-op.
  pub async fn close(&self) {
    let mut guard = self.inner.lock().await;
    guard.take();
  }
}
