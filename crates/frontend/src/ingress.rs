//! The `Ingress` seam (§4.F, original's `frontend.Ingress`): anything that
//! can produce `Request`s from the outside world — a file-drop watcher, an
//! HTTP listener, a one-shot CLI invocation — without the dispatch loop
//! knowing which.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::{error::IngressError, request::Request};

#[async_trait]
pub trait Ingress: Send + Sync {
  /// A short name used in logs and in `IngressError` (§4.F).
  fn name(&self) -> &str;

  /// Begins producing requests; called once, after the dispatch loop has
  /// already started draining `requests()`.
  async fn start(&self) -> Result<(), IngressError>;

  /// Stops producing requests. May be called even if `start` was never
  /// called or failed.
  async fn stop(&self) -> Result<(), IngressError>;

  /// The shared receiving end of this ingress's request channel. Returning
  /// an `Arc` rather than taking `self` by value lets the dispatch loop and
  /// the ingress's own internals both hold a reference.
  fn requests(&self) -> Arc<Mutex<mpsc::Receiver<Request>>>;
}
