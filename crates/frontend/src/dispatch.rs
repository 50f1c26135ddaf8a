//! `start` (§4.F, original's `frontend.Start`): drains every registered
//! ingress's request channel, validates each request, and dispatches it to
//! the handler on its own task so one slow render never blocks the next
//! request's acceptance.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::{error::IngressError, ingress::Ingress, request::Request};

#[async_trait]
pub trait RequestHandler: Send + Sync {
  async fn handle(&self, request: Request);
}

/// Stops every ingress that `start` registered. Dropping this without
/// calling `stop` leaves the ingresses running.
pub struct Stopper {
  ingresses: Vec<Arc<dyn Ingress>>,
}

impl Stopper {
  pub async fn stop(&self) -> Result<(), IngressError> {
    for ingress in &self.ingresses {
      ingress.stop().await?;
    }
    Ok(())
  }
}

/// Starts one dispatch task per ingress, then starts the ingresses
/// themselves. If any ingress fails to start, the already-started ones are
/// left running and returned in the error so the caller can still stop them.
pub async fn start(handler: Arc<dyn RequestHandler>, ingresses: Vec<Arc<dyn Ingress>>) -> Result<Stopper, IngressError> {
  for ingress in &ingresses {
    let rx = ingress.requests();
    let handler = handler.clone();
    let name = ingress.name().to_string();
    tokio::spawn(async move {
      loop {
        let request = {
          let mut guard = rx.lock().await;
          guard.recv().await
        };
        let Some(request) = request else {
          break;
        };
        if let Err(e) = request.validate() {
          warn!(ingress = %name, error = %e, "dropping invalid request");
          continue;
        }
        let handler = handler.clone();
        tokio::spawn(async move { handler.handle(request).await });
      }
    });

    if let Err(e) = ingress.start().await {
      error!(ingress = ingress.name(), error = %e, "ingress failed to start");
      return Err(e);
    }
  }

  Ok(Stopper { ingresses })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::Request;
  use latte_core::{Job, JobDone, JobStatus};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::sync::{mpsc, oneshot, Mutex};
  use tokio_util::sync::CancellationToken;

  struct ChannelIngress {
    rx: Arc<Mutex<mpsc::Receiver<Request>>>,
  }

  #[async_trait]
  impl Ingress for ChannelIngress {
    fn name(&self) -> &str {
      "test"
    }
    async fn start(&self) -> Result<(), IngressError> {
      Ok(())
    }
    async fn stop(&self) -> Result<(), IngressError> {
      Ok(())
    }
    fn requests(&self) -> Arc<Mutex<mpsc::Receiver<Request>>> {
      self.rx.clone()
    }
  }

  struct CountingHandler {
    count: AtomicUsize,
  }

  #[async_trait]
  impl RequestHandler for CountingHandler {
    async fn handle(&self, request: Request) {
      self.count.fetch_add(1, Ordering::SeqCst);
      let _ = request.done.send(JobDone::pending(request.job.id, chrono::Utc::now(), false, 0));
    }
  }

  fn valid_job(id: &str) -> Job {
    Job {
      id: id.to_string(),
      source_uri: "local:///tmp/src".into(),
      target_uri: "local:///tmp/dst/out.pch".into(),
      contexts: Vec::new(),
      on_missing_key: Default::default(),
      render_count: 1,
      timeout: None,
      include_logs: false,
      image: None,
      compiler: None,
      requested_at: chrono::Utc::now(),
    }
  }

  #[tokio::test]
  async fn dispatches_valid_requests_to_the_handler() {
    let (tx, rx) = mpsc::channel(4);
    let ingress: Arc<dyn Ingress> = Arc::new(ChannelIngress { rx: Arc::new(Mutex::new(rx)) });
    let handler = Arc::new(CountingHandler { count: AtomicUsize::new(0) });

    let stopper = start(handler.clone(), vec![ingress]).await.unwrap();

    let (done_tx, done_rx) = oneshot::channel();
    tx.send(Request::new(valid_job("j1"), CancellationToken::new(), done_tx)).await.unwrap();
    let result: JobDone = done_rx.await.unwrap();
    assert_eq!(result.status, JobStatus::Success);
    assert_eq!(handler.count.load(Ordering::SeqCst), 1);

    stopper.stop().await.unwrap();
  }

  #[tokio::test]
  async fn invalid_requests_are_dropped_before_reaching_the_handler() {
    let (tx, rx) = mpsc::channel(4);
    let ingress: Arc<dyn Ingress> = Arc::new(ChannelIngress { rx: Arc::new(Mutex::new(rx)) });
    let handler = Arc::new(CountingHandler { count: AtomicUsize::new(0) });

    start(handler.clone(), vec![ingress]).await.unwrap();

    let (done_tx, _done_rx) = oneshot::channel();
    tx.send(Request::new(valid_job(""), CancellationToken::new(), done_tx)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(handler.count.load(Ordering::SeqCst), 0);
  }
}
