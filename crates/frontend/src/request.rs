//! The `Request` an ingress hands to the dispatch loop (§4.F, original's
//! `frontend.Request`): a validated `Job` plus the means to cancel it and
//! to deliver its terminal `JobDone` back to whoever is waiting.

use latte_core::{Job, JobDone};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::RequestError;

/// One inbound rendering request. `done` is consumed exactly once, by the
/// handler, when the job reaches a terminal state (§7).
pub struct Request {
  pub job: Job,
  pub cancel: CancellationToken,
  pub done: oneshot::Sender<JobDone>,
}

impl Request {
  pub fn new(job: Job, cancel: CancellationToken, done: oneshot::Sender<JobDone>) -> Self {
    Self { job, cancel, done }
  }

  /// The one check every ingress must pass before a request reaches a
  /// handler (§4.F step 1); a job that fails this is dropped, not handled.
  pub fn validate(&self) -> Result<(), RequestError> {
    self.job.validate().map_err(RequestError::InvalidJob)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn job(id: &str) -> Job {
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
      requested_at: Utc::now(),
    }
  }

  #[test]
  fn rejects_invalid_job() {
    let (tx, _rx) = oneshot::channel();
    let req = Request::new(job(""), CancellationToken::new(), tx);
    assert!(req.validate().is_err());
  }

  #[test]
  fn accepts_valid_job() {
    let (tx, _rx) = oneshot::channel();
    let req = Request::new(job("j1"), CancellationToken::new(), tx);
    assert!(req.validate().is_ok());
  }
}
