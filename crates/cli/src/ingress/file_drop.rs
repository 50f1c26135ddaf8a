//! `FileDropIngress`: watches a directory for dropped job-description JSON
//! files and turns each into a `Request`, writing the resulting `JobDone`
//! back next to the file once the job terminates.

use std::{path::Path, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use latte_core::Job;
use latte_frontend::{Ingress, IngressError, Request};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct FileDropIngress {
  watch_dir: PathBuf,
  tx: mpsc::Sender<Request>,
  rx: Arc<Mutex<mpsc::Receiver<Request>>>,
  watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FileDropIngress {
  pub fn new(watch_dir: PathBuf) -> Self {
    let (tx, rx) = mpsc::channel(32);
    Self {
      watch_dir,
      tx,
      rx: Arc::new(Mutex::new(rx)),
      watcher: Mutex::new(None),
    }
  }
}

#[derive(Debug, thiserror::Error)]
enum LoadJobError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid json: {0}")]
  Json(#[from] serde_json::Error),
}

fn load_job(path: &Path) -> Result<Job, LoadJobError> {
  let text = std::fs::read_to_string(path)?;
  Ok(serde_json::from_str(&text)?)
}

/// Picks up one dropped file: parses it, submits a `Request`, and spawns a
/// task that writes the eventual `JobDone` next to it once the job
/// terminates. Renames the source file immediately so a duplicate
/// filesystem event for the same path can't submit it twice.
fn handle_dropped_file(path: PathBuf, tx: &mpsc::Sender<Request>, rt: &tokio::runtime::Handle) {
  if path.extension().and_then(|e| e.to_str()) != Some("json") {
    return;
  }
  let in_progress = path.with_extension("json.processing");
  if std::fs::rename(&path, &in_progress).is_err() {
    // Already picked up by a previous event for the same path.
    return;
  }

  let job = match load_job(&in_progress) {
    Ok(job) => job,
    Err(e) => {
      warn!(path = %path.display(), error = %e, "dropped file is not a valid job description");
      let _ = std::fs::rename(&in_progress, path.with_extension("json.invalid"));
      return;
    }
  };

  let (done_tx, done_rx) = oneshot::channel();
  let request = Request::new(job, CancellationToken::new(), done_tx);
  if tx.blocking_send(request).is_err() {
    return;
  }

  rt.spawn(async move {
    let result_path = in_progress.with_extension("").with_extension("result.json");
    match done_rx.await {
      Ok(job_done) => match serde_json::to_vec_pretty(&job_done) {
        Ok(bytes) => {
          if let Err(e) = tokio::fs::write(&result_path, bytes).await {
            warn!(path = %result_path.display(), error = %e, "failed to write job result");
          }
        }
        Err(e) => warn!(error = %e, "failed to serialize job result"),
      },
      Err(_) => warn!("handler dropped without reporting a result"),
    }
    let _ = tokio::fs::remove_file(&in_progress).await;
  });
}

#[async_trait]
impl Ingress for FileDropIngress {
  fn name(&self) -> &str {
    "file-drop"
  }

  async fn start(&self) -> Result<(), IngressError> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher =
      notify::recommended_watcher(move |res| {
        let _ = std_tx.send(res);
      })
      .map_err(|e| IngressError::Start {
        name: self.name().to_string(),
        source: Box::new(e),
      })?;
    watcher
      .watch(&self.watch_dir, RecursiveMode::NonRecursive)
      .map_err(|e| IngressError::Start {
        name: self.name().to_string(),
        source: Box::new(e),
      })?;
    *self.watcher.lock().await = Some(watcher);

    let tx = self.tx.clone();
    let rt = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || {
      for res in std_rx.iter() {
        match res {
          Ok(event) if matches!(event.kind, notify::EventKind::Create(_)) => {
            for path in event.paths {
              handle_dropped_file(path, &tx, &rt);
            }
          }
          Ok(_) => {}
          Err(e) => warn!(error = %e, "file watch error"),
        }
      }
    });

    Ok(())
  }

  async fn stop(&self) -> Result<(), IngressError> {
    // Dropping the watcher stops delivering events, which closes the std
    // channel and lets the blocking watch loop exit.
    *self.watcher.lock().await = None;
    Ok(())
  }

  fn requests(&self) -> Arc<Mutex<mpsc::Receiver<Request>>> {
    self.rx.clone()
  }
}
