//! Internal per-stage job payloads (§4.E): each carries the one context
//! index it belongs to, since stages execute strictly in order
//! template → render → archive for that index.

use std::{path::PathBuf, time::Instant};

use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;

/// Sent on the template-job channel: one context's raw data plus the
/// cancellation scope derived for it.
pub struct TemplateStageJob {
  pub index: usize,
  pub data: Box<RawValue>,
  pub cancel: CancellationToken,
}

/// Sent on the render-job channel once a context's templates are rendered.
pub struct RenderStageJob {
  pub index: usize,
  pub start: Instant,
  pub in_dir: PathBuf,
  pub out_dir: PathBuf,
  pub run_count: u32,
  pub extra_args: Vec<String>,
  pub cancel: CancellationToken,
}

/// Sent on the archive-job channel once a context's render pass completes.
pub struct ArchiveStageJob {
  pub index: usize,
  pub dir: PathBuf,
  pub duration: std::time::Duration,
  pub cancel: CancellationToken,
}
