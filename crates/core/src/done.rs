//! The `JobDone` terminal report and its per-context breakdown (§3, §6).

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall disposition of a job, derived from its per-context renders
/// (§3 invariant 2): `Success` iff every context succeeded, `Failed` iff
/// every context failed, `Partial` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Success,
  Partial,
  Failed,
}

/// Disposition of a single context's rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
  Success,
  Failed,
}

/// Byte range of one logical file's payload within the merged archive
/// (§3 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
  pub start: u64,
  pub end: u64,
}

pub type TableOfContents = BTreeMap<String, ByteRange>;

/// Outcome of rendering a single context, positioned by its index in
/// `JobDone::renders` (§3 invariant 1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRender {
  pub status: Option<RenderStatus>,
  #[serde(default)]
  pub errors: Vec<String>,
  #[serde(default)]
  pub duration: Option<Duration>,
}

impl ContextRender {
  pub fn push_error(&mut self, message: impl Into<String>) {
    self.errors.push(message.into());
  }

  /// Finalizes this render's status from its accumulated errors: no errors
  /// recorded against this index means success (§3 invariant 1).
  pub fn finalize(&mut self, duration: Duration) {
    self.duration = Some(duration);
    self.status = Some(if self.errors.is_empty() {
      RenderStatus::Success
    } else {
      RenderStatus::Failed
    });
  }
}

/// Terminal report delivered to a request's `Done` callback exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDone {
  pub job_id: String,
  pub status: JobStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact_url: Option<String>,
  #[serde(default)]
  pub table_of_contents: TableOfContents,
  pub has_logs: bool,
  #[serde(default)]
  pub rerender_count: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub renders: Vec<ContextRender>,
  pub requested_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub duration: Duration,
}

impl JobDone {
  /// A fresh report with one empty render slot per context, ready for the
  /// handler to fill in as the pipeline progresses.
  pub fn pending(job_id: String, requested_at: DateTime<Utc>, has_logs: bool, context_count: usize) -> Self {
    Self {
      job_id,
      status: JobStatus::Failed,
      artifact_url: None,
      table_of_contents: TableOfContents::new(),
      has_logs,
      rerender_count: 0,
      error: None,
      renders: vec![ContextRender::default(); context_count],
      requested_at,
      started_at: None,
      duration: Duration::ZERO,
    }
  }

  /// Marks this report as a terminal failure (§7): the one path besides the
  /// final `Done` call that every handler branch funnels through.
  pub fn fail(&mut self, err: impl std::fmt::Display) {
    self.status = JobStatus::Failed;
    self.error = Some(err.to_string());
  }

  /// Aggregates per-context statuses into the overall job status
  /// (§3 invariant 2).
  pub fn aggregate_status(&mut self) {
    let total = self.renders.len();
    let failed = self
      .renders
      .iter()
      .filter(|r| r.status == Some(RenderStatus::Failed))
      .count();

    self.status = if total == 0 || failed == 0 {
      JobStatus::Success
    } else if failed == total {
      JobStatus::Failed
    } else {
      JobStatus::Partial
    };
  }
}
