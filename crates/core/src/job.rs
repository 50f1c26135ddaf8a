//! The `Job` wire type and its validation rules.
//!
//! A `Job` is the immutable description of one rendering request: where the
//! source templates live, where the merged artifact should end up, and the
//! list of template contexts to render it against. See `TemplateContext`
//! for the per-context identity rule.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

#[derive(Debug, thiserror::Error)]
pub enum JobValidationError {
  #[error("job id cannot be empty")]
  EmptyId,
  #[error("job source uri cannot be empty")]
  EmptySourceUri,
  #[error("job target uri cannot be empty")]
  EmptyTargetUri,
}

/// How the template engine should react to a key referenced by a template
/// but absent from that context's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissingKey {
  /// Fail the template render for this context.
  Error,
  /// Substitute the zero value for the referenced field.
  Zero,
  /// Silently drop the reference.
  Nothing,
}

impl Default for OnMissingKey {
  fn default() -> Self {
    OnMissingKey::Nothing
  }
}

/// One set of variable bindings to render the job's templates against.
///
/// `index` is the stable identity of this context's sub-rendering for the
/// lifetime of the job: it names the context's working subdirectory, its
/// entry in `JobDone::renders`, and every error tagged to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
  pub index: usize,
  /// Opaque key-value payload, typically JSON, handed verbatim to the
  /// template engine.
  pub data: Box<RawValue>,
}

impl TemplateContext {
  pub fn new(index: usize, data: Box<RawValue>) -> Self {
    Self { index, data }
  }
}

fn default_render_count() -> u32 {
  1
}

/// Immutable input to the job handler (§3 Request/Job).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub source_uri: String,
  pub target_uri: String,
  #[serde(default)]
  pub contexts: Vec<Box<RawValue>>,
  #[serde(default)]
  pub on_missing_key: OnMissingKey,
  #[serde(default = "default_render_count")]
  pub render_count: u32,
  #[serde(default, with = "duration_nanos_opt")]
  pub timeout: Option<Duration>,
  #[serde(default)]
  pub include_logs: bool,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub compiler: Option<String>,
  pub requested_at: DateTime<Utc>,
}

impl Job {
  /// Validates the fields the handler cannot proceed without (§7 Validation).
  /// Never reaches the handler if this fails; the ingress drops the request.
  pub fn validate(&self) -> Result<(), JobValidationError> {
    if self.id.is_empty() {
      return Err(JobValidationError::EmptyId);
    }
    if self.source_uri.is_empty() {
      return Err(JobValidationError::EmptySourceUri);
    }
    if self.target_uri.is_empty() {
      return Err(JobValidationError::EmptyTargetUri);
    }
    Ok(())
  }

  /// Contexts paired with their stable index, ready for `Pipeline::add`.
  pub fn indexed_contexts(&self) -> Vec<TemplateContext> {
    self
      .contexts
      .iter()
      .enumerate()
      .map(|(idx, raw)| TemplateContext::new(idx, raw.clone()))
      .collect()
  }
}

mod duration_nanos_opt {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
      Some(d) => s.serialize_some(&(d.as_nanos() as u64)),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    let nanos: Option<u64> = Option::deserialize(d)?;
    Ok(nanos.map(Duration::from_nanos))
  }
}
