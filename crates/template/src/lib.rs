//! Directory-walk classification, parse-once template building, and
//! per-context rendering (§4.C).

mod engine;
mod job;
pub mod substitution;

pub use engine::{FuncMap, Template, TemplateRenderError, TemplatingEngine};
pub use job::{TemplateJob, TemplateJobError};
pub use substitution::SubstitutionEngine;

/// Parses a context's opaque raw JSON payload into the `Value` tree the
/// template engine substitutes against (§4.C step 2).
pub fn parse_context_data(raw: &serde_json::value::RawValue) -> serde_json::Result<serde_json::Value> {
  serde_json::from_str(raw.get())
}
