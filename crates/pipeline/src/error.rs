//! Per-context pipeline errors (§4.E "Error message format & parsing").
//!
//! The original tags every stage error as the string `"[<index>]<tag>:
//! <cause>"` and recovers the three parts with `ParsePipelineError`. A
//! structured value is the cleaner fit for a typed language: `PipelineError`
//! carries `{index, tag, cause}` directly, and `Display`/`parse` still
//! produce and consume the same wire string so a log line or a legacy
//! channel can round-trip through it (see DESIGN.md).

use std::fmt;

/// One stage's failure, attributed to the context that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
  pub index: usize,
  pub tag: String,
  pub cause: String,
}

impl PipelineError {
  pub fn new(index: usize, tag: impl Into<String>, cause: impl fmt::Display) -> Self {
    Self {
      index,
      tag: tag.into(),
      cause: cause.to_string(),
    }
  }
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]{}: {}", self.index, self.tag, self.cause)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed pipeline error string {0:?}")]
pub struct ParseError(String);

/// Recovers `(index, tag, cause)` from the wire string `Display` produces,
/// matching `ParsePipelineError`'s split-on-first-`]`-then-first-`: ` rule.
pub fn parse(s: &str) -> Result<PipelineError, ParseError> {
  let Some(close_bracket) = s.find(']') else {
    return Err(ParseError(s.to_string()));
  };
  if !s.starts_with('[') {
    return Err(ParseError(s.to_string()));
  }
  let index: usize = s[1..close_bracket].parse().map_err(|_| ParseError(s.to_string()))?;

  let rest = &s[close_bracket + 1..];
  let Some(colon_space) = rest.find(": ") else {
    return Err(ParseError(s.to_string()));
  };
  let tag = rest[..colon_space].to_string();
  let cause = rest[colon_space + 2..].to_string();

  Ok(PipelineError { index, tag, cause })
}

/// Errors accumulated across every context of one job (§4.D errorWorker).
#[derive(Debug, Clone, Default)]
pub struct PipelineErrors(pub Vec<PipelineError>);

impl PipelineErrors {
  pub fn push(&mut self, err: PipelineError) {
    self.0.push(err);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Errors attributed to a specific context index, in arrival order.
  pub fn for_index(&self, index: usize) -> impl Iterator<Item = &PipelineError> {
    self.0.iter().filter(move |e| e.index == index)
  }
}

impl fmt::Display for PipelineErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let joined: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
    write!(f, "{}", joined.join("; "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_matches_wire_format() {
    let e = PipelineError::new(3, "render-error", "boom");
    assert_eq!(e.to_string(), "[3]render-error: boom");
  }

  #[test]
  fn parse_round_trips_display() {
    let e = PipelineError::new(12, "archive-error", "disk full: no space");
    let parsed = parse(&e.to_string()).unwrap();
    assert_eq!(parsed, e);
  }

  #[test]
  fn parse_rejects_missing_bracket() {
    assert!(parse("no brackets here").is_err());
  }

  #[test]
  fn parse_rejects_non_numeric_index() {
    assert!(parse("[x]tag: cause").is_err());
  }

  #[test]
  fn parse_rejects_missing_colon_space() {
    assert!(parse("[1]tag-without-separator").is_err());
  }

  #[test]
  fn for_index_filters_correctly() {
    let mut errs = PipelineErrors::default();
    errs.push(PipelineError::new(0, "a", "x"));
    errs.push(PipelineError::new(1, "b", "y"));
    errs.push(PipelineError::new(0, "c", "z"));
    assert_eq!(errs.for_index(0).count(), 2);
    assert_eq!(errs.for_index(1).count(), 1);
  }
}
