//! A minimal substitution engine using the `|@ ... @|` delimiters the
//! original chose to avoid colliding with LaTeX's own `{`/`}` syntax.
//! A placeholder is either a dotted field path (`|@ .Name @|`,
//! `|@ .Address.City @|`) or a single function application over a path
//! (`|@ upper .Name @|`) drawn from the job's `FuncMap`. This does not
//! implement Go `text/template`'s control-flow or associated-template
//! features; it covers the variable-substitution case every seed scenario
//! exercises.

use std::{io::Write, sync::OnceLock};

use latte_core::OnMissingKey;
use regex::Regex;
use serde_json::Value;

use crate::engine::{FuncMap, Template, TemplateRenderError, TemplatingEngine};

fn placeholder_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\|@\s*(.*?)\s*@\|").unwrap())
}

/// Resolves a dotted path (`.a.b.c`, leading dot optional) against a JSON
/// value, returning `None` if any segment is missing.
fn resolve_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
  let path = path.strip_prefix('.').unwrap_or(path);
  if path.is_empty() {
    return Some(data);
  }
  let mut current = data;
  for segment in path.split('.') {
    current = current.as_object()?.get(segment)?;
  }
  Some(current)
}

fn value_to_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// A parsed placeholder body: either a bare path, or `func path`.
enum Expr<'a> {
  Path(&'a str),
  Call(&'a str, &'a str),
}

fn parse_expr(body: &str) -> Expr<'_> {
  if body.starts_with('.') {
    return Expr::Path(body);
  }
  match body.split_once(char::is_whitespace) {
    Some((func, rest)) => Expr::Call(func, rest.trim()),
    None => Expr::Path(body),
  }
}

pub struct SubstitutionTemplate {
  source: String,
  missing_key: OnMissingKey,
  funcs: FuncMap,
}

impl Template for SubstitutionTemplate {
  fn execute(&self, out: &mut dyn Write, data: &Value) -> Result<(), TemplateRenderError> {
    let re = placeholder_re();
    let mut last_end = 0;
    let mut rendered = String::with_capacity(self.source.len());

    for capture in re.captures_iter(&self.source) {
      let whole = capture.get(0).unwrap();
      let body = capture.get(1).unwrap().as_str();

      rendered.push_str(&self.source[last_end..whole.start()]);
      last_end = whole.end();

      let (path, func_name) = match parse_expr(body) {
        Expr::Path(p) => (p, None),
        Expr::Call(f, p) => (p, Some(f)),
      };

      match resolve_path(data, path) {
        Some(value) => match func_name {
          None => rendered.push_str(&value_to_text(value)),
          Some(name) => match self.funcs.get(name) {
            Some(f) => rendered.push_str(&value_to_text(&f(value))),
            None => return Err(TemplateRenderError::UnknownFunction(name.to_string())),
          },
        },
        None => match self.missing_key {
          OnMissingKey::Error => return Err(TemplateRenderError::MissingKey(path.to_string())),
          // Substitutes the zero value for the referenced field: since a
          // missing field carries no type information to draw a zero value
          // from, the engine falls back to JSON's own zero value, `0`.
          OnMissingKey::Zero => rendered.push('0'),
          OnMissingKey::Nothing => {}
        },
      }
    }
    rendered.push_str(&self.source[last_end..]);

    out.write_all(rendered.as_bytes())?;
    Ok(())
  }
}

#[derive(Default)]
pub struct SubstitutionEngine;

impl TemplatingEngine for SubstitutionEngine {
  /// Concatenates every glob-grouped source in order, matching the way
  /// `archive::cat` (§4.A) treats a group of same-named files as one
  /// logical stream rather than keeping only the first.
  fn parse_files(
    &self,
    _name: &str,
    missing_key: OnMissingKey,
    paths: &[std::path::PathBuf],
    funcs: &FuncMap,
  ) -> Result<Box<dyn Template>, TemplateRenderError> {
    if paths.is_empty() {
      return Err(TemplateRenderError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "no source files given to parse_files",
      )));
    }
    let mut source = String::new();
    for path in paths {
      source.push_str(&std::fs::read_to_string(path)?);
    }
    Ok(Box::new(SubstitutionTemplate {
      source,
      missing_key,
      funcs: funcs.clone(),
    }))
  }
}
