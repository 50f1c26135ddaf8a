use thiserror::Error;

/// Why a `Request` was rejected before reaching a handler (§4.F Validation).
#[derive(Debug, Error)]
pub enum RequestError {
  #[error("invalid job: {0}")]
  InvalidJob(#[from] latte_core::JobValidationError),
}

/// Failures starting or stopping one registered ingress.
#[derive(Debug, Error)]
pub enum IngressError {
  #[error("error starting ingress {name}: {source}")]
  Start {
    name: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
  #[error("error stopping ingress {name}: {source}")]
  Stop {
    name: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}
