//! Wire and domain types shared across every crate in the workspace:
//! the `Job` a request carries, the `JobDone` report it terminates in,
//! and the process-wide `Config`.

pub mod config;
pub mod done;
pub mod job;

pub use config::{Config, ConfigError};
pub use done::{ByteRange, ContextRender, JobDone, JobStatus, RenderStatus, TableOfContents};
pub use job::{Job, JobValidationError, OnMissingKey, TemplateContext};
