//! The three-stage worker pipeline (§4.E): template rendering, compilation,
//! and archiving, wired together with bounded channels and a shared error
//! aggregator.

mod config;
mod error;
mod hooks;
mod pipeline;
mod render_step;
mod safe_chan;
mod types;
mod workers;

pub use config::{Configuration, ConfigurationError, ContextDeriver, DefaultContextDeriver};
pub use error::{parse, PipelineError, PipelineErrors};
pub use hooks::{Hook, HookError};
pub use pipeline::{MergeError, Pipeline, PipelineStartError, TableOfContentsError, WaitError};
pub use render_step::RenderStep;
pub use safe_chan::{SafeSender, SendOnClosed};
