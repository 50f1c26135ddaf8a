//! Sequential `(header, payload)` archive container (§4.A): the "pch"
//! shim the pipeline uses to persist one context's rendered output and to
//! merge every context's output into a single artifact.

mod dir;
mod extract;
mod format;
mod reader;
mod toc;
mod writer;

pub use dir::{archive_dir, cat};
pub use extract::extract_to_dir;
pub use format::{ArchiveError, Header};
pub use reader::ArchiveReader;
pub use toc::build_table_of_contents;
pub use writer::ArchiveWriter;
