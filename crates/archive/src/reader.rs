//! Sequential archive reader (§4.A).

use std::io::Read;

use crate::format::{ArchiveError, Header};

/// Iterates `(header, payload)` records from an underlying reader in
/// order. Each call to `next_record` consumes exactly one record's header
/// and payload, leaving the cursor at the start of the next.
pub struct ArchiveReader<R: Read> {
  inner: R,
}

impl<R: Read> ArchiveReader<R> {
  pub fn new(inner: R) -> Self {
    Self { inner }
  }

  /// Reads the next record's header and its full payload, or `None` once
  /// the stream is exhausted at a record boundary.
  pub fn next_record(&mut self) -> Result<Option<(Header, Vec<u8>)>, ArchiveError> {
    let Some(header) = Header::read_from(&mut self.inner)? else {
      return Ok(None);
    };
    let mut payload = vec![0u8; header.size as usize];
    self.inner.read_exact(&mut payload)?;
    Ok(Some((header, payload)))
  }

  /// Reads every remaining record.
  pub fn read_all(mut self) -> Result<Vec<(Header, Vec<u8>)>, ArchiveError> {
    let mut out = Vec::new();
    while let Some(rec) = self.next_record()? {
      out.push(rec);
    }
    Ok(out)
  }
}
