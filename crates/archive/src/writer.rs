//! Append-only archive writer (§4.A).

use std::io::{self, Write};

use crate::format::{ArchiveError, Header};

/// Appends `(header, payload)` records to an underlying writer. Each
/// record must be written in full before the next is started; `finish`
/// simply flushes, since the container carries no trailer (§ External
/// Interfaces "Archive format on the wire").
pub struct ArchiveWriter<W: Write> {
  inner: W,
}

impl<W: Write> ArchiveWriter<W> {
  pub fn new(inner: W) -> Self {
    Self { inner }
  }

  /// Writes one record: a header for `name`/`size`, then exactly `size`
  /// bytes read from `payload`. Returns an I/O error verbatim on any
  /// failure, per §4.A's "no retry" contract; a partially written record
  /// leaves the archive invalid and callers must treat it as fatal.
  pub fn write_record<R: io::Read>(&mut self, name: &str, size: u64, mut payload: R) -> Result<(), ArchiveError> {
    Header::new(name, size).write_to(&mut self.inner)?;
    let copied = io::copy(&mut payload, &mut self.inner)?;
    if copied != size {
      return Err(ArchiveError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("record {name} declared size {size} but wrote {copied} bytes"),
      )));
    }
    Ok(())
  }

  pub fn write_bytes(&mut self, name: &str, payload: &[u8]) -> Result<(), ArchiveError> {
    self.write_record(name, payload.len() as u64, payload)
  }

  pub fn finish(mut self) -> Result<W, ArchiveError> {
    self.inner.flush()?;
    Ok(self.inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reader::ArchiveReader;

  #[test]
  fn writes_then_reads_back_multiple_records() {
    let mut buf = Vec::new();
    {
      let mut w = ArchiveWriter::new(&mut buf);
      w.write_bytes("a.txt", b"hello").unwrap();
      w.write_bytes("dir/b.txt", b"world").unwrap();
    }

    let mut r = ArchiveReader::new(std::io::Cursor::new(buf));
    let (h1, data1) = r.next_record().unwrap().unwrap();
    assert_eq!(h1.name, "a.txt");
    assert_eq!(data1, b"hello");
    let (h2, data2) = r.next_record().unwrap().unwrap();
    assert_eq!(h2.name, "dir/b.txt");
    assert_eq!(data2, b"world");
    assert!(r.next_record().unwrap().is_none());
  }

  #[test]
  fn rejects_undersized_payload() {
    let mut buf = Vec::new();
    let mut w = ArchiveWriter::new(&mut buf);
    let err = w.write_record("short", 10, &b"abc"[..]).unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
  }
}
