//! On-wire record framing (§4.A, § External Interfaces "Archive format on
//! the wire"): `header, payload, header, payload, ...` with no trailer.
//!
//! A header is `name_len: u32 LE | name: UTF-8 bytes | size: u64 LE |
//! meta_len: u32 LE | meta: JSON bytes`. `size` is the payload's exact byte
//! length; the payload follows the header immediately with no padding.

use std::io::{self, Read, Write};

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("record name is not valid utf-8")]
  InvalidName,
  #[error("record metadata is not valid json: {0}")]
  InvalidMetadata(#[from] serde_json::Error),
  #[error("error opening file {path}: {source}")]
  OpenFile {
    path: String,
    #[source]
    source: io::Error,
  },
}

/// One record's framing metadata: its logical path, its payload length,
/// and an optional metadata bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
  pub name: String,
  pub size: u64,
  pub metadata: Option<Value>,
}

impl Header {
  pub fn new(name: impl Into<String>, size: u64) -> Self {
    Self {
      name: name.into(),
      size,
      metadata: None,
    }
  }

  pub fn with_metadata(mut self, metadata: Value) -> Self {
    self.metadata = Some(metadata);
    self
  }

  pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> Result<(), ArchiveError> {
    let name_bytes = self.name.as_bytes();
    w.write_all(&(name_bytes.len() as u32).to_le_bytes())?;
    w.write_all(name_bytes)?;
    w.write_all(&self.size.to_le_bytes())?;

    let meta_bytes = match &self.metadata {
      Some(v) => serde_json::to_vec(v)?,
      None => Vec::new(),
    };
    w.write_all(&(meta_bytes.len() as u32).to_le_bytes())?;
    w.write_all(&meta_bytes)?;
    Ok(())
  }

  /// Reads the next header from `r`, or `Ok(None)` if the stream is
  /// exhausted at a record boundary.
  pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Option<Self>, ArchiveError> {
    let mut len_buf = [0u8; 4];
    match read_exact_or_eof(r, &mut len_buf)? {
      false => return Ok(None),
      true => {}
    }
    let name_len = u32::from_le_bytes(len_buf) as usize;

    let mut name_buf = vec![0u8; name_len];
    r.read_exact(&mut name_buf)?;
    let name = String::from_utf8(name_buf).map_err(|_| ArchiveError::InvalidName)?;

    let mut size_buf = [0u8; 8];
    r.read_exact(&mut size_buf)?;
    let size = u64::from_le_bytes(size_buf);

    let mut meta_len_buf = [0u8; 4];
    r.read_exact(&mut meta_len_buf)?;
    let meta_len = u32::from_le_bytes(meta_len_buf) as usize;

    let metadata = if meta_len == 0 {
      None
    } else {
      let mut meta_buf = vec![0u8; meta_len];
      r.read_exact(&mut meta_buf)?;
      Some(serde_json::from_slice(&meta_buf)?)
    };

    Ok(Some(Header { name, size, metadata }))
  }
}

/// Like `read_exact` but returns `Ok(false)` instead of erroring when the
/// very first byte hits EOF (a clean record-boundary end of stream).
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool, io::Error> {
  let mut filled = 0;
  while filled < buf.len() {
    match r.read(&mut buf[filled..]) {
      Ok(0) => {
        if filled == 0 {
          return Ok(false);
        }
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated record header"));
      }
      Ok(n) => filled += n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_round_trips_without_metadata() {
    let h = Header::new("a/b.txt", 42);
    let mut buf = Vec::new();
    h.write_to(&mut buf).unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    let got = Header::read_from(&mut cursor).unwrap().unwrap();
    assert_eq!(got, h);
  }

  #[test]
  fn header_round_trips_with_metadata() {
    let h = Header::new("x", 7).with_metadata(serde_json::json!({"k": "v"}));
    let mut buf = Vec::new();
    h.write_to(&mut buf).unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    let got = Header::read_from(&mut cursor).unwrap().unwrap();
    assert_eq!(got, h);
  }

  #[test]
  fn empty_stream_yields_none() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    assert!(Header::read_from(&mut cursor).unwrap().is_none());
  }
}
