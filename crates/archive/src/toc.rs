//! `build_table_of_contents` (§4.A): re-reads an archive stream and records
//! each record's exact payload byte range within it.

use std::io::{Read, Seek, SeekFrom};

use latte_core::{ByteRange, TableOfContents};

use crate::format::{ArchiveError, Header};

/// Scans `reader` from its current position to EOF, returning a mapping of
/// logical path to the payload's `[start, end)` byte range in the stream
/// (§3 invariant 4). The reader is left positioned at EOF.
pub fn build_table_of_contents<R: Read + Seek>(reader: &mut R) -> Result<TableOfContents, ArchiveError> {
  let mut toc = TableOfContents::new();
  loop {
    let Some(header) = Header::read_from(reader)? else {
      break;
    };
    let start = reader.stream_position()?;
    let end = start + header.size;
    toc.insert(header.name, ByteRange { start, end });
    reader.seek(SeekFrom::Start(end))?;
  }
  Ok(toc)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::writer::ArchiveWriter;
  use std::io::Cursor;

  #[test]
  fn toc_ranges_address_exact_payload_bytes() {
    let mut buf = Vec::new();
    {
      let mut w = ArchiveWriter::new(&mut buf);
      w.write_bytes("0/test.pdf", b"PASS").unwrap();
      w.write_bytes("0/other.bin", b"ok").unwrap();
    }

    let mut cursor = Cursor::new(buf.clone());
    let toc = build_table_of_contents(&mut cursor).unwrap();

    let range = &toc["0/test.pdf"];
    assert_eq!(&buf[range.start as usize..range.end as usize], b"PASS");
    let range = &toc["0/other.bin"];
    assert_eq!(&buf[range.start as usize..range.end as usize], b"ok");
  }

  #[test]
  fn empty_archive_yields_empty_toc() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let toc = build_table_of_contents(&mut cursor).unwrap();
    assert!(toc.is_empty());
  }
}
