//! Extracts an archive stream into a directory, the inverse of `archive_dir`.

use std::{
  io::Read,
  path::{Path, PathBuf},
};

use crate::{format::ArchiveError, reader::ArchiveReader};

/// Writes every record in `reader` to `dst_dir`, recreating the record
/// name's directory structure. `dst_dir` must already exist and be a
/// directory.
pub fn extract_to_dir<R: Read>(reader: R, dst_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
  if !dst_dir.is_dir() {
    return Err(ArchiveError::Io(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      format!("{} is not a directory", dst_dir.display()),
    )));
  }

  let mut written = Vec::new();
  for (header, payload) in ArchiveReader::new(reader).read_all()? {
    let dest = dst_dir.join(&header.name);
    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, &payload)?;
    written.push(dest);
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::writer::ArchiveWriter;

  #[test]
  fn extract_round_trips_directory_contents() {
    let src_dir = tempfile::tempdir().unwrap();
    std::fs::write(src_dir.path().join("main.tex"), b"root").unwrap();
    std::fs::create_dir(src_dir.path().join("sub")).unwrap();
    std::fs::write(src_dir.path().join("sub/asset.bin"), b"nested").unwrap();

    let mut buf = Vec::new();
    let mut w = ArchiveWriter::new(&mut buf);
    crate::dir::archive_dir(&mut w, src_dir.path()).unwrap();
    drop(w);

    let dst_dir = tempfile::tempdir().unwrap();
    extract_to_dir(std::io::Cursor::new(buf), dst_dir.path()).unwrap();

    assert_eq!(std::fs::read(dst_dir.path().join("main.tex")).unwrap(), b"root");
    assert_eq!(std::fs::read(dst_dir.path().join("sub/asset.bin")).unwrap(), b"nested");
  }

  #[test]
  fn rejects_non_directory_destination() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = extract_to_dir(std::io::Cursor::new(Vec::<u8>::new()), file.path()).unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
  }
}
