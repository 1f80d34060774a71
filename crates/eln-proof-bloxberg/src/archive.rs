//! Adding the timestamped document to a Bloxberg proof archive

use crate::error::{Error, Result};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry name of the injected document
pub const TIMESTAMPED_DATA_NAME: &str = "timestamped-data.pdf";

/// Append `pdf` to the proof archive as [`TIMESTAMPED_DATA_NAME`]
///
/// The archive is staged in a temporary file under `staging_dir`, removed
/// when this returns.
pub fn inject_document(archive: &[u8], pdf: &[u8], staging_dir: &Path) -> Result<Vec<u8>> {
    let existing = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| Error::Archive(format!("notary did not return a ZIP archive: {}", e)))?;
    if existing.file_names().any(|name| name == TIMESTAMPED_DATA_NAME) {
        return Err(Error::Archive(format!(
            "archive already contains {}",
            TIMESTAMPED_DATA_NAME
        )));
    }
    let entries = existing.len();

    let mut staged = tempfile::NamedTempFile::new_in(staging_dir)?;
    staged.write_all(archive)?;
    staged.flush()?;

    let file = staged.as_file_mut();
    file.seek(SeekFrom::Start(0))?;
    let mut writer = ZipWriter::new_append(&mut *file)?;
    writer.start_file(
        TIMESTAMPED_DATA_NAME,
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
    )?;
    writer.write_all(pdf)?;
    writer.finish()?;

    file.seek(SeekFrom::Start(0))?;
    let mut augmented = Vec::new();
    file.read_to_end(&mut augmented)?;

    tracing::debug!(
        entries = entries + 1,
        len = augmented.len(),
        "injected timestamped document into proof archive"
    );
    Ok(augmented)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof_archive() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("bloxbergResearchCertificate.pdf", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"%PDF-1.4 certificate").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut out = Vec::new();
        entry.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_inject_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let augmented = inject_document(&proof_archive(), b"%PDF-1.7 experiment", dir.path()).unwrap();

        assert_eq!(read_entry(&augmented, TIMESTAMPED_DATA_NAME), b"%PDF-1.7 experiment");
        assert_eq!(
            read_entry(&augmented, "bloxbergResearchCertificate.pdf"),
            b"%PDF-1.4 certificate"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_inject_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let once = inject_document(&proof_archive(), b"pdf", dir.path()).unwrap();
        let err = inject_document(&once, b"pdf", dir.path()).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[test]
    fn test_non_zip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = inject_document(b"<html>error</html>", b"pdf", dir.path()).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
