//! Upload coordination
//!
//! Bridges raw upload bytes and the record store: derives a collision-free
//! storage path for each upload, persists the bytes, and keeps the backing
//! file and its [`DocumentRecord`] consistent across create/update/delete.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::document::{DocumentPatch, DocumentRecord, UpdateField};
use crate::{DocumentStore, Error, Result};

/// Format for the `upload_date` column
const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format for the filename suffix that keeps two uploads of the same file
/// from colliding on disk
const PATH_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Coordinates file persistence with the record store.
///
/// Constructed once at startup with an injected store handle and shared from
/// there; the upload directory is created on construction.
pub struct UploadCoordinator {
    store: Arc<DocumentStore>,
    upload_dir: PathBuf,
}

impl UploadCoordinator {
    pub fn new(store: Arc<DocumentStore>, upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let upload_dir = upload_dir.into();
        fs::create_dir_all(&upload_dir)?;
        Ok(Self { store, upload_dir })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Persist an upload and create its record; returns the new id.
    ///
    /// An upload without a filename or without any bytes is rejected with
    /// [`Error::EmptyUpload`] before anything touches disk.
    pub fn store_upload(
        &self,
        title: &str,
        description: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<i64> {
        if filename.is_empty() || bytes.is_empty() {
            return Err(Error::EmptyUpload);
        }

        let path = self.timestamped_path(filename);
        fs::write(&path, bytes)?;

        let upload_date = Local::now().format(UPLOAD_DATE_FORMAT).to_string();
        let id = self.store.add_document(
            title,
            description,
            Some(&upload_date),
            &path.to_string_lossy(),
        )?;

        tracing::info!(id, path = %path.display(), "stored upload");
        Ok(id)
    }

    /// Partially update a record, optionally replacing its backing file.
    ///
    /// When a replacement file is supplied it is written to a fresh
    /// timestamped path and the record repointed; the previous file is then
    /// removed best-effort (a failed removal is logged, not an error).
    pub fn replace_upload(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
        file: Option<(&str, &[u8])>,
    ) -> Result<DocumentRecord> {
        let existing = self.store.get_document(id)?;

        let mut patch = DocumentPatch::new();
        if let Some(title) = title {
            patch.set(UpdateField::Title, title);
        }
        if let Some(description) = description {
            patch.set(UpdateField::Description, description);
        }

        let mut new_path = None;
        if let Some((filename, bytes)) = file {
            if filename.is_empty() || bytes.is_empty() {
                return Err(Error::EmptyUpload);
            }
            let path = self.timestamped_path(filename);
            fs::write(&path, bytes)?;
            patch.set(UpdateField::FilePath, path.to_string_lossy());
            new_path = Some(path);
        }

        self.store.update_document(id, &patch)?;

        if let Some(new_path) = new_path {
            if Path::new(&existing.file_path) != new_path {
                if let Err(e) = fs::remove_file(&existing.file_path) {
                    if e.kind() != ErrorKind::NotFound {
                        tracing::warn!(id, path = %existing.file_path, error = %e,
                            "could not remove replaced file");
                    }
                }
            }
        }

        self.store.get_document(id)
    }

    /// Load a record and the bytes at its stored path.
    ///
    /// A record whose file has gone missing is the distinct recoverable
    /// [`Error::FileMissing`], not a store failure.
    pub fn read_file(&self, id: i64) -> Result<(DocumentRecord, Vec<u8>)> {
        let doc = self.store.get_document(id)?;
        match fs::read(&doc.file_path) {
            Ok(bytes) => Ok((doc, bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::FileMissing(PathBuf::from(&doc.file_path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the backing file, then the record.
    ///
    /// An already-absent file counts as deleted; the record removal still
    /// proceeds.
    pub fn remove(&self, id: i64) -> Result<()> {
        let doc = self.store.get_document(id)?;

        match fs::remove_file(&doc.file_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(id, path = %doc.file_path, "backing file already gone");
            }
            Err(e) => return Err(e.into()),
        }

        self.store.delete_document(id)?;
        tracing::info!(id, "removed document");
        Ok(())
    }

    /// Storage path for an upload: the original stem suffixed with a
    /// timestamp before the extension, under the upload directory. Any
    /// client-supplied directory components are stripped first.
    fn timestamped_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = Local::now().format(PATH_STAMP_FORMAT);
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
            _ => (name, String::new()),
        };

        self.upload_dir.join(format!("{stem}_{timestamp}{ext}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_coordinator() -> (UploadCoordinator, Arc<DocumentStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let coordinator = UploadCoordinator::new(store.clone(), dir.path().join("uploads")).unwrap();
        (coordinator, store, dir)
    }

    #[test]
    fn test_store_upload_writes_file_and_record() {
        let (coordinator, store, _dir) = sample_coordinator();

        let id = coordinator
            .store_upload("Report", "Quarterly numbers", "report.pdf", b"%PDF-1.4")
            .unwrap();

        let doc = store.get_document(id).unwrap();
        assert_eq!(doc.title, "Report");
        assert!(doc.upload_date.is_some());

        let path = Path::new(&doc.file_path);
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(fs::read(path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_empty_upload_rejected() {
        let (coordinator, store, _dir) = sample_coordinator();

        let err = coordinator.store_upload("T", "D", "", b"data").unwrap_err();
        assert!(matches!(err, Error::EmptyUpload));

        let err = coordinator.store_upload("T", "D", "a.txt", b"").unwrap_err();
        assert!(matches!(err, Error::EmptyUpload));

        assert_eq!(store.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_upload_path_strips_directories() {
        let (coordinator, store, _dir) = sample_coordinator();

        let id = coordinator
            .store_upload("T", "D", "../../etc/passwd", b"data")
            .unwrap();

        let doc = store.get_document(id).unwrap();
        let path = Path::new(&doc.file_path);
        assert_eq!(path.parent(), Some(coordinator.upload_dir()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("passwd_"));
    }

    #[test]
    fn test_read_file_round_trip() {
        let (coordinator, _store, _dir) = sample_coordinator();

        let id = coordinator
            .store_upload("Notes", "meeting notes", "notes.txt", b"agenda")
            .unwrap();

        let (doc, bytes) = coordinator.read_file(id).unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(bytes, b"agenda");
    }

    #[test]
    fn test_read_file_missing_is_distinct_error() {
        let (coordinator, _store, _dir) = sample_coordinator();

        let id = coordinator
            .store_upload("T", "D", "gone.txt", b"data")
            .unwrap();
        let doc = coordinator.read_file(id).unwrap().0;
        fs::remove_file(&doc.file_path).unwrap();

        let err = coordinator.read_file(id).unwrap_err();
        assert!(matches!(err, Error::FileMissing(path) if path == Path::new(&doc.file_path)));
    }

    #[test]
    fn test_remove_deletes_file_and_record() {
        let (coordinator, store, _dir) = sample_coordinator();

        let id = coordinator.store_upload("T", "D", "a.txt", b"data").unwrap();
        let path = store.get_document(id).unwrap().file_path;

        coordinator.remove(id).unwrap();

        assert!(!Path::new(&path).exists());
        assert!(matches!(store.get_document(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_tolerates_missing_file() {
        let (coordinator, store, _dir) = sample_coordinator();

        let id = coordinator.store_upload("T", "D", "a.txt", b"data").unwrap();
        fs::remove_file(store.get_document(id).unwrap().file_path).unwrap();

        coordinator.remove(id).unwrap();
        assert!(matches!(store.get_document(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_missing_record_is_not_found() {
        let (coordinator, _store, _dir) = sample_coordinator();
        assert!(matches!(coordinator.remove(42), Err(Error::NotFound(42))));
    }

    #[test]
    fn test_replace_upload_metadata_only() {
        let (coordinator, _store, _dir) = sample_coordinator();

        let id = coordinator.store_upload("T", "D", "a.txt", b"data").unwrap();
        let before = coordinator.read_file(id).unwrap().0;

        let doc = coordinator
            .replace_upload(id, Some("New title"), None, None)
            .unwrap();

        assert_eq!(doc.title, "New title");
        assert_eq!(doc.description, "D");
        assert_eq!(doc.file_path, before.file_path);
        assert!(Path::new(&doc.file_path).exists());
    }

    #[test]
    fn test_replace_upload_with_new_file() {
        let (coordinator, _store, _dir) = sample_coordinator();

        let id = coordinator.store_upload("T", "D", "a.txt", b"old").unwrap();
        let old_path = coordinator.read_file(id).unwrap().0.file_path;

        let doc = coordinator
            .replace_upload(id, None, None, Some(("b.txt", b"new".as_slice())))
            .unwrap();

        assert_ne!(doc.file_path, old_path);
        assert!(!Path::new(&old_path).exists());
        assert_eq!(coordinator.read_file(id).unwrap().1, b"new");
    }
}
