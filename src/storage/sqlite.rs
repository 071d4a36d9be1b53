//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, ToSql, params};

use super::schema;
use crate::document::{DocumentPatch, DocumentRecord};
use crate::{Error, Result};

/// SQLite-backed store for document records.
///
/// The connection sits behind a mutex so one handle can be shared across
/// concurrent request tasks; each operation runs as a single auto-committed
/// statement while the lock is held, so readers observe either the pre- or
/// post-update row, never a partial write.
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

impl DocumentStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::StoreUnavailable)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::StoreUnavailable)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema (idempotent)
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).map_err(Error::StoreUnavailable)?;
        }
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied
        // statement behind, so a poisoned guard is still usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new record and return its assigned id.
    pub fn add_document(
        &self,
        title: &str,
        description: &str,
        upload_date: Option<&str>,
        file_path: &str,
    ) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO documents (title, description, upload_date, file_path)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![title, description, upload_date, file_path],
        )
        .map_err(Error::WriteFailed)?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a record by id.
    ///
    /// A missing row is [`Error::NotFound`], never a generic read error.
    pub fn get_document(&self, id: i64) -> Result<DocumentRecord> {
        self.conn()
            .query_row(
                "SELECT id, title, description, upload_date, file_path FROM documents WHERE id = ?1",
                [id],
                row_to_document,
            )
            .optional()
            .map_err(Error::ReadFailed)?
            .ok_or(Error::NotFound(id))
    }

    /// All records in insertion order. An empty table yields an empty vec.
    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, upload_date, file_path FROM documents ORDER BY id",
            )
            .map_err(Error::ReadFailed)?;

        let rows = stmt
            .query_map([], row_to_document)
            .map_err(Error::ReadFailed)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::ReadFailed)
    }

    /// Replace only the fields named in `patch`; everything else is left
    /// untouched. An empty patch succeeds without touching the row.
    ///
    /// Column names come from the fixed [`UpdateField`](crate::UpdateField)
    /// enumeration, never from caller-supplied strings.
    pub fn update_document(&self, id: i64, patch: &DocumentPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = patch
            .fields()
            .iter()
            .map(|(field, _)| format!("{} = ?", field.column()))
            .collect();
        let sql = format!(
            "UPDATE documents SET {} WHERE id = ?",
            assignments.join(", ")
        );

        let mut values: Vec<&dyn ToSql> = patch
            .fields()
            .iter()
            .map(|(_, value)| value as &dyn ToSql)
            .collect();
        values.push(&id);

        self.conn()
            .execute(&sql, values.as_slice())
            .map_err(Error::WriteFailed)?;
        Ok(())
    }

    /// Remove the record for `id`. Deleting a nonexistent id is not an
    /// error (idempotent delete).
    pub fn delete_document(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("DELETE FROM documents WHERE id = ?1", [id])
            .map_err(Error::WriteFailed)?;
        Ok(())
    }

    /// Count all records
    pub fn count_documents(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(Error::ReadFailed)?;
        Ok(count as usize)
    }
}

/// Helper to convert a row to a DocumentRecord
fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        upload_date: row.get(3)?,
        file_path: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UpdateField;

    fn sample_store() -> DocumentStore {
        DocumentStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let store = sample_store();

        let id = store
            .add_document("Report", "Quarterly numbers", Some("2024-03-01 09:30:00"), "uploads/report.pdf")
            .unwrap();

        let doc = store.get_document(id).unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.title, "Report");
        assert_eq!(doc.description, "Quarterly numbers");
        assert_eq!(doc.upload_date.as_deref(), Some("2024-03-01 09:30:00"));
        assert_eq!(doc.file_path, "uploads/report.pdf");
    }

    #[test]
    fn test_ids_are_fresh_and_monotonic() {
        let store = sample_store();

        let a = store.add_document("A", "a", None, "/p/a").unwrap();
        let b = store.add_document("B", "b", None, "/p/b").unwrap();
        let c = store.add_document("C", "c", None, "/p/c").unwrap();

        assert!(a < b && b < c);
    }

    #[test]
    fn test_upload_date_is_optional() {
        let store = sample_store();

        let id = store.add_document("Old", "pre-migration row", None, "/p/old").unwrap();
        assert_eq!(store.get_document(id).unwrap().upload_date, None);
    }

    #[test]
    fn test_list_returns_all_in_insertion_order() {
        let store = sample_store();
        assert!(store.list_documents().unwrap().is_empty());

        for i in 0..5 {
            store
                .add_document(&format!("Doc {i}"), "desc", None, &format!("/p/{i}"))
                .unwrap();
        }

        let docs = store.list_documents().unwrap();
        assert_eq!(docs.len(), 5);
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.title, format!("Doc {i}"));
            assert_eq!(store.get_document(doc.id).unwrap(), *doc);
        }
    }

    #[test]
    fn test_update_single_field() {
        let store = sample_store();
        let id = store.add_document("Before", "desc", None, "/p/1").unwrap();

        let mut patch = DocumentPatch::new();
        patch.set(UpdateField::Title, "After");
        store.update_document(id, &patch).unwrap();

        let doc = store.get_document(id).unwrap();
        assert_eq!(doc.title, "After");
        assert_eq!(doc.description, "desc");
        assert_eq!(doc.file_path, "/p/1");
    }

    #[test]
    fn test_update_multiple_fields() {
        let store = sample_store();
        let id = store.add_document("T", "D", None, "/p/1").unwrap();

        let mut patch = DocumentPatch::new();
        patch
            .set(UpdateField::Description, "new description")
            .set(UpdateField::FilePath, "/p/2");
        store.update_document(id, &patch).unwrap();

        let doc = store.get_document(id).unwrap();
        assert_eq!(doc.title, "T");
        assert_eq!(doc.description, "new description");
        assert_eq!(doc.file_path, "/p/2");
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let store = sample_store();
        let id = store
            .add_document("T", "D", Some("2024-01-01 00:00:00"), "/p/1")
            .unwrap();
        let before = store.get_document(id).unwrap();

        store.update_document(id, &DocumentPatch::new()).unwrap();

        assert_eq!(store.get_document(id).unwrap(), before);
    }

    #[test]
    fn test_unknown_field_rejected_and_record_unchanged() {
        let store = sample_store();
        let id = store.add_document("T", "D", None, "/p/1").unwrap();
        let before = store.get_document(id).unwrap();

        let err = DocumentPatch::from_pairs([("color", "blue")]).unwrap_err();
        assert!(matches!(err, Error::InvalidField(name) if name == "color"));

        assert_eq!(store.get_document(id).unwrap(), before);
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let store = sample_store();
        let id = store.add_document("T", "D", None, "/p/1").unwrap();

        store.delete_document(id).unwrap();

        let err = store.get_document(id).unwrap_err();
        assert!(matches!(err, Error::NotFound(missing) if missing == id));
    }

    #[test]
    fn test_delete_nonexistent_is_ok() {
        let store = sample_store();
        store.delete_document(9999).unwrap();
    }

    #[test]
    fn test_two_document_scenario() {
        let store = sample_store();

        let first = store.add_document("Doc 1", "Desc 1", None, "/p/1").unwrap();
        store.add_document("Doc 2", "Desc 2", None, "/p/2").unwrap();

        let docs = store.list_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Doc 1");
        assert_eq!(docs[1].description, "Desc 2");

        store.delete_document(first).unwrap();

        let docs = store.list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Doc 2");
    }

    #[test]
    fn test_count_documents() {
        let store = sample_store();
        assert_eq!(store.count_documents().unwrap(), 0);

        store.add_document("T", "D", None, "/p/1").unwrap();
        store.add_document("T", "D", None, "/p/2").unwrap();
        assert_eq!(store.count_documents().unwrap(), 2);
    }
}
