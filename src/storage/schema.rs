//! Database schema definitions

/// SQL to create the documents table
///
/// `upload_date` is nullable: early revisions of the table had no such
/// column, and rows migrated from them carry NULL there.
pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    upload_date TEXT,
    file_path TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_documents_title ON documents(title)"];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_DOCUMENTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
