//! Terminal output for document listings

use crate::DocumentRecord;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
    #[tabled(rename = "File")]
    file: String,
}

/// Render records as a table, empty string for an empty list
pub fn documents_table(docs: &[DocumentRecord]) -> String {
    if docs.is_empty() {
        return String::new();
    }

    let rows: Vec<DocumentRow> = docs
        .iter()
        .map(|doc| DocumentRow {
            id: doc.id,
            title: doc.title.clone(),
            uploaded: doc.upload_date.clone().unwrap_or_else(|| "-".to_string()),
            file: doc.file_path.clone(),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}
