//! Document record types
//!
//! A [`DocumentRecord`] is one uploaded file's metadata plus the path to its
//! stored bytes. Partial updates go through [`DocumentPatch`], which only
//! accepts fields from the closed [`UpdateField`] enumeration - caller
//! supplied field names are validated at the boundary and never reach the
//! SQL layer as free-form strings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A document record - one row in the `documents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique id, assigned by the store on creation. Immutable.
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Upload timestamp (`YYYY-MM-DD HH:MM:SS`). Nullable so rows written
    /// before the column existed stay readable.
    pub upload_date: Option<String>,
    /// Path to the stored bytes. The store does not verify the file exists;
    /// the upload coordinator owns that consistency.
    pub file_path: String,
}

/// The closed set of fields a patch may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateField {
    Title,
    Description,
    UploadDate,
    FilePath,
}

impl UpdateField {
    /// Column name in the `documents` table
    pub fn column(&self) -> &'static str {
        match self {
            UpdateField::Title => "title",
            UpdateField::Description => "description",
            UpdateField::UploadDate => "upload_date",
            UpdateField::FilePath => "file_path",
        }
    }

    /// All updatable fields
    pub fn all() -> &'static [UpdateField] {
        &[
            UpdateField::Title,
            UpdateField::Description,
            UpdateField::UploadDate,
            UpdateField::FilePath,
        ]
    }
}

impl FromStr for UpdateField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "title" => Ok(UpdateField::Title),
            "description" => Ok(UpdateField::Description),
            "upload_date" => Ok(UpdateField::UploadDate),
            "file_path" => Ok(UpdateField::FilePath),
            other => Err(Error::InvalidField(other.to_string())),
        }
    }
}

impl std::fmt::Display for UpdateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A partial update: the fields to replace and their new values.
///
/// Fields not present in the patch are left untouched by
/// [`DocumentStore::update_document`](crate::DocumentStore::update_document).
/// An empty patch is a valid no-op.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    fields: Vec<(UpdateField, String)>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's new value. Setting the same field twice keeps the
    /// latest value.
    pub fn set(&mut self, field: UpdateField, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(f, _)| *f == field) {
            entry.1 = value;
        } else {
            self.fields.push((field, value));
        }
        self
    }

    /// Set a field by its caller-supplied name, rejecting names outside
    /// the updatable set with [`Error::InvalidField`].
    pub fn try_set(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        let field = UpdateField::from_str(name)?;
        Ok(self.set(field, value))
    }

    /// Build a patch from `(name, value)` pairs, e.g. decoded form fields.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut patch = Self::new();
        for (name, value) in pairs {
            patch.try_set(name.as_ref(), value)?;
        }
        Ok(patch)
    }

    pub fn fields(&self) -> &[(UpdateField, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in UpdateField::all() {
            assert_eq!(*field, field.column().parse::<UpdateField>().unwrap());
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "color".parse::<UpdateField>().unwrap_err();
        assert!(matches!(err, Error::InvalidField(name) if name == "color"));
    }

    #[test]
    fn test_patch_set_twice_keeps_latest() {
        let mut patch = DocumentPatch::new();
        patch.set(UpdateField::Title, "first");
        patch.set(UpdateField::Title, "second");
        assert_eq!(patch.fields().len(), 1);
        assert_eq!(patch.fields()[0].1, "second");
    }

    #[test]
    fn test_patch_from_pairs_rejects_unknown() {
        let err = DocumentPatch::from_pairs([("title", "x"), ("color", "blue")]).unwrap_err();
        assert!(matches!(err, Error::InvalidField(name) if name == "color"));
    }
}
