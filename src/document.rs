use std::borrow::Cow;
use std::path::PathBuf;

use serde::Serialize;

use crate::schema::{Column, DocumentAttribute};

/// One logical document from the dump: its metadata, its raw file paths and,
/// once consolidated, the path of the single artifact that represents it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub doc_type_name: Option<String>,
    pub doc_date: Option<String>,
    pub fiscal_year: Option<String>,
    pub provider_name: Option<String>,
    pub program_name: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub document_section: Option<String>,
    pub doc_handle_link: Option<String>,
    pub document_handle: Option<String>,
    /// Raw `FileName` values in first-seen order, without duplicates.
    pub files: Vec<String>,
    pub file_link: Option<PathBuf>,
}

impl Document {
    pub fn attribute(&self, attr: DocumentAttribute) -> Option<&str> {
        let slot = match attr {
            DocumentAttribute::DocTypeName => &self.doc_type_name,
            DocumentAttribute::DocDate => &self.doc_date,
            DocumentAttribute::FiscalYear => &self.fiscal_year,
            DocumentAttribute::ProviderName => &self.provider_name,
            DocumentAttribute::ProgramName => &self.program_name,
            DocumentAttribute::Department => &self.department,
            DocumentAttribute::Description => &self.description,
            DocumentAttribute::DocumentSection => &self.document_section,
            DocumentAttribute::DocHandleLink => &self.doc_handle_link,
            DocumentAttribute::DocumentHandle => &self.document_handle,
        };
        slot.as_deref()
    }

    pub fn set_attribute(&mut self, attr: DocumentAttribute, value: impl Into<String>) {
        let slot = match attr {
            DocumentAttribute::DocTypeName => &mut self.doc_type_name,
            DocumentAttribute::DocDate => &mut self.doc_date,
            DocumentAttribute::FiscalYear => &mut self.fiscal_year,
            DocumentAttribute::ProviderName => &mut self.provider_name,
            DocumentAttribute::ProgramName => &mut self.program_name,
            DocumentAttribute::Department => &mut self.department,
            DocumentAttribute::Description => &mut self.description,
            DocumentAttribute::DocumentSection => &mut self.document_section,
            DocumentAttribute::DocHandleLink => &mut self.doc_handle_link,
            DocumentAttribute::DocumentHandle => &mut self.document_handle,
        };
        *slot = Some(value.into());
    }

    pub fn handle(&self) -> Option<&str> {
        self.document_handle.as_deref()
    }

    /// Appends a file path unless the exact same string is already listed.
    /// Returns whether the path was added.
    pub fn add_file(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.files.contains(&path) {
            return false;
        }
        self.files.push(path);
        true
    }

    /// Cell value for an export column; `None` renders as an empty cell.
    pub fn column_value(&self, column: Column) -> Option<Cow<'_, str>> {
        match column {
            Column::Attribute(attr) => self.attribute(attr).map(Cow::Borrowed),
            Column::FileLink => self.file_link.as_ref().map(|p| p.to_string_lossy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_keeps_first_seen_order_and_skips_exact_duplicates() {
        let mut doc = Document::default();
        assert!(doc.add_file(r"VOL1\a\1.tif"));
        assert!(doc.add_file(r"VOL1\a\2.tif"));
        assert!(!doc.add_file(r"VOL1\a\1.tif"));
        assert!(doc.add_file(r"VOL1\A\1.tif"));
        assert_eq!(doc.files, vec![r"VOL1\a\1.tif", r"VOL1\a\2.tif", r"VOL1\A\1.tif"]);
    }

    #[test]
    fn column_value_reads_attributes_and_file_link() {
        let mut doc = Document::default();
        doc.set_attribute(DocumentAttribute::Department, "Finance");
        doc.set_attribute(DocumentAttribute::Department, "Payroll");
        assert_eq!(
            doc.column_value(Column::Attribute(DocumentAttribute::Department))
                .as_deref(),
            Some("Payroll")
        );
        assert_eq!(doc.column_value(Column::FileLink), None);

        doc.file_link = Some(PathBuf::from("out/123.pdf"));
        assert_eq!(doc.column_value(Column::FileLink).as_deref(), Some("out/123.pdf"));
    }
}
