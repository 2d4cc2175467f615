//! Attribute names known to the OnBase dump, and the column order used for export.

use std::collections::HashSet;
use std::fmt;

/// Token that carries a document's file paths.
pub const FILE_NAME: &str = "FileName";

/// Per-file attributes found in the dump. They describe individual pages and are not retained.
pub const FILE_ATTRIBUTES: [&str; 15] = [
    "DiskgroupNum",
    "VolumeNum",
    "FileSize",
    "NumOfPages",
    "DocRevNum",
    "Rendition",
    "PhysicalPageNum",
    "ItemPageNum",
    "FileTypeNum",
    "ImageType",
    "Compress",
    "Xdpi",
    "Ydpi",
    "TextEncoding",
    FILE_NAME,
];

/// Document-level attributes kept on each [`crate::document::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentAttribute {
    DocTypeName,
    DocDate,
    FiscalYear,
    ProviderName,
    ProgramName,
    Department,
    Description,
    DocumentSection,
    DocHandleLink,
    DocumentHandle,
}

impl DocumentAttribute {
    /// All document attributes, in export column order.
    pub const ALL: [DocumentAttribute; 10] = [
        DocumentAttribute::DocTypeName,
        DocumentAttribute::DocDate,
        DocumentAttribute::FiscalYear,
        DocumentAttribute::ProviderName,
        DocumentAttribute::ProgramName,
        DocumentAttribute::Department,
        DocumentAttribute::Description,
        DocumentAttribute::DocumentSection,
        DocumentAttribute::DocHandleLink,
        DocumentAttribute::DocumentHandle,
    ];

    /// Name as it appears in the dump and in export headers.
    pub fn name(self) -> &'static str {
        match self {
            DocumentAttribute::DocTypeName => "DocTypeName",
            DocumentAttribute::DocDate => "DocDate",
            DocumentAttribute::FiscalYear => "Fiscal Year",
            DocumentAttribute::ProviderName => "Provider Name",
            DocumentAttribute::ProgramName => "Program Name",
            DocumentAttribute::Department => "Department",
            DocumentAttribute::Description => "Description",
            DocumentAttribute::DocumentSection => "Document Section",
            DocumentAttribute::DocHandleLink => "Doc Handle Link",
            DocumentAttribute::DocumentHandle => "Document Handle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }
}

impl fmt::Display for DocumentAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a single attribute token from the dump should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    FileName,
    Document(DocumentAttribute),
    File,
    Unknown,
}

/// Whitelist of attribute names accepted by the parser.
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    document: HashSet<DocumentAttribute>,
    file: HashSet<String>,
}

impl AttributeSchema {
    pub fn new<D, F, S>(document: D, file: F) -> Self
    where
        D: IntoIterator<Item = DocumentAttribute>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document: document.into_iter().collect(),
            file: file.into_iter().map(Into::into).collect(),
        }
    }

    /// The full OnBase schema: every document attribute and every file attribute.
    pub fn onbase() -> Self {
        Self::new(DocumentAttribute::ALL, FILE_ATTRIBUTES)
    }

    pub fn classify(&self, token: &str) -> AttributeKind {
        if token == FILE_NAME {
            return AttributeKind::FileName;
        }
        if let Some(attr) = DocumentAttribute::from_name(token) {
            if self.document.contains(&attr) {
                return AttributeKind::Document(attr);
            }
        }
        if self.file.contains(token) {
            AttributeKind::File
        } else {
            AttributeKind::Unknown
        }
    }
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self::onbase()
    }
}

/// A column of the exported metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Attribute(DocumentAttribute),
    FileLink,
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Attribute(attr) => attr.name(),
            Column::FileLink => "File Link",
        }
    }

    /// Document attributes in their fixed order, plus `File Link` when files were combined.
    pub fn export_columns(include_file_link: bool) -> Vec<Column> {
        let mut columns: Vec<Column> = DocumentAttribute::ALL
            .into_iter()
            .map(Column::Attribute)
            .collect();
        if include_file_link {
            columns.push(Column::FileLink);
        }
        columns
    }
}
