//! # contract: capability traits at the edges of the conversion pipeline
//!
//! The consolidator and the pipeline only talk to page merging and tabular
//! export through these traits, so the concrete PDF and spreadsheet libraries
//! stay swappable.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; the generated `MockPageMerger`
//!   and `MockTabularExporter` are exported behind the `test-export-mocks`
//!   feature so integration tests under `tests/` can use them.

use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::combine::ConsolidateError;
use crate::document::Document;
use crate::export::ExportError;
use crate::schema::Column;

/// A source of pages that can be merged into one multi-page artifact.
///
/// The first page passed to [`PageMerger::write_merged`] is the base page;
/// the rest are appended in order.
#[cfg_attr(
    any(test, feature = "test-export-mocks"),
    automock(type Page = std::path::PathBuf;)
)]
pub trait PageMerger {
    /// An opened page. Dropping it releases whatever it holds.
    type Page;

    fn open_page(&self, path: &Path) -> Result<Self::Page, ConsolidateError>;

    /// Writes `pages` to `destination`. Must fail with
    /// [`ConsolidateError::NoPages`] when `pages` is empty.
    fn write_merged(
        &self,
        pages: Vec<Self::Page>,
        destination: &Path,
    ) -> Result<(), ConsolidateError>;
}

/// Writes the document table to one output file.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TabularExporter {
    /// Short label used in logs and the run summary, e.g. `"csv"`.
    fn format(&self) -> &'static str;

    /// Writes a header row of `columns` then one row per document. Missing
    /// fields are empty cells; fields outside `columns` are not written.
    fn export(
        &self,
        documents: &[Document],
        columns: &[Column],
        destination: &Path,
    ) -> Result<(), ExportError>;
}
