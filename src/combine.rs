//! Consolidates each document's files into a single output artifact.
//!
//! - one file: copied to `<output>/<handle>.<ext>`, keeping its metadata
//! - several files: merged, in order, into `<output>/<handle>.pdf`
//!
//! Every document is handled on its own. A failure is logged, recorded in the
//! [`ConsolidationReport`] and never stops the rest of the batch.

use std::fs::{self, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::PageMerger;
use crate::document::Document;
use crate::images_to_pdf::PdfPageMerger;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("document has no Document Handle")]
    MissingHandle,

    #[error("no files associated with document")]
    NoFiles,

    #[error("file path '{0}' has no volume segment")]
    InvalidSourcePath(String),

    #[error("file name in '{0}' has no extension")]
    MissingExtension(String),

    #[error("source file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("could not decode image {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("no pages could be opened, nothing to merge")]
    NoPages,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConsolidateError {
    /// Maps an I/O error on `path`, turning `NotFound` into [`ConsolidateError::SourceNotFound`].
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ConsolidateError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConsolidateError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsolidationOutcome {
    /// Destination already existed and skip-existing was on.
    Skipped,
    Copied,
    Merged { pages: usize, omitted: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub handle: Option<String>,
    #[serde(flatten)]
    pub outcome: ConsolidationOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    pub documents: Vec<DocumentReport>,
}

impl ConsolidationReport {
    pub fn failed(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, ConsolidationOutcome::Failed { .. }))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.documents.len() - self.failed()
    }
}

pub struct Consolidator<'a, M: PageMerger> {
    merger: &'a M,
    input_dir: &'a Path,
    output_dir: &'a Path,
    skip_existing: bool,
}

impl<'a, M: PageMerger> Consolidator<'a, M> {
    pub fn new(merger: &'a M, input_dir: &'a Path, output_dir: &'a Path, skip_existing: bool) -> Self {
        Self {
            merger,
            input_dir,
            output_dir,
            skip_existing,
        }
    }

    /// Processes every document in order, setting `file_link` on each one that
    /// ends up with an artifact.
    pub fn consolidate(&self, documents: &mut [Document]) -> ConsolidationReport {
        info!(
            documents = documents.len(),
            input_dir = %self.input_dir.display(),
            output_dir = %self.output_dir.display(),
            skip_existing = self.skip_existing,
            "Combining files"
        );

        let mut report = ConsolidationReport::default();
        for doc in documents.iter_mut() {
            let outcome = match self.consolidate_one(doc) {
                Ok((outcome, link)) => {
                    doc.file_link = Some(link);
                    outcome
                }
                Err(e) => {
                    error!(
                        handle = doc.handle().unwrap_or("<none>"),
                        error = %e,
                        "Could not consolidate document"
                    );
                    ConsolidationOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.documents.push(DocumentReport {
                handle: doc.document_handle.clone(),
                outcome,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Files combined"
        );
        report
    }

    fn consolidate_one(
        &self,
        doc: &Document,
    ) -> Result<(ConsolidationOutcome, PathBuf), ConsolidateError> {
        let handle = doc.handle().ok_or(ConsolidateError::MissingHandle)?;
        match doc.files.as_slice() {
            [] => Err(ConsolidateError::NoFiles),
            [single] => self.copy_single(handle, single),
            many => self.merge_many(handle, many),
        }
    }

    fn copy_single(
        &self,
        handle: &str,
        raw: &str,
    ) -> Result<(ConsolidationOutcome, PathBuf), ConsolidateError> {
        let source = resolve_source_path(self.input_dir, raw)?;
        let extension = file_extension(raw)?;
        let destination = self.output_dir.join(format!("{handle}.{extension}"));

        if self.skip_existing && destination.is_file() {
            debug!(handle, destination = %destination.display(), "Output exists, skipping copy");
            return Ok((ConsolidationOutcome::Skipped, destination));
        }

        copy_with_metadata(&source, &destination)?;
        debug!(handle, source = %source.display(), destination = %destination.display(), "Copied file");
        Ok((ConsolidationOutcome::Copied, destination))
    }

    fn merge_many(
        &self,
        handle: &str,
        files: &[String],
    ) -> Result<(ConsolidationOutcome, PathBuf), ConsolidateError> {
        let destination = self.output_dir.join(format!("{handle}.pdf"));

        if self.skip_existing && destination.is_file() {
            debug!(handle, destination = %destination.display(), "Output exists, skipping merge");
            return Ok((ConsolidationOutcome::Skipped, destination));
        }

        let mut pages = Vec::with_capacity(files.len());
        for raw in files {
            let opened = resolve_source_path(self.input_dir, raw)
                .and_then(|path| self.merger.open_page(&path));
            match opened {
                Ok(page) => pages.push(page),
                Err(e) => warn!(handle, file = %raw, error = %e, "Omitting page from merge"),
            }
        }

        let opened = pages.len();
        let omitted = files.len() - opened;
        self.merger.write_merged(pages, &destination)?;

        debug!(handle, pages = opened, omitted, destination = %destination.display(), "Merged files");
        Ok((
            ConsolidationOutcome::Merged {
                pages: opened,
                omitted,
            },
            destination,
        ))
    }
}

/// Consolidates with the PDF page merger.
pub fn consolidate(
    documents: &mut [Document],
    input_dir: &Path,
    output_dir: &Path,
    skip_existing: bool,
) -> ConsolidationReport {
    let merger = PdfPageMerger::default();
    Consolidator::new(&merger, input_dir, output_dir, skip_existing).consolidate(documents)
}

/// Resolves a dump path such as `VOL1\0001\42.tif` under `input_dir`,
/// dropping the leading volume segment.
pub fn resolve_source_path(input_dir: &Path, raw: &str) -> Result<PathBuf, ConsolidateError> {
    let (_volume, rest) = raw
        .split_once('\\')
        .ok_or_else(|| ConsolidateError::InvalidSourcePath(raw.to_string()))?;
    let mut path = input_dir.to_path_buf();
    path.extend(rest.split('\\').filter(|segment| !segment.is_empty()));
    Ok(path)
}

/// Everything after the first period of the final path segment.
fn file_extension(raw: &str) -> Result<&str, ConsolidateError> {
    let file_name = raw.rsplit('\\').next().unwrap_or(raw);
    match file_name.split_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext),
        _ => Err(ConsolidateError::MissingExtension(raw.to_string())),
    }
}

/// Copies bytes and permissions, then carries over access and modification times.
fn copy_with_metadata(source: &Path, destination: &Path) -> Result<(), ConsolidateError> {
    let metadata = fs::metadata(source).map_err(|e| ConsolidateError::from_io(source, e))?;
    fs::copy(source, destination).map_err(|e| ConsolidateError::from_io(source, e))?;

    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    OpenOptions::new()
        .write(true)
        .open(destination)
        .and_then(|file| file.set_times(times))
        .map_err(|source| ConsolidateError::Io {
            path: destination.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_source_path_drops_volume_and_splits_backslashes() {
        let path = resolve_source_path(Path::new("/data"), r"VOL7\0001\0002\42.tif").unwrap();
        assert_eq!(path, Path::new("/data/0001/0002/42.tif"));
    }

    #[test]
    fn resolve_source_path_requires_a_volume_segment() {
        let err = resolve_source_path(Path::new("/data"), "42.tif").unwrap_err();
        assert!(matches!(err, ConsolidateError::InvalidSourcePath(p) if p == "42.tif"));
    }

    #[test]
    fn extension_is_everything_after_first_period_of_file_name() {
        assert_eq!(file_extension(r"VOL.1\dir\scan.tif").unwrap(), "tif");
        assert_eq!(file_extension(r"VOL1\dir\report.final.docx").unwrap(), "final.docx");
        assert!(matches!(
            file_extension(r"VOL1\dir\README"),
            Err(ConsolidateError::MissingExtension(_))
        ));
    }

    #[test]
    fn report_counts_failures() {
        let report = ConsolidationReport {
            documents: vec![
                DocumentReport {
                    handle: Some("1".into()),
                    outcome: ConsolidationOutcome::Copied,
                },
                DocumentReport {
                    handle: None,
                    outcome: ConsolidationOutcome::Failed {
                        reason: "x".into(),
                    },
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }
}
