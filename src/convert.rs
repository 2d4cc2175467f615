//! High-level pipeline: load dump → parse → combine files → export tables.
//!
//! # Responsibilities
//! - Reads the dump named by the config and parses it into documents
//! - Optionally consolidates each document's files into the combined directory
//! - Runs each enabled exporter on the final document list
//! - Returns a [`ConversionSummary`] for the caller to report
//!
//! # Error Handling
//! Reading or parsing the dump aborts the run before any file is written.
//! Consolidation failures stay per document, export failures stay per
//! exporter; both are recorded in the summary instead of being returned.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::combine::{ConsolidationReport, Consolidator};
use crate::config::Config;
use crate::contract::{PageMerger, TabularExporter};
use crate::document::Document;
use crate::export::{CsvExporter, ExcelExporter};
use crate::images_to_pdf::PdfPageMerger;
use crate::import::{DumpParser, ImportError};
use crate::schema::{AttributeSchema, Column};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read dump {}: {source}", .path.display())]
    ReadDump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An exporter paired with the file it should write.
pub struct ExportTarget<'a> {
    pub exporter: &'a dyn TabularExporter,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub format: &'static str,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidation: Option<ConsolidationReport>,
    pub exports: Vec<ExportReport>,
}

/// Runs the whole conversion with the PDF merger and the CSV/Excel exporters.
pub fn convert(config: &Config) -> Result<(Vec<Document>, ConversionSummary), ConvertError> {
    let merger = PdfPageMerger::default();
    let (csv, excel) = (CsvExporter, ExcelExporter);

    let mut targets = Vec::new();
    if config.export.export_csv {
        targets.push(ExportTarget {
            exporter: &csv,
            destination: config.csv_path(),
        });
    }
    if config.export.export_excel {
        targets.push(ExportTarget {
            exporter: &excel,
            destination: config.excel_path(),
        });
    }

    convert_with(config, &merger, &targets)
}

/// Runs the conversion with the given merger and export targets.
pub fn convert_with<M: PageMerger>(
    config: &Config,
    merger: &M,
    targets: &[ExportTarget<'_>],
) -> Result<(Vec<Document>, ConversionSummary), ConvertError> {
    info!("[CONVERT] Starting OnBase data conversion");

    // Step 1: Import
    let dump_path = config.import_path();
    info!(path = %dump_path.display(), "[CONVERT][IMPORT] Reading dump");
    let raw = fs::read_to_string(&dump_path).map_err(|source| {
        error!(path = %dump_path.display(), error = %source, "[CONVERT][ERROR] Could not read dump");
        ConvertError::ReadDump {
            path: dump_path.clone(),
            source,
        }
    })?;

    let schema = AttributeSchema::onbase();
    let mut documents = DumpParser::new(&schema, config.import.schema_policy)
        .parse(&raw)
        .inspect_err(|e| error!(error = %e, "[CONVERT][ERROR] Import failed"))?;
    info!(documents = documents.len(), "[CONVERT][IMPORT] Import succeeded");

    // Step 2: Combine
    let consolidation = if config.combine.combine_files {
        let output_dir = &config.combine.combined_file_directory;
        ensure_dir(output_dir)?;
        let report = Consolidator::new(
            merger,
            &config.import.data_directory,
            output_dir,
            config.combine.combine_skip_existing,
        )
        .consolidate(&mut documents);
        Some(report)
    } else {
        info!("[CONVERT][COMBINE] Combining disabled, skipping");
        None
    };

    // Step 3: Export
    let columns = Column::export_columns(config.combine.combine_files);
    if !targets.is_empty() {
        ensure_dir(&config.export.export_directory)?;
    }
    let exports = run_exports(&documents, &columns, targets);

    let summary = ConversionSummary {
        documents: documents.len(),
        consolidation,
        exports,
    };
    match serde_json::to_string(&summary) {
        Ok(json) => debug!(json = %json, "[CONVERT][DEBUG] Conversion summary"),
        Err(e) => error!(error = ?e, "[CONVERT][DEBUG] Failed to serialize conversion summary"),
    }
    info!("[CONVERT] OnBase data conversion complete");
    Ok((documents, summary))
}

/// Runs every exporter; a failing exporter is recorded and the next one still runs.
pub fn run_exports(
    documents: &[Document],
    columns: &[Column],
    targets: &[ExportTarget<'_>],
) -> Vec<ExportReport> {
    targets
        .iter()
        .map(|target| {
            let format = target.exporter.format();
            let error = match target
                .exporter
                .export(documents, columns, &target.destination)
            {
                Ok(()) => {
                    info!(format, destination = %target.destination.display(), "[CONVERT][EXPORT] Export succeeded");
                    None
                }
                Err(e) => {
                    error!(format, destination = %target.destination.display(), error = %e, "[CONVERT][ERROR][EXPORT] Export failed");
                    Some(e.to_string())
                }
            };
            ExportReport {
                format,
                destination: target.destination.clone(),
                error,
            }
        })
        .collect()
}

fn ensure_dir(dir: &Path) -> Result<(), ConvertError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| {
        error!(path = %dir.display(), error = %source, "[CONVERT][ERROR] Failed to create directory");
        ConvertError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }
    })?;
    debug!(path = %dir.display(), "Created directory");
    Ok(())
}
