//! CSV and Excel writers for the document metadata table.

use std::path::Path;

use rust_xlsxwriter::{Url, Workbook, XlsxError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::TabularExporter;
use crate::document::Document;
use crate::schema::Column;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel export failed: {0}")]
    Excel(#[from] XlsxError),

    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),

    #[error("too many columns for a worksheet: {0}")]
    TooManyColumns(usize),
}

/// Excel-dialect CSV with `\n` line endings.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl TabularExporter for CsvExporter {
    fn format(&self) -> &'static str {
        "csv"
    }

    fn export(
        &self,
        documents: &[Document],
        columns: &[Column],
        destination: &Path,
    ) -> Result<(), ExportError> {
        info!(destination = %destination.display(), rows = documents.len(), "Writing data to CSV file");
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(destination)?;

        writer.write_record(columns.iter().map(|c| c.header()))?;
        for doc in documents {
            let row: Vec<String> = columns
                .iter()
                .map(|&c| doc.column_value(c).map(|v| v.into_owned()).unwrap_or_default())
                .collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;

        info!(destination = %destination.display(), "Data written to CSV file");
        Ok(())
    }
}

/// Single-worksheet `.xlsx`; the `File Link` column is written as hyperlinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelExporter;

impl TabularExporter for ExcelExporter {
    fn format(&self) -> &'static str {
        "excel"
    }

    fn export(
        &self,
        documents: &[Document],
        columns: &[Column],
        destination: &Path,
    ) -> Result<(), ExportError> {
        info!(destination = %destination.display(), rows = documents.len(), "Writing data to Excel file");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, column) in columns.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| ExportError::TooManyColumns(columns.len()))?;
            worksheet.write_string(0, col, column.header())?;
        }

        for (row, doc) in (1u32..).zip(documents) {
            for (col, &column) in (0u16..).zip(columns) {
                let Some(value) = doc.column_value(column) else {
                    continue;
                };
                if column == Column::FileLink {
                    let url = Url::new(file_url(&value)).set_text(&*value);
                    let written = worksheet.write_url(row, col, url).map(|_| ());
                    if let Err(e) = written {
                        debug!(link = %value, error = %e, "Link rejected, writing plain text");
                        worksheet.write_string(row, col, &*value)?;
                    }
                } else {
                    worksheet.write_string(row, col, &*value)?;
                }
            }
        }

        workbook.save(destination)?;
        info!(destination = %destination.display(), "Data written to Excel file");
        Ok(())
    }
}

/// `file:///` URL for a local path, made absolute against the working directory.
fn file_url(path: &str) -> String {
    let absolute = match std::path::absolute(path) {
        Ok(p) => p,
        Err(e) => {
            warn!(path, error = %e, "Could not make link absolute");
            Path::new(path).to_path_buf()
        }
    };
    let display = absolute.to_string_lossy().replace('\\', "/");
    format!("file:///{}", display.trim_start_matches('/'))
}
