use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::import::SchemaPolicy;

/// Settings for one conversion run. Every key has a default, so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportSection,
    pub export: ExportSection,
    pub combine: CombineSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    /// Root that `FileName` paths are resolved against.
    pub data_directory: PathBuf,
    /// The dump file. Relative paths are taken from `data_directory`.
    pub import_file_path: PathBuf,
    pub schema_policy: SchemaPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub export_directory: PathBuf,
    pub export_csv: bool,
    pub csv_export_filename: String,
    pub export_excel: bool,
    pub excel_export_filename: String,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            export_directory: PathBuf::new(),
            export_csv: true,
            csv_export_filename: "onbase_data.csv".to_string(),
            export_excel: true,
            excel_export_filename: "onbase_data.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineSection {
    pub combine_files: bool,
    pub combined_file_directory: PathBuf,
    pub combine_skip_existing: bool,
}

impl Default for CombineSection {
    fn default() -> Self {
        Self {
            combine_files: true,
            combined_file_directory: PathBuf::new(),
            combine_skip_existing: false,
        }
    }
}

impl Config {
    pub fn import_path(&self) -> PathBuf {
        self.import.data_directory.join(&self.import.import_file_path)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.export.export_directory.join(&self.export.csv_export_filename)
    }

    pub fn excel_path(&self) -> PathBuf {
        self.export.export_directory.join(&self.export.excel_export_filename)
    }

    pub fn trace_loaded(&self) {
        info!(
            import_path = %self.import_path().display(),
            schema_policy = ?self.import.schema_policy,
            combine_files = self.combine.combine_files,
            export_csv = self.export.export_csv,
            export_excel = self.export.export_excel,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
