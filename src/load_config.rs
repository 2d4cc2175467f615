/// `load_config` module: reads the YAML settings file into a [`Config`] and
/// writes the default file for first-time setup.
///
/// # Responsibilities
/// - Parse the user-supplied YAML into typed sections; absent keys take their defaults
/// - Apply directory overrides from the environment after parsing
/// - Never overwrite an existing settings file when initialising
///
/// # Errors
/// All errors use `anyhow::Error` with the offending path in the message, and
/// are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;

pub const DATA_DIRECTORY_ENV: &str = "ONBASE_DATA_DIRECTORY";
pub const EXPORT_DIRECTORY_ENV: &str = "ONBASE_EXPORT_DIRECTORY";
pub const COMBINED_FILE_DIRECTORY_ENV: &str = "ONBASE_COMBINED_FILE_DIRECTORY";

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: Config = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    apply_env_overrides(&mut config);
    config.trace_loaded();
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    let overrides: [(&str, &mut PathBuf); 3] = [
        (DATA_DIRECTORY_ENV, &mut config.import.data_directory),
        (EXPORT_DIRECTORY_ENV, &mut config.export.export_directory),
        (
            COMBINED_FILE_DIRECTORY_ENV,
            &mut config.combine.combined_file_directory,
        ),
    ];
    for (var, slot) in overrides {
        if let Ok(value) = std::env::var(var) {
            info!(var, value = %value, "Overriding directory from environment");
            *slot = PathBuf::from(value);
        }
    }
}

/// Writes the default config to `path` unless a file is already there.
/// Returns `true` if a new file was created.
pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path_ref = path.as_ref();
    let yaml = serde_yaml::to_string(&Config::default())
        .context("Failed to serialise default config")?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path_ref) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!(config_path = ?path_ref, "Config file already exists, leaving it untouched");
            return Ok(false);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create config file {:?}", path_ref));
        }
    };
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config file {:?}", path_ref))?;

    info!(config_path = ?path_ref, "Wrote default config file");
    Ok(true)
}
