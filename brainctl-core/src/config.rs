use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrainError, Result};
use crate::extract::{DateClock, ExtractOptions};
use crate::writer::PartLayout;

pub const INPUT_FILE: &str = "conversations.json";
pub const OUTPUT_BASE_NAME: &str = "Mahmoud_Master_Brain_2025";
pub const OUTPUT_EXT: &str = ".txt";
pub const MAX_FILE_SIZE_MB: u64 = 50;

/// Settings for one export run. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub base_name: String,
    pub extension: String,
    pub max_file_size_mb: u64,
    /// Exact byte budget; takes precedence over `max_file_size_mb`.
    pub max_bytes: Option<u64>,
    /// IANA zone for date labels, machine local time when unset.
    pub timezone: Option<String>,
    pub year: Option<i32>,
    pub strict: bool,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(INPUT_FILE),
            output_dir: PathBuf::from("."),
            base_name: OUTPUT_BASE_NAME.to_owned(),
            extension: OUTPUT_EXT.to_owned(),
            max_file_size_mb: MAX_FILE_SIZE_MB,
            max_bytes: None,
            timezone: None,
            year: None,
            strict: true,
        }
    }
}

impl BrainConfig {
    /// Load from an explicit file, or from ~/.brainctl/config.toml when it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just means built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(BrainError::config(format!(
                        "config not found at {:?}",
                        path
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get config file path: ~/.brainctl/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".brainctl/config.toml")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| BrainError::file(path, err))?;
        Self::from_toml(&content)
            .map_err(|err| BrainError::config(format!("{}: {}", path.display(), err)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|err| BrainError::config(format!("invalid TOML: {err}")))
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
            .unwrap_or_else(|| self.max_file_size_mb.saturating_mul(1024 * 1024))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bytes() == 0 {
            return Err(BrainError::config("part size limit must be greater than zero"));
        }
        if self.base_name.trim().is_empty() {
            return Err(BrainError::config("base_name must not be empty"));
        }
        DateClock::from_name(self.timezone.as_deref())?;
        Ok(())
    }

    pub fn layout(&self) -> PartLayout {
        PartLayout {
            output_dir: self.output_dir.clone(),
            base_name: self.base_name.clone(),
            extension: self.extension.clone(),
            max_bytes: self.max_bytes(),
        }
    }

    pub fn extract_options(&self) -> Result<ExtractOptions> {
        Ok(ExtractOptions {
            clock: DateClock::from_name(self.timezone.as_deref())?,
            strict: self.strict,
            year: self.year,
        })
    }
}
