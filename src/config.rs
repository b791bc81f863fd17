use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::shape::RangePolicy;

const DEFAULT_DOCUMENTS_FILE_NAME: &str = "documents.jsonl";

fn default_sample_interval() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for one run, read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    /// Source `.osm` file. A `.xz` suffix is decompressed on the fly.
    pub data_path: PathBuf,
    pub sample_path: PathBuf,
    #[serde(default = "default_sample_interval")]
    pub sample_interval: usize,
    /// JSON-lines file that receives the documents. See [`UserConfig::documents_path`].
    #[serde(default)]
    pub documents_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub inclusive_ranges: bool,
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<UserConfig> {
        let file = File::open(path)
            .map_err(|err| Error::config(format!("Could not open config file {}: {}", path.display(), err)))?;
        let config: UserConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::config(format!("Could not parse config: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<UserConfig> {
        let config: UserConfig = serde_json::from_str(text)
            .map_err(|err| Error::config(format!("Could not parse config: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sample_interval()?;
        Ok(())
    }

    pub fn sample_interval(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.sample_interval)
            .ok_or_else(|| Error::config("sample_interval must be a positive integer"))
    }

    /// Configured documents file, or `documents.jsonl` next to the sample.
    pub fn documents_path(&self) -> PathBuf {
        match &self.documents_path {
            Some(path) => path.clone(),
            None => self
                .sample_path
                .with_file_name(DEFAULT_DOCUMENTS_FILE_NAME),
        }
    }

    pub fn range_policy(&self) -> RangePolicy {
        if self.inclusive_ranges {
            RangePolicy::Inclusive
        } else {
            RangePolicy::HalfOpen
        }
    }
}
