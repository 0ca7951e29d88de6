//! Batch ingestion configuration

use crate::output::DEFAULT_LINE_WIDTH;
use biorecord_common::{BiorecordError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default input file suffix for batch runs
pub const DEFAULT_SUFFIX: &str = ".gz";

/// Default output directory for batch runs
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Upper bound on worker tasks
pub const MAX_CONCURRENCY: usize = 256;

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Files decoded at the same time
    pub concurrency: usize,
    /// Only files whose name ends with this suffix are picked up
    pub suffix: String,
    pub output_dir: PathBuf,
    /// FASTA line width (0 = unwrapped)
    pub line_width: usize,
    pub compress_output: bool,
    /// Stop after this many records per file
    pub limit: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            suffix: DEFAULT_SUFFIX.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            line_width: DEFAULT_LINE_WIDTH,
            compress_output: true,
            limit: None,
        }
    }
}

impl IngestConfig {
    /// Defaults overridden by `BIORECORD_*` variables (a `.env` file is loaded first)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::default().merge_env()
    }

    /// Apply `BIORECORD_*` variables on top of `self`
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(value) = env_var("BIORECORD_CONCURRENCY") {
            self.concurrency = parse_number("BIORECORD_CONCURRENCY", &value)?;
        }
        if let Some(value) = env_var("BIORECORD_SUFFIX") {
            self.suffix = value;
        }
        if let Some(value) = env_var("BIORECORD_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = env_var("BIORECORD_LINE_WIDTH") {
            self.line_width = parse_number("BIORECORD_LINE_WIDTH", &value)?;
        }
        if let Some(value) = env_var("BIORECORD_COMPRESS") {
            self.compress_output = parse_bool("BIORECORD_COMPRESS", &value)?;
        }
        if let Some(value) = env_var("BIORECORD_LIMIT") {
            self.limit = Some(parse_number("BIORECORD_LIMIT", &value)?);
        }
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress_output = compress;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Extension appended to every output file name
    pub fn compression_suffix(&self) -> &'static str {
        if self.compress_output {
            ".gz"
        } else {
            ""
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BiorecordError::config("concurrency must be greater than 0"));
        }
        if self.concurrency > MAX_CONCURRENCY {
            return Err(BiorecordError::config(format!(
                "concurrency ({}) cannot exceed {}",
                self.concurrency, MAX_CONCURRENCY
            )));
        }
        if self.suffix.is_empty() {
            return Err(BiorecordError::config("input suffix cannot be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(BiorecordError::config("output directory cannot be empty"));
        }
        if self.limit == Some(0) {
            return Err(BiorecordError::config("record limit must be greater than 0"));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| BiorecordError::config(format!("{key}: expected a number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BiorecordError::config(format!("{key}: expected a boolean, got '{value}'"))),
    }
}
