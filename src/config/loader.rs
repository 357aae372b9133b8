//! `KEY=VALUE` configuration file loader

use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.txt";

/// Raw key -> value mapping as read from the configuration file
#[derive(Debug, Clone, Default)]
pub struct RangeConfig {
    entries: HashMap<String, String>,
}

impl RangeConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load configuration from any reader
    ///
    /// Blank lines and `#` comments are ignored. The value is everything after
    /// the first `=`; a repeated key replaces the earlier value.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut config = Self::default();

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| AnalysisError::InvalidConfigLine {
                    line: index + 1,
                    content: line.clone(),
                })?;

            config.set(key.trim(), value.trim());
        }

        Ok(config)
    }

    /// Insert or replace a key
    pub fn set(&mut self, key: &str, value: &str) {
        log::debug!("{} | {}", key, value);
        if let Some(previous) = self.entries.insert(key.to_string(), value.to_string()) {
            log::debug!("Config key {} overrides earlier value {}", key, previous);
        }
    }

    /// Look up a required key
    pub fn get(&self, key: &str) -> Result<&str> {
        self.get_optional(key)
            .ok_or_else(|| AnalysisError::MissingConfigKey(key.to_string()))
    }

    /// Look up an optional key
    pub fn get_optional(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
