//! FORCE-style parameter files (`NAME = VALUE` per line).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Value meaning "not set".
pub const NULL_VALUE: &str = "NULL";

/// Parsed parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterFile {
    values: BTreeMap<String, String>,
}

impl ParameterFile {
    /// Parse parameter file text.
    ///
    /// Blank lines and lines starting with `#`, `+` or whitespace are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty()
                || line.starts_with(['#', '+'])
                || line.starts_with(char::is_whitespace)
            {
                continue;
            }
            let (name, value) = line.split_once('=').ok_or_else(|| Error::MalformedLine {
                line: idx + 1,
                content: line.to_string(),
            })?;
            values.insert(name.trim().to_string(), value.trim().to_string());
        }
        Ok(Self { values })
    }

    /// Read and parse a parameter file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Builder-style insert, mainly for tests and overrides.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    /// Value of `name`, `None` when absent, empty or `NULL`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty() && *v != NULL_VALUE)
    }

    /// Whether `name` is present and explicitly set to `NULL`.
    pub fn is_null(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| v == NULL_VALUE)
    }

    /// Value of `name`, or a missing-parameter error.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    /// Parse an optional value.
    pub fn parse_opt<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.get(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| Error::config(name, format!("cannot parse {v:?}")))
            })
            .transpose()
    }

    /// Parse a whitespace separated list; absent means empty.
    pub fn parse_list<T: FromStr>(&self, name: &str) -> Result<Vec<T>> {
        self.get(name)
            .map(|v| {
                v.split_whitespace()
                    .map(|token| {
                        token
                            .parse::<T>()
                            .map_err(|_| Error::config(name, format!("cannot parse {token:?}")))
                    })
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse tile-list text: one id per line, lines not starting with `X` skipped.
pub fn parse_tile_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('X'))
        .map(str::to_string)
        .collect()
}

/// Read a tile-list file.
pub fn read_tile_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(parse_tile_list(&std::fs::read_to_string(path)?))
}
