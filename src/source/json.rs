//! Reel list from a JSON file on disk (fixtures, offline demos).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{ReelItem, ReelSource, parse_reels};

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReelSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<ReelItem>> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read reels file: {}", self.path.display()))?;
        parse_reels(&raw).with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
