use std::path::Path;

use super::types::Credentials;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    /// `.toml` files are TOML, everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

pub fn parse_credentials(contents: &str, format: FileFormat) -> Result<Credentials> {
    match format {
        FileFormat::Json => serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("invalid JSON credentials: {}", e))),
        FileFormat::Toml => toml::from_str(contents)
            .map_err(|e| Error::Config(format!("invalid TOML credentials: {}", e))),
    }
}

pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    parse_credentials(&contents, FileFormat::from_path(path))
}
