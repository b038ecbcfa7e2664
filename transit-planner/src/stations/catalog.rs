//! Network catalog loading.
//!
//! Reads the static network (lines with their ordered stations) from a JSON
//! file at startup. Any problem here is fatal: the server refuses to start
//! rather than plan over a malformed network.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{NetworkError, TransitLine};

use super::StationIndex;

/// Errors that can occur while loading the network catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog is not valid JSON or has the wrong shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog parsed but describes an invalid network
    #[error("invalid network: {0}")]
    Network(#[from] NetworkError),
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct NetworkCatalog {
    lines: Vec<TransitLine>,
}

/// Parse a catalog from a JSON string.
pub fn parse_catalog(json: &str) -> Result<Vec<TransitLine>, CatalogError> {
    let catalog: NetworkCatalog = serde_json::from_str(json)?;
    Ok(catalog.lines)
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<TransitLine>, CatalogError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&contents)
}

/// Read a catalog file and build a station index from it.
pub fn load_index(path: &Path) -> Result<StationIndex, CatalogError> {
    let lines = load_catalog(path)?;
    Ok(StationIndex::from_lines(lines)?)
}
