use std::path::Path;

use crate::error::{Error, Result};
use crate::manifest::Manifest;

/// Top-level directories every theme package must ship.
pub const REQUIRED_DIRS: &[&str] = &["layout", "templates", "assets"];

/// Manifest location relative to the theme root.
pub const MANIFEST_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("theme archive missing required directory: {name}")]
    MissingDirectory { name: &'static str },

    #[error("{file} not found in theme archive", file = MANIFEST_FILE)]
    MissingManifest,

    #[error("{file} is not valid JSON: {0}", file = MANIFEST_FILE)]
    ManifestParse(#[source] serde_json::Error),

    #[error("{file} missing required field: {name}", file = MANIFEST_FILE)]
    MissingField { name: &'static str },
}

/// Check the structural contract of a staged (or committed) theme tree.
///
/// Runs after extraction and again immediately before every commit; a tree
/// that does not pass here never becomes a theme root. The caller owns
/// staging cleanup on the failure path.
pub fn validate_staged(dir: &Path) -> Result<Manifest> {
    for &name in REQUIRED_DIRS {
        if !dir.join(name).is_dir() {
            return Err(ValidationError::MissingDirectory { name }.into());
        }
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    let bytes = match std::fs::read(&manifest_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ValidationError::MissingManifest.into());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    Ok(Manifest::parse(&bytes)?)
}
