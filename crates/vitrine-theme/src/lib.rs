//! Theme lifecycle: validated install, atomic replace, delete, render.
//!
//! The committed tree on disk is the source of truth for whether a theme is
//! valid: every commit re-checks the structural contract on the staged tree
//! immediately before the swap, so the registry can never point at a
//! half-written or rejected directory.

pub use error::{Error, Result};
pub use manifest::Manifest;
pub use registry::{Registry, ThemeRecord};
pub use service::ThemeService;
pub use validate::{validate_staged, ValidationError, MANIFEST_FILE, REQUIRED_DIRS};

mod error;
mod manifest;
mod registry;
mod service;
mod validate;
