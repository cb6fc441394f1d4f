//! Theme archive extraction with path sanitization and content scanning.
//!
//! Archive contents are attacker-controlled: any merchant account can upload
//! a ZIP, and the extracted tree is later rendered for arbitrary visitors.
//! Every entry therefore passes three gates before touching disk:
//!
//! - `sanitize.rs` - path normalization and traversal rejection (zip-slip)
//! - `scan.rs` - extension allow-list plus disallowed-pattern scanning
//! - `extract.rs` - the pipeline writing surviving entries into a staging
//!   directory, aborting whole on the first rejection
//!
//! Rejections are fail-closed: a single hostile entry marks the entire
//! archive as hostile, and the caller's staging workspace removes every
//! byte that was written.

pub use error::{Error, Result};
pub use extract::{extract_theme_archive, ZipSource};
pub use options::ExtractOptions;
pub use report::{EntryOutcome, EntryRecord, ExtractionReport};
pub use sanitize::{sanitize_entry_path, SanitizedPath};
pub use scan::{classify, scan_text, FileKind};

mod error;
mod extract;
mod options;
mod report;
mod sanitize;
mod scan;
