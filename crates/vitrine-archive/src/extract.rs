use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::report::{EntryOutcome, EntryRecord, ExtractionReport};
use crate::sanitize::sanitize_entry_path;
use crate::scan::{classify, scan_text, FileKind};

/// Lazy entry source over a ZIP byte stream.
///
/// Entries are enumerated through the central directory and decompressed
/// one at a time; nothing beyond the entry currently being processed is
/// held in memory.
pub struct ZipSource<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader).map_err(|_| Error::Corrupt)?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

fn is_symlink_mode(mode: Option<u32>) -> bool {
    mode.is_some_and(|m| m & 0o170000 == 0o120000)
}

/// Drive every archive entry through sanitize -> classify -> scan -> write,
/// stopping at the first rejection.
///
/// Writes go only under `staging`; the caller owns the staging directory
/// (normally a [`vitrine_fs::Workspace`]) and deletes it on any error path,
/// so "all entries pass or nothing is kept" holds without this function
/// doing its own cleanup.
pub fn extract_theme_archive<R: Read + Seek>(
    reader: R,
    staging: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    let mut source = ZipSource::new(reader)?;
    let mut report = ExtractionReport::default();

    for index in 0..source.len() {
        let mut file = source.archive.by_index(index).map_err(|_| Error::Corrupt)?;
        let declared = file.name().to_string();

        // A symlink can alias any path after commit, which defeats the
        // prefix check entirely; it is a traversal, not a skippable type.
        if is_symlink_mode(file.unix_mode()) {
            return Err(Error::PathTraversal {
                entry: declared.into(),
            });
        }

        if file.is_dir() {
            // Some zip tools emit a "./" entry for the root; nothing to do.
            let Some(sanitized) = sanitize_entry_path(&declared, staging)? else {
                continue;
            };
            std::fs::create_dir_all(&sanitized.resolved).map_err(|e| {
                Error::ExtractionFailed {
                    path: sanitized.resolved.clone(),
                    source: e,
                }
            })?;
            report.entries.push(EntryRecord {
                path: sanitized.original,
                size: 0,
                outcome: EntryOutcome::Written,
            });
            continue;
        }

        // A file entry cannot land on the root itself.
        let Some(sanitized) = sanitize_entry_path(&declared, staging)? else {
            return Err(Error::PathTraversal {
                entry: declared.into(),
            });
        };

        let kind = classify(&sanitized.resolved);
        if kind == FileKind::Disallowed {
            tracing::debug!(entry = %declared, "skipping disallowed file type");
            report.entries.push(EntryRecord {
                path: sanitized.original,
                size: file.size(),
                outcome: EntryOutcome::SkippedDisallowedType,
            });
            continue;
        }

        if file.size() > options.max_entry_bytes {
            return Err(Error::EntryTooLarge {
                entry: sanitized.original,
                size: file.size(),
                limit: options.max_entry_bytes,
            });
        }

        // Bounded read: the declared size is untrusted, so the cap is
        // enforced on the actual decompressed bytes as well.
        let mut content = Vec::with_capacity(file.size().min(64 * 1024) as usize);
        let read = file
            .by_ref()
            .take(options.max_entry_bytes + 1)
            .read_to_end(&mut content)
            .map_err(|e| Error::ExtractionFailed {
                path: sanitized.resolved.clone(),
                source: e,
            })?;
        if read as u64 > options.max_entry_bytes {
            return Err(Error::EntryTooLarge {
                entry: sanitized.original,
                size: read as u64,
                limit: options.max_entry_bytes,
            });
        }

        report.written_bytes += read as u64;
        if report.written_bytes > options.max_total_bytes {
            return Err(Error::ArchiveTooLarge {
                size: report.written_bytes,
                limit: options.max_total_bytes,
            });
        }

        if kind == FileKind::Text {
            scan_text(&sanitized.original, &content)?;
        }

        if let Some(parent) = sanitized.resolved.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::ExtractionFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        std::fs::write(&sanitized.resolved, &content).map_err(|e| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source: e,
        })?;

        report.entries.push(EntryRecord {
            path: sanitized.original,
            size: read as u64,
            outcome: EntryOutcome::Written,
        });
    }

    Ok(report)
}
