use std::path::Path;

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::error::{Error, Result};

/// Classification of an entry by its extension.
///
/// The allow-list is deliberately conservative about what gets *scanned*
/// and permissive about what gets *ignored*: unknown auxiliary files
/// (editor droppings, OS metadata) are skipped without failing the install,
/// because an unwritten file poses no execution risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Allow-listed text type; content is decoded and pattern-scanned.
    Text,
    /// Allow-listed binary type (images, fonts); size-checked only.
    Binary,
    /// Not on the allow-list; silently skipped, never written.
    Disallowed,
}

const TEXT_EXTENSIONS: &[&str] = &[
    "tpl", "html", "htm", "css", "js", "json", "svg", "txt", "md",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "woff", "woff2", "ttf", "otf", "eot",
];

/// Patterns that indicate an attempt to smuggle executable logic into a
/// declarative template. Best-effort layer, not a guarantee; the render
/// path sanitizes raw HTML again as defense in depth.
///
/// Two tiers: the markup-injection set applies to every scanned file, while
/// the script/DOM set is skipped for extensions that only ever hold prose
/// or styles, where "edit this document. Then" or a `.window .title`
/// selector chain would be a false hit.
static MARKUP_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)<\s*script",
        r"(?i)<\s*/\s*script",
        r"(?i)javascript\s*:",
        r"(?i)\bon(load|error|click|mouseover|focus|submit)\s*=",
        r"(?i)\bsrcdoc\s*=",
    ])
    .expect("markup pattern set must compile")
});

static SCRIPT_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\beval\s*\(",
        r"(?i)\bnew\s+Function\s*\(",
        r"(?i)\bFunction\s*\(",
        r"(?i)\bdocument\s*\.",
        r"(?i)\bwindow\s*\.",
        r"(?i)\bglobalThis\b",
        r"(?i)\binnerHTML\b",
        r#"(?i)\bset(Timeout|Interval)\s*\(\s*["']"#,
        r"(?i)\bimport\s*\(",
    ])
    .expect("script pattern set must compile")
});

const MARKUP_ONLY_EXTENSIONS: &[&str] = &["md", "txt", "css"];

/// Classify an entry path by extension.
pub fn classify(path: &Path) -> FileKind {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return FileKind::Disallowed,
    };
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Text
    } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Binary
    } else {
        FileKind::Disallowed
    }
}

/// Scan the raw bytes of an allow-listed text entry.
///
/// Non-UTF-8 content is a rejection in its own right: a text-typed file
/// that does not decode cannot be scanned, and an unscannable file in a
/// scannable slot is treated as hostile. A pattern hit aborts the whole
/// attempt; the matched pattern is logged server-side only, so the error a
/// client sees never becomes a feedback oracle for probing the scanner.
pub fn scan_text(entry: &Path, content: &[u8]) -> Result<()> {
    let text = std::str::from_utf8(content).map_err(|_| Error::EncodingInvalid {
        entry: entry.to_path_buf(),
    })?;

    scan_against(entry, text, &MARKUP_PATTERNS)?;

    let ext = entry
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !MARKUP_ONLY_EXTENSIONS.contains(&ext.as_str()) {
        scan_against(entry, text, &SCRIPT_PATTERNS)?;
    }

    Ok(())
}

fn scan_against(entry: &Path, text: &str, patterns: &RegexSet) -> Result<()> {
    let matches = patterns.matches(text);
    if let Some(index) = matches.iter().next() {
        tracing::warn!(
            entry = %entry.display(),
            pattern = patterns.patterns()[index],
            "disallowed pattern in theme archive entry"
        );
        return Err(Error::MaliciousContent {
            entry: entry.to_path_buf(),
        });
    }
    Ok(())
}
