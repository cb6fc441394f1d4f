use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Normalize an untrusted entry path against a fixed extraction root and
/// verify the result stays inside it.
///
/// Archives are produced by arbitrary tools on arbitrary platforms, so the
/// declared path is treated as hostile text, not as a `Path`:
///
/// - backslashes are taken as separators (Windows-built archives)
/// - empty components and `.` are dropped
/// - `..` is resolved against a component stack; popping past the top means
///   the entry points outside the root and the whole archive is rejected
/// - absolute paths, drive prefixes, and NUL bytes are rejected outright
///
/// A traversal entry is evidence the archive was constructed adversarially,
/// so the error aborts the entire extraction attempt rather than skipping
/// the one entry.
///
/// Returns `Ok(None)` when the path normalizes to the extraction root
/// itself (`.` / `./`), which some archive tools emit as a directory entry;
/// there is nothing to write for it and the caller decides whether a no-op
/// is acceptable for the entry's kind.
pub fn sanitize_entry_path(entry_path: &str, root: &Path) -> Result<Option<SanitizedPath>> {
    let original = PathBuf::from(entry_path);

    if entry_path.contains('\0') {
        return Err(Error::PathTraversal { entry: original });
    }

    let normalized = entry_path.replace('\\', "/");

    // Absolute unix path or dos drive prefix ("C:...").
    if normalized.starts_with('/') || normalized.as_bytes().get(1) == Some(&b':') {
        return Err(Error::PathTraversal { entry: original });
    }

    let mut stack: Vec<&str> = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(Error::PathTraversal { entry: original });
                }
            }
            part => stack.push(part),
        }
    }

    if stack.is_empty() {
        return Ok(None);
    }

    let mut resolved = root.to_path_buf();
    for part in &stack {
        resolved.push(part);
    }

    // Belt-and-suspenders after the component walk.
    if !resolved.starts_with(root) || resolved == root {
        return Err(Error::PathTraversal { entry: original });
    }

    Ok(Some(SanitizedPath { original, resolved }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        Path::new("/srv/themes/staging-a1")
    }

    #[test]
    fn plain_relative_path() {
        let sanitized = sanitize_entry_path("templates/index.tpl", root())
            .unwrap()
            .unwrap();
        assert_eq!(sanitized.original, Path::new("templates/index.tpl"));
        assert_eq!(
            sanitized.resolved,
            Path::new("/srv/themes/staging-a1/templates/index.tpl")
        );
    }

    #[test]
    fn windows_separators_normalized() {
        let sanitized = sanitize_entry_path("assets\\css\\site.css", root())
            .unwrap()
            .unwrap();
        assert_eq!(
            sanitized.resolved,
            Path::new("/srv/themes/staging-a1/assets/css/site.css")
        );
    }

    #[test]
    fn empty_and_curdir_components_dropped() {
        let sanitized = sanitize_entry_path("./assets//./logo.png", root())
            .unwrap()
            .unwrap();
        assert_eq!(
            sanitized.resolved,
            Path::new("/srv/themes/staging-a1/assets/logo.png")
        );
    }

    #[test]
    fn parent_dir_within_tree_resolves() {
        let sanitized = sanitize_entry_path("assets/../templates/page.tpl", root())
            .unwrap()
            .unwrap();
        assert_eq!(
            sanitized.resolved,
            Path::new("/srv/themes/staging-a1/templates/page.tpl")
        );
    }

    #[test]
    fn traversal_is_rejected_not_clamped() {
        let result = sanitize_entry_path("../../../etc/passwd", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn traversal_after_valid_prefix_rejected() {
        let result = sanitize_entry_path("assets/../../outside.txt", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn absolute_path_rejected() {
        let result = sanitize_entry_path("/etc/passwd", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn windows_absolute_path_rejected() {
        let result = sanitize_entry_path("C:\\Windows\\system32\\evil.dll", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn backslash_traversal_rejected() {
        let result = sanitize_entry_path("..\\..\\outside.txt", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn nul_byte_rejected() {
        let result = sanitize_entry_path("assets/a\0b.png", root());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn path_reducing_to_root_is_not_a_target() {
        assert!(sanitize_entry_path("./.", root()).unwrap().is_none());
        assert!(sanitize_entry_path(".", root()).unwrap().is_none());
        assert!(sanitize_entry_path("./", root()).unwrap().is_none());
    }

    #[test]
    fn empty_path_is_not_a_target() {
        assert!(sanitize_entry_path("", root()).unwrap().is_none());
    }
}
