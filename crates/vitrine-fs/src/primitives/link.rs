use crate::{Error, Result};
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn symlink_impl(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_impl(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Create a directory symlink. Fails if `link` already exists.
pub fn symlink_dir(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();
    symlink_impl(target, link).map_err(|e| Error::Write {
        path: link.to_path_buf(),
        source: e,
    })
}

/// Point an existing (or new) directory symlink at `target` atomically:
/// the new link is created as a hidden sibling and renamed over the old
/// one, so a reader resolving the link at any instant sees either the old
/// target or the new one, never a missing link.
pub fn replace_symlink_dir(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();
    let parent = link.parent().ok_or_else(|| Error::Write {
        path: link.to_path_buf(),
        source: std::io::Error::other("no parent directory"),
    })?;

    let tmp = parent.join(format!(".lnk.{}.vitrine", uuid::Uuid::new_v4()));
    symlink_impl(target, &tmp).map_err(|e| Error::Write {
        path: tmp.clone(),
        source: e,
    })?;

    std::fs::rename(&tmp, link).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        Error::Rename {
            from: tmp,
            to: link.to_path_buf(),
            source: e,
        }
    })
}

/// Read where a directory symlink points.
pub fn read_link(link: impl AsRef<Path>) -> Result<PathBuf> {
    let link = link.as_ref();
    std::fs::read_link(link).map_err(|e| Error::Read {
        path: link.to_path_buf(),
        source: e,
    })
}

/// Remove a symlink itself, not its target.
pub fn remove_symlink(link: impl AsRef<Path>) -> Result<()> {
    let link = link.as_ref();
    std::fs::remove_file(link).map_err(|e| Error::Remove {
        path: link.to_path_buf(),
        source: e,
    })
}

/// Whether a symlink (or anything else) exists at `path` without following
/// it; `Path::exists` would traverse the link and lie about dangling ones.
pub fn entry_exists(path: impl AsRef<Path>) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_symlink_roundtrip() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("v1");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("file.txt"), "one").unwrap();
        let link = dir.path().join("current");

        symlink_dir(&target, &link).unwrap();
        assert_eq!(std::fs::read_to_string(link.join("file.txt")).unwrap(), "one");
        assert_eq!(read_link(&link).unwrap(), target);
    }

    #[test]
    fn test_replace_symlink_points_at_new_target() {
        let dir = tempdir().unwrap();
        let v1 = dir.path().join("v1");
        let v2 = dir.path().join("v2");
        std::fs::create_dir_all(&v1).unwrap();
        std::fs::create_dir_all(&v2).unwrap();
        std::fs::write(v1.join("file.txt"), "one").unwrap();
        std::fs::write(v2.join("file.txt"), "two").unwrap();

        let link = dir.path().join("current");
        symlink_dir(&v1, &link).unwrap();
        replace_symlink_dir(&v2, &link).unwrap();

        assert_eq!(std::fs::read_to_string(link.join("file.txt")).unwrap(), "two");
        assert_eq!(read_link(&link).unwrap(), v2);
    }

    #[test]
    fn test_remove_symlink_keeps_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("v1");
        std::fs::create_dir_all(&target).unwrap();
        let link = dir.path().join("current");
        symlink_dir(&target, &link).unwrap();

        remove_symlink(&link).unwrap();
        assert!(!entry_exists(&link));
        assert!(target.exists());
    }

    #[test]
    fn test_entry_exists_sees_dangling_link() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("current");
        symlink_dir(dir.path().join("gone"), &link).unwrap();
        assert!(entry_exists(&link));
        assert!(!link.exists());
    }
}
