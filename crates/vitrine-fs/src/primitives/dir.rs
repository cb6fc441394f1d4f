use crate::{Error, Result};
use std::path::Path;

/// Rename a directory. Fails if `to` already exists and is a non-empty
/// directory; callers that need swap semantics move the destination aside
/// first so live readers only ever see a complete tree.
pub fn move_dir(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let from = from.as_ref();
    let to = to.as_ref();
    std::fs::rename(from, to).map_err(|e| Error::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}

/// Recursively delete a directory, returning the error instead of
/// panicking; absent directories are not an error.
pub fn remove_dir_best_effort(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_dir_all(path).map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_move_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("file.txt"), "data").unwrap();

        move_dir(&src, &dest).unwrap();
        assert!(!src.exists());
        assert!(dest.join("file.txt").exists());
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let dir = tempdir().unwrap();
        remove_dir_best_effort(dir.path().join("nope")).unwrap();
    }

    #[test]
    fn test_remove_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("nested/file.txt"), "data").unwrap();
        remove_dir_best_effort(&target).unwrap();
        assert!(!target.exists());
    }
}
