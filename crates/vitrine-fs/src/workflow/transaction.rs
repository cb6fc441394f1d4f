use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// An exclusive lock over a state file, held for the lifetime of the
/// transaction. Serializes registry mutations across threads and processes.
///
/// The flock lives on a `.lock` sibling rather than the state file itself:
/// `write` replaces the state file by rename, which would strand the lock
/// on the orphaned inode.
pub struct Transaction {
    lock_file: File,
    path: PathBuf,
}

impl Transaction {
    fn open(path: &Path) -> Result<File> {
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::Write {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn open_lock_file(path: &Path) -> Result<File> {
        let mut lock_path = path.to_path_buf().into_os_string();
        lock_path.push(".lock");
        Self::open(lock_path.as_ref())
    }

    pub fn open_locked(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_file = Self::open_lock_file(&path)?;
        lock_file.lock_exclusive().map_err(|e| Error::Lock {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self { lock_file, path })
    }

    /// A read-only transaction: shared lock, so any number of readers
    /// proceed together while still excluding in-flight writers. Callers
    /// must not `write` through a shared transaction.
    pub fn open_shared(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_file = Self::open_lock_file(&path)?;
        fs2::FileExt::lock_shared(&lock_file).map_err(|e| Error::Lock {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self { lock_file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file; a file that does not exist yet reads as empty.
    pub fn read(&self) -> Result<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    pub fn write(&self, data: &[u8]) -> Result<()> {
        crate::primitives::atomic_write(&self.path, data)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_shared_transactions_coexist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let tx = Transaction::open_locked(&path).unwrap();
            tx.write(b"data").unwrap();
        }

        // Two shared holders at once; neither blocks the other.
        let a = Transaction::open_shared(&path).unwrap();
        let b = Transaction::open_shared(&path).unwrap();
        assert_eq!(a.read().unwrap(), b"data");
        assert_eq!(b.read().unwrap(), b"data");
    }

    #[test]
    fn test_read_before_first_write_is_empty() {
        let dir = tempdir().unwrap();
        let tx = Transaction::open_locked(dir.path().join("state.json")).unwrap();
        assert!(tx.read().unwrap().is_empty());
    }

    #[test]
    fn test_transaction_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let tx = Transaction::open_locked(&path).unwrap();
        tx.write(b"data").unwrap();
        assert_eq!(tx.read().unwrap(), b"data");
        assert_eq!(tx.path(), path);
    }
}
