use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A staging directory that is deleted on drop unless committed.
///
/// Extraction writes into the workspace; on success `commit` renames the
/// staging tree to its destination in a single atomic step, on any earlier
/// error the drop impl removes everything that was staged.
pub struct Workspace {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl Workspace {
    pub fn new(staging_dir: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Self> {
        let staging_path = staging_dir.as_ref().to_path_buf();
        let destination_path = destination.as_ref().to_path_buf();

        if !staging_path.exists() {
            std::fs::create_dir_all(&staging_path).map_err(|e| Error::Write {
                path: staging_path.clone(),
                source: e,
            })?;
        }

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Atomically rename the staging tree into the destination. The
    /// destination must not already exist; replacing a live tree is the
    /// caller's swap protocol, not a workspace concern.
    pub fn commit(mut self) -> Result<()> {
        crate::primitives::move_dir(&self.staging_path, &self.destination_path)?;
        self.committed = true;
        Ok(())
    }

    /// Delete the staging tree and consume the workspace.
    pub fn abort(self) {
        drop(self);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_dir_all(&self.staging_path);
        }
    }
}
