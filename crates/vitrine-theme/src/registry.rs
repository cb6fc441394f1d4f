use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vitrine_fs::{primitives, Transaction, Workspace};

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::validate::validate_staged;

const RECORDS_FILE: &str = "themes.json";
const VERSIONS_DIR: &str = ".versions";

/// A persisted record for one installed theme.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub preview_image: String,
    pub root_path: PathBuf,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File-backed, id-keyed store of theme records plus their committed
/// directory roots.
///
/// Records live in `THEMES_ROOT/themes.json`, guarded by an exclusive
/// lock-file transaction for the duration of each mutation. Committed
/// trees live under `THEMES_ROOT/.versions/<id>.<uuid>`, and the stable
/// root `THEMES_ROOT/<id>` is a symlink to the current tree: replacing a
/// theme renames a fresh symlink over the old one, which is the single
/// atomic step the whole swap hinges on. A reader resolving the root at
/// any instant opens either the fully-old or the fully-new tree.
pub struct Registry {
    themes_root: PathBuf,
}

impl Registry {
    pub fn new(themes_root: impl Into<PathBuf>) -> Result<Self> {
        let themes_root = themes_root.into();
        std::fs::create_dir_all(themes_root.join(VERSIONS_DIR))?;
        Ok(Self { themes_root })
    }

    pub fn themes_root(&self) -> &Path {
        &self.themes_root
    }

    /// The stable committed root for a theme id (a symlink once installed).
    pub fn root_for(&self, id: &str) -> PathBuf {
        self.themes_root.join(id)
    }

    /// A fresh tree location for one commit attempt.
    pub fn new_version_path(&self, id: &str) -> PathBuf {
        self.themes_root
            .join(VERSIONS_DIR)
            .join(format!("{id}.{}", uuid::Uuid::new_v4()))
    }

    fn records_path(&self) -> PathBuf {
        self.themes_root.join(RECORDS_FILE)
    }

    fn load(tx: &Transaction) -> Result<BTreeMap<String, ThemeRecord>> {
        let bytes = tx.read()?;
        if bytes.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::Registry { source: e })
    }

    fn save(tx: &Transaction, records: &BTreeMap<String, ThemeRecord>) -> Result<()> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(|e| Error::Registry { source: e })?;
        tx.write(&bytes)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<ThemeRecord>> {
        let tx = Transaction::open_shared(self.records_path())?;
        Ok(Self::load(&tx)?.get(id).cloned())
    }

    pub fn list(&self) -> Result<Vec<ThemeRecord>> {
        let tx = Transaction::open_shared(self.records_path())?;
        Ok(Self::load(&tx)?.into_values().collect())
    }

    /// Commit a validated staging tree as a brand-new theme root.
    ///
    /// The structural contract is re-checked on the staged tree right
    /// before the commit: the filesystem, not the caller, decides whether
    /// the tree is installable.
    pub fn install(&self, id: &str, staging: Workspace, manifest: Manifest) -> Result<ThemeRecord> {
        let tx = Transaction::open_locked(self.records_path())?;
        let mut records = Self::load(&tx)?;

        let root = self.root_for(id);
        if records.contains_key(id) || primitives::entry_exists(&root) {
            return Err(Error::Conflict { id: id.to_string() });
        }

        validate_staged(staging.path())?;
        let version_path = staging.destination().to_path_buf();
        staging.commit()?;

        if let Err(e) = primitives::symlink_dir(&version_path, &root) {
            let _ = primitives::remove_dir_best_effort(&version_path);
            return Err(e.into());
        }

        let now = Utc::now();
        let record = ThemeRecord {
            id: id.to_string(),
            name: manifest.name,
            version: manifest.version,
            description: manifest.description,
            preview_image: manifest.preview_image,
            root_path: root.clone(),
            metadata: manifest.metadata,
            created_at: now,
            updated_at: now,
        };
        records.insert(id.to_string(), record.clone());
        if let Err(e) = Self::save(&tx, &records) {
            // The tree and link are already visible; take them back down so
            // a retry of the same id is not stuck behind the conflict check.
            self.rollback_install(&root, &version_path);
            return Err(e);
        }

        tracing::info!(id, name = %record.name, version = %record.version, "theme installed");
        Ok(record)
    }

    /// Undo a visible install commit whose record write failed: the root
    /// link and the committed tree come back down, leaving the id free.
    fn rollback_install(&self, root: &Path, version: &Path) {
        if let Err(e) = primitives::remove_symlink(root) {
            tracing::warn!(root = %root.display(), error = %e, "failed to remove theme root link during rollback");
        }
        if let Err(e) = primitives::remove_dir_best_effort(version) {
            tracing::warn!(path = %version.display(), error = %e, "failed to delete theme tree during rollback");
        }
    }

    /// Swap a validated staging tree in for an existing theme's root.
    ///
    /// The new tree is committed into `.versions/` first, then the root
    /// symlink is renamed onto it in one atomic step, and only after that
    /// is the old tree deleted. If the symlink flip fails the old tree is
    /// still intact and the new one is cleaned up.
    pub fn replace(&self, id: &str, staging: Workspace, manifest: Manifest) -> Result<ThemeRecord> {
        let tx = Transaction::open_locked(self.records_path())?;
        let mut records = Self::load(&tx)?;

        let Some(mut record) = records.get(id).cloned() else {
            return Err(Error::NotFound { id: id.to_string() });
        };

        validate_staged(staging.path())?;

        let root = self.root_for(id);
        let old_version = primitives::read_link(&root)?;
        let new_version = staging.destination().to_path_buf();
        staging.commit()?;

        if let Err(e) = primitives::replace_symlink_dir(&new_version, &root) {
            let _ = primitives::remove_dir_best_effort(&new_version);
            return Err(e.into());
        }

        record.name = manifest.name;
        record.version = manifest.version;
        record.description = manifest.description;
        record.preview_image = manifest.preview_image;
        record.metadata = manifest.metadata;
        record.updated_at = Utc::now();

        records.insert(id.to_string(), record.clone());
        if let Err(e) = Self::save(&tx, &records) {
            // Flip back so the persisted record keeps describing the tree
            // readers resolve.
            self.rollback_replace(&root, &old_version, &new_version);
            return Err(e);
        }

        // Only now that the record is durable does the old tree go away.
        if let Err(e) = primitives::remove_dir_best_effort(&old_version) {
            tracing::warn!(id, error = %e, "failed to delete replaced theme tree");
        }

        tracing::info!(id, version = %record.version, "theme replaced");
        Ok(record)
    }

    /// Undo a replace flip whose record write failed: point the root back
    /// at the old tree and drop the new one. The old tree still exists
    /// because it is only deleted after the record is durable.
    fn rollback_replace(&self, root: &Path, old_version: &Path, new_version: &Path) {
        if let Err(e) = primitives::replace_symlink_dir(old_version, root) {
            tracing::warn!(root = %root.display(), error = %e, "failed to restore theme root link during rollback");
        }
        if let Err(e) = primitives::remove_dir_best_effort(new_version) {
            tracing::warn!(path = %new_version.display(), error = %e, "failed to delete replacement theme tree during rollback");
        }
    }

    /// Delete a theme's record and its directory.
    ///
    /// The record is removed first under the lock; directory removal is
    /// best-effort afterwards, logged on failure, so the registry can never
    /// keep pointing at a deleted tree.
    pub fn remove(&self, id: &str) -> Result<()> {
        let tx = Transaction::open_locked(self.records_path())?;
        let mut records = Self::load(&tx)?;

        if records.remove(id).is_none() {
            return Err(Error::NotFound { id: id.to_string() });
        }
        Self::save(&tx, &records)?;

        let root = self.root_for(id);
        match primitives::read_link(&root) {
            Ok(version) => {
                if let Err(e) = primitives::remove_symlink(&root) {
                    tracing::warn!(id, error = %e, "failed to remove theme root link");
                }
                if let Err(e) = primitives::remove_dir_best_effort(&version) {
                    tracing::warn!(id, error = %e, "failed to delete theme tree");
                }
            }
            Err(e) => tracing::warn!(id, error = %e, "theme root link unreadable at delete"),
        }

        tracing::info!(id, "theme removed");
        Ok(())
    }
}
