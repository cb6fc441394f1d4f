use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use vitrine_archive::{extract_theme_archive, ExtractOptions};
use vitrine_fs::Workspace;
use vitrine_render::{Context, Renderer};

use crate::error::{Error, Result};
use crate::registry::{Registry, ThemeRecord};
use crate::validate::validate_staged;

const STAGING_DIR: &str = ".staging";
const INDEX_TEMPLATE: &str = "index.tpl";

/// The install/replace/remove/render surface over one `THEMES_ROOT`.
///
/// Mutations against the same theme id are serialized through a per-id
/// lock; different ids proceed in parallel. Renders never take the per-id
/// lock — the atomic directory swap is what keeps them consistent.
pub struct ThemeService {
    registry: Registry,
    renderer: Renderer,
    options: ExtractOptions,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThemeService {
    pub fn new(themes_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            registry: Registry::new(themes_root)?,
            renderer: Renderer::new(),
            options: ExtractOptions::default(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries nobody holds anymore (strong count 1 = the map's own Arc)
        // are dropped here, so generated ids cannot grow the map forever.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(id.to_string()).or_default().clone()
    }

    #[cfg(test)]
    fn locks_len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    /// Stage, scan, and validate one uploaded archive. On any error the
    /// workspace has already deleted everything it wrote.
    fn stage_archive<R: Read + Seek>(
        &self,
        id: &str,
        archive: R,
    ) -> Result<(Workspace, crate::Manifest)> {
        let staging = self
            .registry
            .themes_root()
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string());
        let workspace = Workspace::new(&staging, self.registry.new_version_path(id))?;

        extract_theme_archive(archive, workspace.path(), &self.options)?;
        let manifest = validate_staged(workspace.path())?;

        Ok((workspace, manifest))
    }

    /// Install a new theme from an uploaded ZIP.
    ///
    /// The id is fixed before extraction so the destination directory name
    /// is known up front; callers may supply a slug, otherwise a uuid is
    /// generated.
    pub fn install<R: Read + Seek>(&self, id: Option<String>, archive: R) -> Result<ThemeRecord> {
        let id = match id {
            Some(id) => check_id(id)?,
            None => uuid::Uuid::new_v4().to_string(),
        };
        let lock = self.lock_for(&id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Early out before extraction; the registry re-checks under its
        // own transaction at commit.
        if self.registry.get(&id)?.is_some() {
            return Err(Error::Conflict { id });
        }

        let (workspace, manifest) = self.stage_archive(&id, archive)?;
        self.registry.install(&id, workspace, manifest)
    }

    /// Replace an existing theme's content wholesale.
    pub fn replace<R: Read + Seek>(&self, id: &str, archive: R) -> Result<ThemeRecord> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.registry.get(id)?.is_none() {
            return Err(Error::NotFound { id: id.to_string() });
        }

        let (workspace, manifest) = self.stage_archive(id, archive)?;
        let record = self.registry.replace(id, workspace, manifest)?;

        // Only after the swap is durable; renders from here on compile the
        // new tree.
        self.renderer.invalidate(id);
        Ok(record)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.registry.remove(id)?;
        self.renderer.invalidate(id);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<ThemeRecord> {
        self.registry
            .get(id)?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    pub fn list(&self) -> Result<Vec<ThemeRecord>> {
        self.registry.list()
    }

    /// Render a template from a theme's committed root.
    pub fn render(&self, id: &str, template_name: &str, context: &Context) -> Result<String> {
        let record = self.get(id)?;
        Ok(self
            .renderer
            .render(&record.id, &record.root_path, template_name, context)?)
    }

    /// Render the theme's index template with a synthetic storefront
    /// context, for admin preview.
    pub fn render_preview(&self, id: &str) -> Result<String> {
        let record = self.get(id)?;
        let context = preview_context(&record);
        Ok(self
            .renderer
            .render(&record.id, &record.root_path, INDEX_TEMPLATE, &context)?)
    }
}

fn check_id(id: String) -> Result<String> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(id)
    } else {
        Err(Error::InvalidId { id })
    }
}

fn preview_context(record: &ThemeRecord) -> Context {
    let mut context = Context::new();
    context.insert("store", &serde_json::json!({ "name": "Preview Store" }));
    context.insert("theme", &record.metadata);
    context.insert(
        "products",
        &serde_json::json!([
            { "title": "Sample Product", "price": "19.00" },
            { "title": "Another Product", "price": "42.50" },
        ]),
    );
    context
}
