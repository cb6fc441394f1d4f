//! Cached template rendering for committed theme roots.
//!
//! Templates are data, not code: the engine runs with autoescape on and a
//! fixed filter set, and the only way a template can emit unescaped markup
//! is through the `raw_html` filter, which routes everything through an
//! HTML sanitizer first. This is the defense-in-depth layer behind the
//! ingest-time content scanner.

pub use error::{Error, Result};
pub use tera::Context;

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use sha2::{Digest, Sha256};
use tera::Tera;

mod error;
mod filters;

const TEMPLATE_DIR: &str = "templates";

struct CachedTemplate {
    fingerprint: String,
    tera: Tera,
}

/// Keyed template cache over committed theme roots.
///
/// Cache entries are keyed by `(theme id, template name)` and carry a
/// content fingerprint, so a re-read that finds changed bytes recompiles
/// instead of serving stale output. Reads take a shared lock; unlimited
/// concurrent renders are safe against a committed root.
#[derive(Default)]
pub struct Renderer {
    cache: RwLock<HashMap<(String, String), CachedTemplate>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `template_name` from the theme's committed root.
    ///
    /// The root must be a committed tree; staging directories never reach
    /// this function. Template names are bare file names; anything with a
    /// separator in it does not exist as far as rendering is concerned.
    pub fn render(
        &self,
        theme_id: &str,
        root: &Path,
        template_name: &str,
        context: &Context,
    ) -> Result<String> {
        if template_name.contains('/') || template_name.contains('\\') || template_name.contains("..")
        {
            return Err(Error::TemplateMissing {
                name: template_name.to_string(),
            });
        }

        let path = root.join(TEMPLATE_DIR).join(template_name);
        let source = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::TemplateMissing {
                name: template_name.to_string(),
            },
            _ => Error::Io {
                path: path.clone(),
                source: e,
            },
        })?;
        let fingerprint = hex::encode(Sha256::digest(&source));

        let key = (theme_id.to_string(), template_name.to_string());

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(&key) {
                if cached.fingerprint == fingerprint {
                    return cached
                        .tera
                        .render(template_name, context)
                        .map_err(|e| Error::Render { source: e });
                }
            }
        }

        let source = String::from_utf8(source).map_err(|e| Error::Render {
            source: tera::Error::msg(format!("template is not UTF-8: {e}")),
        })?;
        let tera = compile(template_name, &source)?;
        let html = tera
            .render(template_name, context)
            .map_err(|e| Error::Render { source: e })?;

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(key, CachedTemplate { fingerprint, tera });

        Ok(html)
    }

    /// Drop every cache entry for a theme id. Called after a replace or
    /// remove commits, so no render can observe the old tree's templates.
    pub fn invalidate(&self, theme_id: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.retain(|(id, _), _| id != theme_id);
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.read().unwrap().len()
    }
}

const AUTOESCAPE_SUFFIXES: [&str; 3] = [".tpl", ".html", ".htm"];

fn compile(name: &str, source: &str) -> Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(AUTOESCAPE_SUFFIXES.to_vec());
    tera.register_filter("raw_html", filters::raw_html);
    tera.add_raw_template(name, source)
        .map_err(|e| Error::Render { source: e })?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_template(root: &Path, name: &str, source: &str) {
        let dir = root.join(TEMPLATE_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), source).unwrap();
    }

    #[test]
    fn renders_with_context() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "<h1>{{ store }}</h1>");
        let mut ctx = Context::new();
        ctx.insert("store", "Aurora Goods");

        let renderer = Renderer::new();
        let html = renderer
            .render("t1", dir.path(), "index.tpl", &ctx)
            .unwrap();
        assert_eq!(html, "<h1>Aurora Goods</h1>");
    }

    #[test]
    fn context_values_are_escaped() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "{{ store }}");
        let mut ctx = Context::new();
        ctx.insert("store", "<script>alert(1)</script>");

        let renderer = Renderer::new();
        let html = renderer
            .render("t1", dir.path(), "index.tpl", &ctx)
            .unwrap();
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn raw_html_filter_sanitizes() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "{{ body | raw_html | safe }}");
        let mut ctx = Context::new();
        ctx.insert("body", "<b>deal</b><script>steal()</script>");

        let renderer = Renderer::new();
        let html = renderer
            .render("t1", dir.path(), "index.tpl", &ctx)
            .unwrap();
        assert!(html.contains("<b>deal</b>"));
        assert!(!html.contains("script"));
    }

    #[test]
    fn missing_template() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(TEMPLATE_DIR)).unwrap();
        let renderer = Renderer::new();
        let result = renderer.render("t1", dir.path(), "nope.tpl", &Context::new());
        assert!(matches!(result, Err(Error::TemplateMissing { .. })));
    }

    #[test]
    fn template_name_with_separator_is_missing() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "x");
        let renderer = Renderer::new();
        for name in ["../index.tpl", "a/b.tpl", "..\\x.tpl"] {
            let result = renderer.render("t1", dir.path(), name, &Context::new());
            assert!(matches!(result, Err(Error::TemplateMissing { .. })));
        }
    }

    #[test]
    fn syntax_error_is_render_error() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "{% if %}broken");
        let renderer = Renderer::new();
        let result = renderer.render("t1", dir.path(), "index.tpl", &Context::new());
        assert!(matches!(result, Err(Error::Render { .. })));
    }

    #[test]
    fn cache_recompiles_on_content_change() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "v1");
        let renderer = Renderer::new();
        let ctx = Context::new();

        assert_eq!(
            renderer.render("t1", dir.path(), "index.tpl", &ctx).unwrap(),
            "v1"
        );
        write_template(dir.path(), "index.tpl", "v2");
        assert_eq!(
            renderer.render("t1", dir.path(), "index.tpl", &ctx).unwrap(),
            "v2"
        );
    }

    #[test]
    fn invalidate_drops_only_that_theme() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "index.tpl", "x");
        let renderer = Renderer::new();
        let ctx = Context::new();
        renderer.render("t1", dir.path(), "index.tpl", &ctx).unwrap();
        renderer.render("t2", dir.path(), "index.tpl", &ctx).unwrap();
        assert_eq!(renderer.cached_len(), 2);

        renderer.invalidate("t1");
        assert_eq!(renderer.cached_len(), 1);
    }
}
