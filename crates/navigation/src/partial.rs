//! Partial templates for helpers that render through a view script.
//!
//! Wraps a Tera instance. Template lookups try the name as given and then
//! with an `.html` suffix; resolved names are cached.

use std::path::Path;

use dashmap::DashMap;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::{NavigationError, NavigationResult};

/// Tera-backed partial template renderer.
pub struct PartialRenderer {
    tera: Tera,
    /// Requested name -> resolved template name.
    resolved: DashMap<String, String>,
}

impl PartialRenderer {
    /// Load every `*.html` and `*.xml` template under `template_dir`.
    pub fn new(template_dir: &Path) -> NavigationResult<Self> {
        let pattern = template_dir.join("**/*.{html,xml}");
        let pattern_str = pattern.to_string_lossy();

        let tera = Tera::new(&pattern_str)?;

        let count = tera.get_template_names().count();
        debug!(count, dir = %template_dir.display(), "loaded partial templates");

        Ok(Self {
            tera,
            resolved: DashMap::new(),
        })
    }

    /// Create a renderer with no templates.
    pub fn empty() -> Self {
        Self {
            tera: Tera::default(),
            resolved: DashMap::new(),
        }
    }

    /// Register a template from a string.
    pub fn add_raw_template(&mut self, name: &str, content: &str) -> NavigationResult<()> {
        self.tera.add_raw_template(name, content)?;
        self.resolved.clear();
        Ok(())
    }

    /// Resolve a partial name to a loaded template.
    pub fn resolve(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.resolved.get(name) {
            return Some(cached.clone());
        }

        let candidates = [name.to_string(), format!("{name}.html")];
        let found = candidates
            .into_iter()
            .find(|candidate| self.tera.get_template(candidate).is_ok())?;

        self.resolved.insert(name.to_string(), found.clone());
        Some(found)
    }

    /// Render a partial with the given context.
    pub fn render(&self, name: &str, context: &Context) -> NavigationResult<String> {
        let template = self
            .resolve(name)
            .ok_or_else(|| NavigationError::MissingTemplate(name.to_string()))?;
        Ok(self.tera.render(&template, context)?)
    }
}

impl std::fmt::Debug for PartialRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialRenderer")
            .field("templates", &self.tera.get_template_names().count())
            .finish()
    }
}
