//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Defaults for the `waymark` command. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scheme and host for sitemap URLs (default: http://localhost).
    pub server_url: String,

    /// Base path for relative sitemap URLs (default: /).
    pub base_path: String,

    /// Directory holding partial templates. When None, partials are disabled.
    pub templates_dir: Option<PathBuf>,

    /// Role used for ACL checks when none is given on the command line.
    pub default_role: Option<String>,

    /// Indent width in spaces for rendered output (default: 0).
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost".to_string(),
            base_path: "/".to_string(),
            templates_dir: None,
            default_role: None,
            indent: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = lookup("WAYMARK_SERVER_URL").unwrap_or(defaults.server_url);
        url::Url::parse(&server_url).context("WAYMARK_SERVER_URL must be an absolute URL")?;

        let base_path = lookup("WAYMARK_BASE_PATH").unwrap_or(defaults.base_path);

        let templates_dir = lookup("WAYMARK_TEMPLATES_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let default_role = lookup("WAYMARK_DEFAULT_ROLE").filter(|s| !s.is_empty());

        let indent = lookup("WAYMARK_INDENT")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .context("WAYMARK_INDENT must be a non-negative integer")?;

        Ok(Self {
            server_url,
            base_path,
            templates_dir,
            default_role,
            indent,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = Config::from_lookup(lookup(&[
            ("WAYMARK_SERVER_URL", "https://example.org"),
            ("WAYMARK_BASE_PATH", "/docs"),
            ("WAYMARK_TEMPLATES_DIR", "./partials"),
            ("WAYMARK_DEFAULT_ROLE", "member"),
            ("WAYMARK_INDENT", "4"),
        ]))
        .unwrap();

        assert_eq!(config.server_url, "https://example.org");
        assert_eq!(config.base_path, "/docs");
        assert_eq!(config.templates_dir, Some(PathBuf::from("./partials")));
        assert_eq!(config.default_role.as_deref(), Some("member"));
        assert_eq!(config.indent, 4);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("WAYMARK_INDENT", "wide")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WAYMARK_SERVER_URL", "localhost")])).is_err());
    }
}
