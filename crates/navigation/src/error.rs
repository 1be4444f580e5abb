//! Navigation error types.

use thiserror::Error;

use crate::container::PageId;

/// Errors raised while building containers or rendering helpers.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("unknown page: {0}")]
    UnknownPage(PageId),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("role already registered: {0}")]
    DuplicateRole(String),

    #[error("resource already registered: {0}")]
    DuplicateResource(String),

    #[error("encountered an invalid URL for sitemap XML: \"{0}\"")]
    InvalidSitemapUrl(String),

    #[error("partial template not found: {0}")]
    MissingTemplate(String),

    #[error("a partial was requested but no partial renderer is configured")]
    NoPartialRenderer,

    #[error("template error")]
    Template(#[from] tera::Error),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("unsupported document extension: {0}")]
    UnsupportedFormat(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias using NavigationError.
pub type NavigationResult<T> = Result<T, NavigationError>;
