//! Waymark navigation
//!
//! Navigation containers, role-based access checks, and the helpers that
//! render them as menus, breadcrumbs, `<link>` head elements and XML
//! sitemaps.

pub mod acl;
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod escape;
pub mod format;
pub mod helper;
pub mod navigation;
pub mod partial;

pub use acl::{AccessPolicy, Acl};
pub use container::{Container, Page, PageId};
pub use error::{NavigationError, NavigationResult};
pub use helper::{Breadcrumbs, HelperOptions, Links, Menu, Sitemap};
pub use navigation::{HelperKind, Navigation};
