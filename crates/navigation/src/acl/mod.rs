//! Role-based access control for navigation pages.
//!
//! Roles inherit from parent roles, resources inherit from a parent
//! resource, and rules allow or deny a role a privilege on a resource.
//! Anything not explicitly allowed is denied.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::Page;
use crate::error::{NavigationError, NavigationResult};
use crate::format::DocumentFormat;

/// Decides whether a page may be rendered for a role.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, page: &Page, role: Option<&str>) -> bool;
}

/// Outcome of a matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Allow,
    Deny,
}

/// `None` in any position means "all".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    role: Option<String>,
    resource: Option<String>,
    privilege: Option<String>,
}

/// Access control list.
#[derive(Debug, Clone, Default)]
pub struct Acl {
    /// role -> parent roles, in the order they were given
    roles: HashMap<String, Vec<String>>,
    /// resource -> parent resource
    resources: HashMap<String, Option<String>>,
    rules: HashMap<RuleKey, RuleType>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role inheriting from already-registered `parents`.
    pub fn add_role(&mut self, role: &str, parents: &[&str]) -> NavigationResult<()> {
        if self.roles.contains_key(role) {
            return Err(NavigationError::DuplicateRole(role.to_string()));
        }
        for parent in parents {
            self.require_role(parent)?;
        }
        self.roles.insert(
            role.to_string(),
            parents.iter().map(|p| (*p).to_string()).collect(),
        );
        Ok(())
    }

    /// Register a resource, optionally inheriting from `parent`.
    pub fn add_resource(&mut self, resource: &str, parent: Option<&str>) -> NavigationResult<()> {
        if self.resources.contains_key(resource) {
            return Err(NavigationError::DuplicateResource(resource.to_string()));
        }
        if let Some(parent) = parent {
            self.require_resource(parent)?;
        }
        self.resources
            .insert(resource.to_string(), parent.map(str::to_string));
        Ok(())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    pub fn has_resource(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    /// Allow `roles` the `privileges` on `resources`. Empty slices mean "all".
    pub fn allow(
        &mut self,
        roles: &[&str],
        resources: &[&str],
        privileges: &[&str],
    ) -> NavigationResult<()> {
        self.set_rule(RuleType::Allow, roles, resources, privileges)
    }

    /// Deny `roles` the `privileges` on `resources`. Empty slices mean "all".
    pub fn deny(
        &mut self,
        roles: &[&str],
        resources: &[&str],
        privileges: &[&str],
    ) -> NavigationResult<()> {
        self.set_rule(RuleType::Deny, roles, resources, privileges)
    }

    fn set_rule(
        &mut self,
        rule: RuleType,
        roles: &[&str],
        resources: &[&str],
        privileges: &[&str],
    ) -> NavigationResult<()> {
        for role in roles {
            self.require_role(role)?;
        }
        for resource in resources {
            self.require_resource(resource)?;
        }

        for role in all_or_each(roles) {
            for resource in all_or_each(resources) {
                for privilege in all_or_each(privileges) {
                    let key = RuleKey {
                        role: role.map(str::to_string),
                        resource: resource.map(str::to_string),
                        privilege: privilege.map(str::to_string),
                    };
                    self.rules.insert(key, rule);
                }
            }
        }

        Ok(())
    }

    /// Check whether `role` has `privilege` on `resource`.
    ///
    /// Walks from the resource up through its parents to "all resources".
    /// At each level the role and its ancestors are searched depth-first
    /// (most recently listed parent first), then rules for all roles apply.
    /// A rule for the exact privilege beats an all-privileges rule. Asking
    /// for all privileges fails at the first level that denies any one.
    pub fn is_allowed(
        &self,
        role: Option<&str>,
        resource: Option<&str>,
        privilege: Option<&str>,
    ) -> bool {
        let mut current = resource;
        loop {
            if let Some(role) = role
                && let Some(rule) = self.role_dfs(role, current, privilege)
            {
                return rule == RuleType::Allow;
            }

            if let Some(rule) = self.role_rule(None, current, privilege) {
                return rule == RuleType::Allow;
            }

            match current {
                Some(resource) => {
                    current = self.resources.get(resource).and_then(|p| p.as_deref());
                }
                None => return false,
            }
        }
    }

    fn role_dfs(
        &self,
        role: &str,
        resource: Option<&str>,
        privilege: Option<&str>,
    ) -> Option<RuleType> {
        let mut stack = vec![role];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            if let Some(rule) = self.role_rule(Some(current), resource, privilege) {
                return Some(rule);
            }

            if let Some(parents) = self.roles.get(current) {
                stack.extend(parents.iter().map(String::as_str));
            }
        }

        None
    }

    /// The rule deciding for one role (or all roles) on one resource.
    ///
    /// Without a privilege, a deny on any single privilege wins over the
    /// all-privileges rule.
    fn role_rule(
        &self,
        role: Option<&str>,
        resource: Option<&str>,
        privilege: Option<&str>,
    ) -> Option<RuleType> {
        if privilege.is_some() {
            return self
                .rule(role, resource, privilege)
                .or_else(|| self.rule(role, resource, None));
        }

        let denies_one = self.rules.iter().any(|(key, rule)| {
            *rule == RuleType::Deny
                && key.privilege.is_some()
                && key.role.as_deref() == role
                && key.resource.as_deref() == resource
        });
        if denies_one {
            return Some(RuleType::Deny);
        }
        self.rule(role, resource, None)
    }

    fn rule(
        &self,
        role: Option<&str>,
        resource: Option<&str>,
        privilege: Option<&str>,
    ) -> Option<RuleType> {
        let key = RuleKey {
            role: role.map(str::to_string),
            resource: resource.map(str::to_string),
            privilege: privilege.map(str::to_string),
        };
        self.rules.get(&key).copied()
    }

    fn require_role(&self, role: &str) -> NavigationResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(NavigationError::UnknownRole(role.to_string()))
        }
    }

    fn require_resource(&self, resource: &str) -> NavigationResult<()> {
        if self.has_resource(resource) {
            Ok(())
        } else {
            Err(NavigationError::UnknownResource(resource.to_string()))
        }
    }

    /// Build an ACL from its serializable definition.
    pub fn from_spec(spec: &AclSpec) -> NavigationResult<Self> {
        let mut acl = Self::new();

        for role in &spec.roles {
            let parents: Vec<&str> = role.parents.iter().map(String::as_str).collect();
            acl.add_role(&role.name, &parents)?;
        }
        for resource in &spec.resources {
            acl.add_resource(&resource.name, resource.parent.as_deref())?;
        }
        for (rule_type, rules) in [(RuleType::Allow, &spec.allow), (RuleType::Deny, &spec.deny)] {
            for rule in rules {
                let roles: Vec<&str> = rule.roles.iter().map(String::as_str).collect();
                let resources: Vec<&str> = rule.resources.iter().map(String::as_str).collect();
                let privileges: Vec<&str> = rule.privileges.iter().map(String::as_str).collect();
                acl.set_rule(rule_type, &roles, &resources, &privileges)?;
            }
        }

        debug!(
            roles = acl.roles.len(),
            resources = acl.resources.len(),
            rules = acl.rules.len(),
            "built acl"
        );
        Ok(acl)
    }

    /// Load an ACL definition, picking the format by file extension.
    pub fn from_path(path: &Path) -> NavigationResult<Self> {
        let spec: AclSpec = DocumentFormat::load(path)?;
        Self::from_spec(&spec)
    }
}

impl AccessPolicy for Acl {
    /// Pages without a resource or privilege are always allowed. A page
    /// naming a resource the ACL does not know is rejected.
    fn allows(&self, page: &Page, role: Option<&str>) -> bool {
        let resource = page.resource.as_deref();
        let privilege = page.privilege.as_deref();

        if resource.is_none() && privilege.is_none() {
            return true;
        }
        if let Some(resource) = resource
            && !self.has_resource(resource)
        {
            return false;
        }

        self.is_allowed(role, resource, privilege)
    }
}

fn all_or_each<'a>(items: &[&'a str]) -> Vec<Option<&'a str>> {
    if items.is_empty() {
        vec![None]
    } else {
        items.iter().map(|i| Some(*i)).collect()
    }
}

/// Serializable ACL definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AclSpec {
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub allow: Vec<RuleSpec>,
    #[serde(default)]
    pub deny: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// A rule; empty lists mean "all".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub privileges: Vec<String>,
}
