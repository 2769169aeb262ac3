//! Recursive dependency tree resolution

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use serde::Serialize;
use tracing::{debug, info};

use brio_config::Manifest;
use brio_core::error::BrioError;
use brio_core::types::{Query, Version};
use brio_registry::{LocalPackage, RegistrySession, RegistrySource};

use crate::ResolveResult;

/// Entry of the resolution tree: a requested (name, constraint) and, once
/// resolved, the chosen version and the dependencies declared at that version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    /// Constraint text as declared by the parent
    pub constraint: String,
    /// Looked up under the project's vendor directory only
    pub vendor: bool,
    pub resolved: Option<Version>,
    pub dependencies: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, constraint: impl Into<String>, vendor: bool) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
            vendor,
            resolved: None,
            dependencies: Vec::new(),
        }
    }

    /// One child per dependency declared in `manifest`
    fn children_of(manifest: &Manifest) -> Vec<Node> {
        manifest
            .dependencies
            .iter()
            .map(|(name, spec)| Node::new(name, spec.version(), spec.is_vendor()))
            .collect()
    }

    /// Chosen version, failing for a node that was never resolved
    pub fn version(&self) -> ResolveResult<&Version> {
        self.resolved.as_ref().ok_or_else(|| BrioError::UnresolvableConstraint {
            name: self.name.clone(),
            constraint: self.constraint.clone(),
        })
    }

    /// Number of nodes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.dependencies.iter().map(Node::count).sum::<usize>()
    }

    /// First node named `name` in depth-first pre-order
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.dependencies.iter().find_map(|child| child.find(name))
    }

    fn label(&self) -> String {
        match &self.resolved {
            Some(version) => format!("{}@{}", self.name, version),
            None => format!("{}@{}", self.name, self.constraint),
        }
    }

    fn render_children(&self, prefix: &str, out: &mut String) {
        let count = self.dependencies.len();
        for (index, child) in self.dependencies.iter().enumerate() {
            let last = index + 1 == count;
            let connector = if last { "\\_ " } else { "|_ " };
            out.push_str(prefix);
            out.push_str(connector);
            out.push_str(&child.label());
            if child.vendor {
                out.push_str(" (vendor)");
            }
            out.push('\n');

            let next = format!("{}{}", prefix, if last { "   " } else { "|  " });
            child.render_children(&next, out);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.label();
        out.push('\n');
        self.render_children("", &mut out);
        f.write_str(&out)
    }
}

/// Resolves manifests into version trees against one session
pub struct Resolver<'a, S> {
    session: &'a RegistrySession<S>,
}

impl<'a, S: RegistrySource> Resolver<'a, S> {
    pub fn new(session: &'a RegistrySession<S>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &'a RegistrySession<S> {
        self.session
    }

    /// Resolve the project described by `manifest`.
    ///
    /// Local packages are registered first, so vendored and installed
    /// manifests shadow the registry. A package project registers itself as
    /// well, which lets the build stage configure it like any dependency.
    pub async fn resolve_root(&self, manifest: &Manifest) -> ResolveResult<Node> {
        info!("Resolving dependencies for {}@{}", manifest.name(), manifest.version());
        self.session.load_local()?;

        if !manifest.is_app() {
            self.session.set_pkg(LocalPackage {
                vendor: false,
                path: self.session.base_dir().to_path_buf(),
                manifest: manifest.clone(),
            });
        }

        let mut root = Node::new(manifest.name(), manifest.version().to_string(), false);
        root.resolved = Some(manifest.version().clone());
        root.dependencies = Node::children_of(manifest);

        let mut path = vec![root.name.clone()];
        for child in root.dependencies.iter_mut() {
            self.resolve_tree(child, &mut path).await?;
        }

        info!("Resolved {} packages", root.count() - 1);
        Ok(root)
    }

    /// Resolve `node` and its whole subtree depth-first.
    ///
    /// `path` holds the names from the root down to the parent of `node`;
    /// meeting one of them again is a cycle.
    pub fn resolve_tree<'n>(
        &'n self,
        node: &'n mut Node,
        path: &'n mut Vec<String>,
    ) -> Pin<Box<dyn Future<Output = ResolveResult<()>> + Send + 'n>>
    where
        'a: 'n,
    {
        Box::pin(async move {
            if let Some(start) = path.iter().position(|name| *name == node.name) {
                let mut cycle = path[start..].to_vec();
                cycle.push(node.name.clone());
                return Err(BrioError::CyclicDependency {
                    cycle: cycle.join(" -> "),
                });
            }

            let version = match self.session.get_res(&node.name, &node.constraint) {
                Some(version) => {
                    debug!("Reusing {}@{} for '{}'", node.name, version, node.constraint);
                    version
                }
                None => self.resolve_ver(&node.name, &node.constraint, node.vendor).await?,
            };

            node.dependencies = if node.vendor {
                let package = self.session.get_pkg(&node.name, &version).await?.ok_or_else(|| {
                    BrioError::VendorPackageNotFound {
                        name: node.name.clone(),
                        version: version.to_string(),
                    }
                })?;
                Node::children_of(&package.manifest)
            } else {
                let record = self.session.get_version(&node.name, &version, false).await?;
                record
                    .dependencies
                    .iter()
                    .map(|(name, constraint)| Node::new(name, constraint, false))
                    .collect()
            };
            node.resolved = Some(version);

            path.push(node.name.clone());
            for child in node.dependencies.iter_mut() {
                self.resolve_tree(child, path).await?;
            }
            path.pop();

            Ok(())
        })
    }

    /// Choose a version of `name` for `constraint` and memoize it.
    ///
    /// An exact version is taken as is. Otherwise a version already selected
    /// in this session is reused when it matches; failing that the query picks
    /// from the advertised versions (or, for vendored packages, the versions
    /// found on disk).
    async fn resolve_ver(&self, name: &str, constraint: &str, vendor: bool) -> ResolveResult<Version> {
        let query = Query::parse(constraint)?;

        if let Some(exact) = query.as_exact() {
            return Ok(self.session.store_ver(name, constraint, exact.clone()));
        }

        if let Some(selected) = self.session.find_selected(name, &query) {
            debug!("{}: '{}' satisfied by already selected {}", name, constraint, selected);
            return Ok(self.session.store_ver(name, constraint, selected));
        }

        let best = if vendor {
            let local = self.session.local_versions(name).ok_or_else(|| {
                BrioError::VendorPackageNotFound {
                    name: name.to_string(),
                    version: constraint.to_string(),
                }
            })?;
            query.find_best(&local).cloned()
        } else {
            let list = self.session.get_list(name).await?;
            query.find_best(&list).cloned()
        };

        match best {
            Some(version) => {
                debug!("{}: '{}' resolved to {}", name, constraint, version);
                Ok(self.session.store_ver(name, constraint, version))
            }
            None => Err(BrioError::UnresolvableConstraint {
                name: name.to_string(),
                constraint: constraint.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
