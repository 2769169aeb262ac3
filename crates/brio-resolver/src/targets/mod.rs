//! Deduplicated build targets and the links between them

use std::collections::{HashMap, HashSet};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use brio_core::error::BrioError;
use brio_core::types::{Version, Visibility};
use brio_core::utils::IdentityHasher;

use crate::ResolveResult;

/// PRIVATE and PUBLIC preprocessor definitions of a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Definitions {
    pub private: Vec<String>,
    pub public: Vec<String>,
}

/// A concrete build unit: one package built with one configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// Unique target name; equal to `package` unless disambiguated
    pub name: String,
    pub package: String,
    pub version: Version,
    pub path: Utf8PathBuf,
    pub vendor: bool,
    pub header_only: bool,
    pub flags: Vec<String>,
    pub definitions: Definitions,
    pub flags_visibility: Visibility,
    pub definitions_visibility: Visibility,
}

impl Target {
    pub fn new(package: impl Into<String>, version: Version, path: impl Into<Utf8PathBuf>) -> Self {
        let package = package.into();
        Self {
            name: package.clone(),
            package,
            version,
            path: path.into(),
            vendor: false,
            header_only: false,
            flags: Vec::new(),
            definitions: Definitions::default(),
            flags_visibility: Visibility::Private,
            definitions_visibility: Visibility::Private,
        }
    }

    /// Structural identity: package, version, flags and definitions
    /// (order-insensitive) and both visibilities. The name and path do not
    /// take part.
    pub fn identity(&self) -> String {
        let sorted = |values: &[String]| {
            let mut values = values.to_vec();
            values.sort();
            values
        };

        IdentityHasher::new()
            .field(&self.package)
            .field(&self.version.to_string())
            .list(sorted(&self.flags))
            .list(sorted(&self.definitions.private))
            .list(sorted(&self.definitions.public))
            .field(self.flags_visibility.as_str())
            .field(self.definitions_visibility.as_str())
            .finish()
    }
}

/// Directed edge: `from` links against `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetLink {
    pub from: String,
    pub to: String,
    pub visibility: Visibility,
    /// Extra linker flags on this edge
    pub flags: Vec<String>,
}

/// All targets of a build keyed by identity, plus their links.
///
/// Consumers must not rely on iteration order.
#[derive(Debug, Default)]
pub struct TargetSet {
    targets: IndexMap<String, Target>,
    /// package name -> configurations seen
    names: HashMap<String, usize>,
    /// every target name handed out so far
    taken: HashSet<String>,
    links: Vec<TargetLink>,
}

#[derive(Serialize)]
struct TargetGraph<'a> {
    targets: Vec<&'a Target>,
    links: &'a [TargetLink],
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target unless an identical configuration is already present.
    ///
    /// Returns the name of the stored target. The first configuration of a
    /// package keeps the package name; later distinct ones are suffixed
    /// `__2`, `__3`, ... Suffixes already used as a name, including a
    /// package literally called `foo__2`, are skipped.
    pub fn add(&mut self, mut target: Target) -> String {
        let identity = target.identity();
        if let Some(existing) = self.targets.get(&identity) {
            return existing.name.clone();
        }

        let seen = self.names.entry(target.package.clone()).or_insert(0);
        target.name = loop {
            *seen += 1;
            let candidate = if *seen == 1 {
                target.package.clone()
            } else {
                format!("{}__{}", target.package, seen)
            };
            if !self.taken.contains(&candidate) {
                break candidate;
            }
        };

        let name = target.name.clone();
        self.taken.insert(name.clone());
        self.targets.insert(identity, target);
        name
    }

    /// Record an edge. Repeated edges are kept.
    pub fn link(&mut self, from: &str, to: &str, visibility: Visibility, flags: Vec<String>) {
        self.links.push(TargetLink {
            from: from.to_string(),
            to: to.to_string(),
            visibility,
            flags,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.values().find(|target| target.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn links(&self) -> &[TargetLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets ordered so that every target comes after the targets it links
    /// against. Links from outside the set (the main target) are ignored.
    pub fn build_order(&self) -> ResolveResult<Vec<&Target>> {
        let mut graph: DiGraph<&Target, ()> = DiGraph::new();
        let index: HashMap<&str, NodeIndex> = self
            .targets
            .values()
            .map(|target| (target.name.as_str(), graph.add_node(target)))
            .collect();

        for link in &self.links {
            if let (Some(&from), Some(&to)) = (index.get(link.from.as_str()), index.get(link.to.as_str())) {
                graph.update_edge(to, from, ());
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(|node| graph[node]).collect())
            .map_err(|cycle| BrioError::CyclicDependency {
                cycle: format!("{} -> ...", graph[cycle.node_id()].name),
            })
    }

    /// Serialize targets and links as JSON for build file generators
    pub fn to_json(&self) -> ResolveResult<String> {
        let graph = TargetGraph {
            targets: self.targets.values().collect(),
            links: &self.links,
        };
        serde_json::to_string_pretty(&graph)
            .map_err(|e| BrioError::io("Failed to serialize targets".to_string(), e.into()))
    }
}
