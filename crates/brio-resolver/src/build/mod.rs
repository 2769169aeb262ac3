//! Build target computation over a resolved tree
//!
//! Every node of the tree is configured against its local manifest: flags
//! and definitions are propagated from its parent, visibilities are
//! resolved, and the result is folded into a [`TargetSet`]. The main target
//! of the project is the synthetic [`MAIN_TARGET`].

use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use brio_config::{DependencyTag, Manifest, TargetSection};
use brio_core::error::BrioError;
use brio_core::types::{Visibility, VisibilitySubject, VisibilityWarning};
use brio_registry::{RegistrySession, RegistrySource};

use crate::flags::{fill_placeholders, propagate_definitions, propagate_flags, resolve_visibility, Supply};
use crate::targets::{Target, TargetSet};
use crate::tree::Node;
use crate::ResolveResult;

/// Name the build file generator substitutes with the project's executable
pub const MAIN_TARGET: &str = "${TARGET_NAME}";

/// Targets of one build and the visibility problems recovered on the way
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub targets: TargetSet,
    pub warnings: Vec<VisibilityWarning>,
}

/// What a parent hands to one dependency
#[derive(Debug, Default)]
struct Given {
    flags: Vec<String>,
    definitions: Vec<String>,
    link_visibility: Option<String>,
    link_flags: Vec<String>,
}

/// The target a node is linked from
struct Parent<'p> {
    target: &'p str,
    package: &'p str,
    header_only: bool,
}

/// Compute the build targets for `root`, resolved from `manifest`.
///
/// `target_name` selects a `[targets.<name>]` section; without one the
/// manifest's default target is used, and a project with neither builds with
/// no global flags or definitions.
pub async fn create_build_targets<S: RegistrySource>(
    session: &RegistrySession<S>,
    manifest: &Manifest,
    root: &Node,
    target_name: Option<&str>,
) -> ResolveResult<BuildOutput> {
    let section = match (manifest.target(target_name), target_name) {
        (Some((name, section)), _) => {
            debug!("Using target '{}'", name);
            section.clone()
        }
        (None, Some(name)) => {
            return Err(BrioError::ConfigValidation {
                field: format!("targets.{}", name),
                reason: format!("Target '{}' is not defined in {}", name, manifest.name()),
            })
        }
        (None, None) => TargetSection::default(),
    };

    let mut walk = Walk {
        session,
        global_flags: section.global_flags.clone(),
        global_definitions: section.global_definitions.clone(),
        output: BuildOutput::default(),
        received_flags: Vec::new(),
        received_definitions: Vec::new(),
    };
    let main = Parent {
        target: MAIN_TARGET,
        package: manifest.name(),
        header_only: false,
    };

    if manifest.is_app() {
        for child in &root.dependencies {
            let tag = declared_tag(manifest, &child.name)?;
            let given = Given {
                flags: fill_placeholders(&child.name, &walk.global_flags, &tag.flags)?,
                definitions: fill_placeholders(&child.name, &walk.global_definitions, &tag.definitions)?,
                link_visibility: tag.link_visibility,
                link_flags: tag
                    .linker_flags
                    .into_iter()
                    .chain(section.link_flags.iter().cloned())
                    .collect(),
            };
            walk.configure(child, &main, given).await?;
        }
    } else {
        let (link_flags, flags): (Vec<String>, Vec<String>) = section
            .package_flags
            .iter()
            .cloned()
            .partition(|flag| flag.starts_with("-l"));
        let given = Given {
            flags,
            definitions: section.package_definitions.clone(),
            link_visibility: Some(Visibility::Private.as_str().to_string()),
            link_flags: link_flags.into_iter().chain(section.link_flags.iter().cloned()).collect(),
        };
        walk.configure(root, &main, given).await?;
    }

    let output = walk.output;
    info!(
        "Computed {} targets and {} links ({} visibility warnings)",
        output.targets.len(),
        output.targets.links().len(),
        output.warnings.len()
    );
    Ok(output)
}

/// Dependency tag `manifest` declares for `name`
fn declared_tag(manifest: &Manifest, name: &str) -> ResolveResult<DependencyTag> {
    manifest
        .dependencies
        .get(name)
        .map(|spec| spec.to_tag())
        .ok_or_else(|| {
            BrioError::identity(
                format!("{}@{}", manifest.name(), manifest.version()),
                format!("dependency '{}' is not declared", name),
            )
        })
}

struct Walk<'a, S> {
    session: &'a RegistrySession<S>,
    global_flags: Vec<String>,
    global_definitions: Vec<String>,
    output: BuildOutput,
    /// Values received by each ancestor of the current node, root first
    received_flags: Vec<Vec<String>>,
    received_definitions: Vec<Vec<String>>,
}

impl<'a, S: RegistrySource> Walk<'a, S> {
    fn warn(&mut self, warning: Option<VisibilityWarning>) {
        if let Some(warning) = warning {
            self.output.warnings.push(warning);
        }
    }

    /// Configure `node` as a target linked from `parent`, then its subtree
    fn configure<'w>(
        &'w mut self,
        node: &'w Node,
        parent: &'w Parent<'w>,
        given: Given,
    ) -> Pin<Box<dyn Future<Output = ResolveResult<()>> + Send + 'w>>
    where
        'a: 'w,
    {
        Box::pin(async move {
            let version = node.version()?;
            let package = self.session.get_pkg(&node.name, version).await?.ok_or_else(|| {
                BrioError::PackageVersionNotFound {
                    name: node.name.clone(),
                    version: version.to_string(),
                }
            })?;
            let manifest = &package.manifest;
            let header_only = manifest.package.header_only;

            let (flags, definitions) = {
                let ancestors: Vec<&[String]> =
                    self.received_flags.iter().rev().map(Vec::as_slice).collect();
                let mut supply = Supply::new(&given.flags, &ancestors, &self.global_flags);
                let flags = propagate_flags(&node.name, &manifest.flags, &self.global_flags, &mut supply)?;

                let ancestors: Vec<&[String]> =
                    self.received_definitions.iter().rev().map(Vec::as_slice).collect();
                let mut supply = Supply::new(&given.definitions, &ancestors, &self.global_definitions);
                let definitions = propagate_definitions(
                    &node.name,
                    &manifest.definitions,
                    &self.global_definitions,
                    &mut supply,
                )?;
                (flags, definitions)
            };

            let (flags_visibility, warning) = resolve_visibility(
                &node.name,
                VisibilitySubject::Flags,
                manifest.flags.visibility.as_deref(),
                header_only,
            );
            self.warn(warning);
            let (definitions_visibility, warning) = resolve_visibility(
                &node.name,
                VisibilitySubject::Definitions,
                manifest.definitions.visibility.as_deref(),
                header_only,
            );
            self.warn(warning);
            let (link_visibility, warning) = resolve_visibility(
                parent.package,
                VisibilitySubject::Link,
                given.link_visibility.as_deref(),
                parent.header_only,
            );
            self.warn(warning);

            let mut target = Target::new(&node.name, version.clone(), package.path.clone());
            target.vendor = package.vendor;
            target.header_only = header_only;
            target.flags = flags;
            target.definitions = definitions;
            target.flags_visibility = flags_visibility;
            target.definitions_visibility = definitions_visibility;

            let own_definitions: Vec<String> = target
                .definitions
                .private
                .iter()
                .chain(&target.definitions.public)
                .cloned()
                .collect();
            let own_flags = target.flags.clone();

            let name = self.output.targets.add(target);
            self.output.targets.link(parent.target, &name, link_visibility, given.link_flags);
            debug!("{}@{} configured as target {}", node.name, version, name);

            if node.dependencies.is_empty() {
                return Ok(());
            }

            let this = Parent {
                target: &name,
                package: &node.name,
                header_only,
            };
            self.received_flags.push(given.flags);
            self.received_definitions.push(given.definitions);

            let mut result = Ok(());
            for child in &node.dependencies {
                result = match declared_tag(manifest, &child.name) {
                    Ok(tag) => self.configure_child(child, &this, tag, &own_flags, &own_definitions).await,
                    Err(e) => Err(e),
                };
                if result.is_err() {
                    break;
                }
            }

            self.received_flags.pop();
            self.received_definitions.pop();
            result
        })
    }

    /// Fill the placeholders of `tag` from the parent's own configuration and
    /// recurse into `child`
    async fn configure_child(
        &mut self,
        child: &Node,
        parent: &Parent<'_>,
        tag: DependencyTag,
        parent_flags: &[String],
        parent_definitions: &[String],
    ) -> ResolveResult<()> {
        let given = Given {
            flags: fill_placeholders(&child.name, parent_flags, &tag.flags)?,
            definitions: fill_placeholders(&child.name, parent_definitions, &tag.definitions)?,
            link_visibility: tag.link_visibility,
            link_flags: tag.linker_flags,
        };
        self.configure(child, parent, given).await
    }
}

#[cfg(test)]
mod tests;
