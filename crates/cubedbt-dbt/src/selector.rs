//! Model selection
//!
//! Picks the models that become cubes: materialized models matching the
//! configured path prefixes, tags and names.

use crate::manifest::{Manifest, ManifestNode};
use crate::model::Model;
use crate::test_index::TestIndex;
use cubedbt_core::{FilterConfig, TypeMapper};
use std::collections::BTreeSet;

/// Selection criteria; every criterion must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    paths: BTreeSet<String>,
    tags: BTreeSet<String>,
    names: BTreeSet<String>,
}

impl ModelFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept models under this path prefix (any prefix may match)
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.paths.insert(prefix.into());
        self
    }

    /// Require this tag (all tags must be present)
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Accept this model name (any name may match)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Whether a manifest node is a materialized model meeting every criterion
    pub fn matches(&self, node: &ManifestNode) -> bool {
        node.resource_type == crate::manifest::RESOURCE_MODEL
            && !node.is_ephemeral()
            && self.matches_path(&node.path)
            && self.matches_tags(&node.config.tags)
            && self.matches_name(&node.name)
    }

    fn matches_path(&self, path: &str) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn matches_tags(&self, tags: &[String]) -> bool {
        self.tags.iter().all(|required| tags.contains(required))
    }

    fn matches_name(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}

impl From<&FilterConfig> for ModelFilter {
    fn from(config: &FilterConfig) -> Self {
        Self {
            paths: config.paths.iter().cloned().collect(),
            tags: config.tags.iter().cloned().collect(),
            names: config.names.iter().cloned().collect(),
        }
    }
}

/// Models of the manifest accepted by `filter`, in manifest order
pub fn select(
    manifest: &Manifest,
    filter: &ModelFilter,
    test_index: &TestIndex,
    type_mapper: &'static TypeMapper,
) -> Vec<Model> {
    let models: Vec<Model> = manifest
        .nodes
        .iter()
        .filter(|(_, node)| filter.matches(node))
        .map(|(unique_id, node)| {
            Model::from_node(
                unique_id.as_str(),
                node,
                test_index.model_tests(&node.name),
                type_mapper,
            )
        })
        .collect();

    tracing::debug!(
        selected = models.len(),
        candidates = manifest.models().count(),
        "selected models"
    );

    models
}
