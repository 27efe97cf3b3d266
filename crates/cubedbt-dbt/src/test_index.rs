//! Column test lookup
//!
//! Indexes the generic tests of a manifest by the model and column they
//! target, so primary key detection does not rescan every test node.

use crate::manifest::{Manifest, RESOURCE_MODEL};
use std::collections::HashMap;

/// Tests applied to the columns of one model: column name -> test kinds
pub type ColumnTests = HashMap<String, Vec<String>>;

/// Model name -> column name -> test kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestIndex {
    models: HashMap<String, ColumnTests>,
}

impl TestIndex {
    /// Scan every test node of the manifest once
    ///
    /// Only column-level tests with metadata are indexed. A test is recorded
    /// under every model it depends on.
    pub fn build(manifest: &Manifest) -> Self {
        let mut models: HashMap<String, ColumnTests> = HashMap::new();
        let mut indexed = 0usize;

        for (_, node) in manifest.tests() {
            let Some(metadata) = &node.test_metadata else {
                continue;
            };
            let Some(column_name) = metadata.column_name() else {
                continue;
            };

            for model_name in node.depends_on.nodes.iter().filter_map(|id| model_name(id)) {
                models
                    .entry(model_name.to_string())
                    .or_default()
                    .entry(column_name.to_string())
                    .or_default()
                    .push(metadata.name.clone());
                indexed += 1;
            }
        }

        tracing::debug!(models = models.len(), tests = indexed, "built column test index");

        Self { models }
    }

    /// Tests applied to every column of a model
    pub fn model_tests(&self, model: &str) -> Option<&ColumnTests> {
        self.models.get(model)
    }

    /// Test kinds applied to a column, empty if none
    pub fn tests_for(&self, model: &str, column: &str) -> &[String] {
        self.models
            .get(model)
            .and_then(|columns| columns.get(column))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of models with at least one column test
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Bare model name of a `model.<package>.<name>` identifier
fn model_name(unique_id: &str) -> Option<&str> {
    let rest = unique_id.strip_prefix(RESOURCE_MODEL)?.strip_prefix('.')?;
    rest.rsplit('.').next().filter(|name| !name.is_empty())
}
