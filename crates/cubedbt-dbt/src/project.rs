//! dbt project view over a loaded manifest
//!
//! Owns the manifest and lazily derives the test index and the selected
//! models from it. Both are computed at most once per `Dbt`.

use crate::error::DbtError;
use crate::manifest::{Manifest, ManifestError};
use crate::model::Model;
use crate::selector::{self, ModelFilter};
use crate::test_index::TestIndex;
use cubedbt_core::{Config, SourceDialect, TypeMapper};
use std::path::Path;
use std::sync::OnceLock;

/// A dbt project as seen through its manifest
#[derive(Debug)]
pub struct Dbt {
    manifest: Manifest,
    filter: ModelFilter,
    dialect: Option<SourceDialect>,
    test_index: OnceLock<TestIndex>,
    models: OnceLock<Vec<Model>>,
}

impl Dbt {
    /// Wrap a parsed manifest; every materialized model is selected
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            filter: ModelFilter::default(),
            dialect: None,
            test_index: OnceLock::new(),
            models: OnceLock::new(),
        }
    }

    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        Ok(Self::new(Manifest::from_file(path)?))
    }

    /// Fetch manifest over HTTP
    #[cfg(feature = "remote")]
    pub fn from_url(url: &str) -> Result<Self, ManifestError> {
        Ok(Self::new(Manifest::from_url(url)?))
    }

    /// Apply the filter and dialect of a config
    pub fn configure(self, config: &Config) -> Self {
        let dbt = self.filter(ModelFilter::from(&config.filter));
        match config.dialect {
            Some(dialect) => dbt.dialect(dialect),
            None => dbt,
        }
    }

    /// Restrict the selected models
    pub fn filter(mut self, filter: ModelFilter) -> Self {
        self.filter = filter;
        self.models = OnceLock::new();
        self
    }

    /// Resolve column types with a single warehouse's type names
    pub fn dialect(mut self, dialect: SourceDialect) -> Self {
        self.dialect = Some(dialect);
        self.models = OnceLock::new();
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Column tests of the whole manifest, built on first access
    pub fn test_index(&self) -> &TestIndex {
        self.test_index.get_or_init(|| TestIndex::build(&self.manifest))
    }

    /// Selected models in manifest order, built on first access
    pub fn models(&self) -> &[Model] {
        self.models.get_or_init(|| {
            selector::select(
                &self.manifest,
                &self.filter,
                self.test_index(),
                TypeMapper::shared(self.dialect),
            )
        })
    }

    /// Look up a selected model by name
    pub fn model(&self, name: &str) -> Result<&Model, DbtError> {
        self.models()
            .iter()
            .find(|model| model.name() == name)
            .ok_or_else(|| DbtError::ModelNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubedbt_core::DimensionType;
    use serde_json::json;

    fn manifest() -> Manifest {
        Manifest::from_value(json!({
            "nodes": {
                "model.jaffle_shop.users_copy": {
                    "name": "users_copy",
                    "resource_type": "model",
                    "config": { "materialized": "table", "tags": ["cube"] },
                    "path": "example/users_copy.sql",
                    "columns": {
                        "id": { "name": "id", "data_type": "timestamp_ntz" }
                    }
                },
                "model.jaffle_shop.users_copy_2": {
                    "name": "users_copy_2",
                    "resource_type": "model",
                    "config": { "materialized": "view", "tags": [] },
                    "path": "marts/users_copy_2.sql"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn load_models_by_path_prefix() {
        let dbt = Dbt::new(manifest()).filter(ModelFilter::new().path_prefix("marts/"));
        let names: Vec<_> = dbt.models().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["users_copy_2"]);
    }

    #[test]
    fn load_models_by_tag() {
        let dbt = Dbt::new(manifest()).filter(ModelFilter::new().tag("cube"));
        let names: Vec<_> = dbt.models().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["users_copy"]);
    }

    #[test]
    fn load_models_by_name() {
        let dbt = Dbt::new(manifest()).filter(ModelFilter::new().name("users_copy_2"));
        let names: Vec<_> = dbt.models().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["users_copy_2"]);
    }

    #[test]
    fn model_lookup() {
        let dbt = Dbt::new(manifest());
        assert_eq!(dbt.model("users_copy_2").unwrap().name(), "users_copy_2");

        let filtered = Dbt::new(manifest()).filter(ModelFilter::new().tag("cube"));
        assert!(matches!(
            filtered.model("users_copy_2"),
            Err(DbtError::ModelNotFound(name)) if name == "users_copy_2"
        ));
    }

    #[test]
    fn models_are_memoized() {
        let dbt = Dbt::new(manifest());
        let first = dbt.models().as_ptr();
        assert_eq!(dbt.models().as_ptr(), first);
        assert!(std::ptr::eq(dbt.test_index(), dbt.test_index()));
    }

    #[test]
    fn configure_applies_dialect_and_filter() {
        let mut config = Config::default();
        config.filter.tags = vec!["cube".to_string()];

        let dbt = Dbt::new(manifest()).configure(&config);
        let column = dbt.model("users_copy").unwrap().column("id").unwrap();
        assert_eq!(column.dimension_type(), Ok(DimensionType::Time));

        config.dialect = Some(SourceDialect::BigQuery);
        let dbt = Dbt::new(manifest()).configure(&config);
        let column = dbt.model("users_copy").unwrap().column("id").unwrap();
        assert!(column.dimension_type().is_err());
        assert!(dbt.model("users_copy_2").is_err());
    }
}
