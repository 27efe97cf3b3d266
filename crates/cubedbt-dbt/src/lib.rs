//! dbt manifest to Cube model translation
//!
//! This crate handles:
//! - Parsing manifest.json (dbt-generated artifacts)
//! - Indexing column tests by model and column
//! - Selecting models by path, tag and name
//! - Detecting primary keys (constraints, tags, tests)
//! - Rendering models as cubes and columns as dimensions

pub mod manifest;
pub mod test_index;
pub mod column;
pub mod primary_key;
pub mod model;
pub mod selector;
pub mod project;
pub mod error;

pub use manifest::{Manifest, ManifestNode, ManifestError, ManifestMetadata, NodeConfig, ColumnDefinition, ModelConstraint, ColumnConstraint, ConstraintType, TestMetadata, DependsOn, Meta};
pub use test_index::{TestIndex, ColumnTests};
pub use column::{Column, Dimension, PRIMARY_KEY_TAG};
pub use primary_key::{PrimaryKey, PrimaryKeySource};
pub use model::{Model, Cube};
pub use selector::{ModelFilter, select};
pub use project::Dbt;
pub use error::DbtError;
