//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract models, their columns,
//! constraints and the tests attached to them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opaque `meta` mapping, kept in document order
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Resource type of a model node
pub const RESOURCE_MODEL: &str = "model";

/// Resource type of a test node
pub const RESOURCE_TEST: &str = "test";

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    #[serde(default)]
    pub metadata: ManifestMetadata,

    /// Model, test, seed and snapshot nodes, in document order
    #[serde(default)]
    pub nodes: IndexMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Build manifest from an already-decoded JSON document
    pub fn from_value(value: serde_json::Value) -> Result<Self, ManifestError> {
        serde_json::from_value(value).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Fetch and parse a manifest over HTTP
    #[cfg(feature = "remote")]
    pub fn from_url(url: &str) -> Result<Self, ManifestError> {
        let response = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .map_err(|e| ManifestError::FetchError(url.to_string(), e.to_string()))?;

        let body = response
            .text()
            .map_err(|e| ManifestError::FetchError(url.to_string(), e.to_string()))?;

        Self::from_str(&body)
    }

    /// Model nodes (any materialization), in document order
    pub fn models(&self) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.resource_type == RESOURCE_MODEL)
    }

    /// Test nodes, in document order
    pub fn tests(&self) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.resource_type == RESOURCE_TEST)
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }
}

/// Manifest metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub dbt_schema_version: Option<String>,
    #[serde(default)]
    pub dbt_version: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub adapter_type: Option<String>,
}

/// A node in the manifest (model, test, snapshot, etc.)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.jaffle_shop.orders")
    #[serde(default)]
    pub unique_id: String,

    /// Node name (e.g., "orders")
    #[serde(default)]
    pub name: String,

    /// Resource type (model, test, snapshot, etc.)
    pub resource_type: String,

    /// Package name
    #[serde(default)]
    pub package_name: String,

    /// Relative path to SQL file
    #[serde(default)]
    pub path: String,

    /// Database name
    #[serde(default)]
    pub database: Option<String>,

    /// Schema name
    #[serde(default)]
    pub schema: Option<String>,

    /// Alias (output table name)
    #[serde(default)]
    pub alias: Option<String>,

    /// Fully qualified, adapter-quoted relation
    #[serde(default)]
    pub relation_name: Option<String>,

    /// Node configuration
    #[serde(default)]
    pub config: NodeConfig,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Column definitions, in declaration order
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDefinition>,

    /// Model-level constraints
    #[serde(default)]
    pub constraints: Vec<ModelConstraint>,

    /// Generic test metadata (test nodes only)
    #[serde(default)]
    pub test_metadata: Option<TestMetadata>,

    /// Dependencies
    #[serde(default)]
    pub depends_on: DependsOn,

    /// Free-form metadata
    #[serde(default)]
    pub meta: Meta,
}

impl ManifestNode {
    /// Whether the node is materialized as `ephemeral`
    pub fn is_ephemeral(&self) -> bool {
        self.config.materialized.as_deref() == Some("ephemeral")
    }
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Whether the node is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Materialization type
    #[serde(default)]
    pub materialized: Option<String>,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            materialized: None,
            tags: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Constraint kinds dbt understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    PrimaryKey,
    ForeignKey,
    Unique,
    NotNull,
    Check,
    Custom,
    #[serde(other)]
    Other,
}

/// Model-level constraint (may span several columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConstraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub expression: Option<String>,
}

/// Constraint declared on a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConstraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub expression: Option<String>,
}

/// Column definition from manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Data type (if declared)
    #[serde(default)]
    pub data_type: Option<String>,

    /// Free-form metadata
    #[serde(default)]
    pub meta: Meta,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Column-level constraints
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
}

/// Generic test metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    /// Test kind (e.g., "unique", "not_null")
    pub name: String,

    /// Package namespace for non-builtin tests
    #[serde(default)]
    pub namespace: Option<String>,

    /// Test arguments
    #[serde(default)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

impl TestMetadata {
    /// Tested column, for column-level tests
    pub fn column_name(&self) -> Option<&str> {
        self.kwargs.get("column_name").and_then(|v| v.as_str())
    }
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// List of node unique_ids this node depends on
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Manifest loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),

    #[error("Failed to fetch manifest from {0}: {1}")]
    FetchError(String, String),
}
