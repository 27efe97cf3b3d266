//! Selected dbt models and their cube rendering

use crate::column::{Column, Dimension};
use crate::error::DbtError;
use crate::manifest::{ManifestNode, Meta, ModelConstraint};
use crate::primary_key::{self, PrimaryKey, PrimaryKeySource};
use crate::test_index::ColumnTests;
use cubedbt_core::{dump, dump_seq, TypeMapper, TypeMappingError};
use serde::Serialize;
use std::sync::OnceLock;

/// A materialized dbt model
#[derive(Debug)]
pub struct Model {
    unique_id: String,
    name: String,
    description: Option<String>,
    path: String,
    database: Option<String>,
    schema: Option<String>,
    alias: Option<String>,
    relation_name: Option<String>,
    materialized: Option<String>,
    tags: Vec<String>,
    meta: Meta,
    constraints: Vec<ModelConstraint>,
    columns: Vec<Column>,
    primary_key: OnceLock<PrimaryKey>,
}

impl Model {
    /// Build a model from its manifest node and the tests of its columns
    pub fn from_node(
        unique_id: impl Into<String>,
        node: &ManifestNode,
        tests: Option<&ColumnTests>,
        type_mapper: &'static TypeMapper,
    ) -> Self {
        let columns = node
            .columns
            .iter()
            .map(|(key, definition)| {
                let name = if definition.name.is_empty() { key } else { &definition.name };
                let column_tests = tests
                    .and_then(|tests| tests.get(name))
                    .cloned()
                    .unwrap_or_default();
                Column::new(node.name.clone(), key, definition, column_tests, type_mapper)
            })
            .collect();

        Self {
            unique_id: unique_id.into(),
            name: node.name.clone(),
            description: node.description.clone(),
            path: node.path.clone(),
            database: node.database.clone(),
            schema: node.schema.clone(),
            alias: node.alias.clone(),
            relation_name: node.relation_name.clone(),
            materialized: node.config.materialized.clone(),
            tags: node.config.tags.clone(),
            meta: node.meta.clone(),
            constraints: node.constraints.clone(),
            columns,
            primary_key: OnceLock::new(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Path of the model file, relative to the models directory
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn materialized(&self) -> Option<&str> {
        self.materialized.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn constraints(&self) -> &[ModelConstraint] {
        &self.constraints
    }

    /// Fully qualified table the cube reads from
    ///
    /// dbt's own `relation_name` is used verbatim when present. Otherwise the
    /// name is composed from database, schema and alias (or model name),
    /// skipping parts the manifest leaves out.
    pub fn sql_table(&self) -> String {
        if let Some(relation_name) = &self.relation_name {
            return relation_name.clone();
        }

        let table = self.alias.as_deref().unwrap_or(&self.name);
        [self.database.as_deref(), self.schema.as_deref(), Some(table)]
            .into_iter()
            .flatten()
            .map(|part| format!("`{}`", part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column, DbtError> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| DbtError::ColumnNotFound {
                model: self.name.clone(),
                column: name.to_string(),
            })
    }

    fn detected_primary_key(&self) -> &PrimaryKey {
        self.primary_key
            .get_or_init(|| primary_key::detect(&self.name, &self.constraints, &self.columns))
    }

    /// Primary key columns, computed on first access
    pub fn primary_key(&self) -> Vec<&Column> {
        self.detected_primary_key()
            .columns
            .iter()
            .map(|&position| &self.columns[position])
            .collect()
    }

    /// Which detection rule produced the primary key
    pub fn primary_key_source(&self) -> PrimaryKeySource {
        self.detected_primary_key().source
    }

    /// Whether the named column is part of the primary key
    pub fn is_primary_key(&self, column: &str) -> bool {
        let key = self.detected_primary_key();
        self.columns
            .iter()
            .position(|c| c.name() == column)
            .is_some_and(|position| key.contains(position))
    }

    /// Cube definition; an empty description is omitted
    pub fn to_cube(&self) -> Cube {
        Cube {
            name: self.name.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            sql_table: self.sql_table(),
        }
    }

    /// Cube rendered as YAML
    pub fn as_cube(&self, indent: usize) -> Result<String, DbtError> {
        Ok(dump(&self.to_cube(), indent)?)
    }

    /// Dimensions of every column not named in `skip`, in declaration order
    pub fn to_dimensions(&self, skip: &[String]) -> Result<Vec<Dimension>, TypeMappingError> {
        let key = self.detected_primary_key();
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !skip.iter().any(|s| s == column.name()))
            .map(|(position, column)| column.to_dimension(key.contains(position)))
            .collect()
    }

    /// Dimensions rendered as a YAML sequence; no dimensions render as ""
    pub fn as_dimensions(&self, skip: &[String], indent: usize) -> Result<String, DbtError> {
        Ok(dump_seq(&self.to_dimensions(skip)?, indent)?)
    }

    /// A single column rendered as a dimension
    pub fn column_as_dimension(&self, name: &str, indent: usize) -> Result<String, DbtError> {
        let column = self.column(name)?;
        column.as_dimension(self.is_primary_key(name), indent)
    }
}

/// Cube definition, serialized with keys in this order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cube {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub sql_table: String,
}
