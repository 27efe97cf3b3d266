//! Model columns and their dimension rendering

use crate::error::DbtError;
use crate::manifest::{ColumnConstraint, ColumnDefinition, ConstraintType, Meta};
use cubedbt_core::{dump, ColumnContext, DimensionType, TypeMapper, TypeMappingError};
use serde::Serialize;

/// Tag marking a column as (part of) the primary key
pub const PRIMARY_KEY_TAG: &str = "primary_key";

/// A column of a selected model
#[derive(Debug, Clone)]
pub struct Column {
    model_name: String,
    name: String,
    description: Option<String>,
    data_type: Option<String>,
    meta: Meta,
    tags: Vec<String>,
    constraints: Vec<ColumnConstraint>,
    tests: Vec<String>,
    type_mapper: &'static TypeMapper,
}

impl Column {
    /// Build a column from its manifest definition
    ///
    /// `key` is the column's key in the model's column mapping, used when the
    /// definition carries no name of its own.
    pub fn new(
        model_name: impl Into<String>,
        key: &str,
        definition: &ColumnDefinition,
        tests: Vec<String>,
        type_mapper: &'static TypeMapper,
    ) -> Self {
        let name = if definition.name.is_empty() {
            key.to_string()
        } else {
            definition.name.clone()
        };

        Self {
            model_name: model_name.into(),
            name,
            description: definition.description.clone(),
            data_type: definition.data_type.clone(),
            meta: definition.meta.clone(),
            tags: definition.tags.clone(),
            constraints: definition.constraints.clone(),
            tests,
            type_mapper,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning model
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// SQL expression of the dimension: the column itself
    pub fn sql(&self) -> &str {
        &self.name
    }

    /// Declared source type, as written in the manifest
    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Test kinds applied to this column
    pub fn tests(&self) -> &[String] {
        &self.tests
    }

    pub fn has_test(&self, kind: &str) -> bool {
        self.tests.iter().any(|t| t == kind)
    }

    pub fn constraints(&self) -> &[ColumnConstraint] {
        &self.constraints
    }

    pub fn has_constraint(&self, constraint_type: ConstraintType) -> bool {
        self.constraints
            .iter()
            .any(|c| c.constraint_type == constraint_type)
    }

    /// Dimension type of the declared source type
    pub fn dimension_type(&self) -> Result<DimensionType, TypeMappingError> {
        self.type_mapper.resolve(
            self.data_type(),
            ColumnContext::new(&self.model_name, &self.name),
        )
    }

    /// Dimension definition; empty description and meta are omitted
    pub fn to_dimension(&self, primary_key: bool) -> Result<Dimension, TypeMappingError> {
        Ok(Dimension {
            name: self.name.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            sql: self.sql().to_string(),
            dimension_type: self.dimension_type()?,
            primary_key: primary_key.then_some(true),
            meta: Some(self.meta.clone()).filter(|m| !m.is_empty()),
        })
    }

    /// Dimension rendered as YAML
    pub fn as_dimension(&self, primary_key: bool, indent: usize) -> Result<String, DbtError> {
        Ok(dump(&self.to_dimension(primary_key)?, indent)?)
    }
}

/// Cube dimension, serialized with keys in this order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub sql: String,

    #[serde(rename = "type")]
    pub dimension_type: DimensionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}
