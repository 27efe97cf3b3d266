//! Template helpers
//!
//! Each helper renders part of a model as YAML at the configured indentation.

use cubedbt_core::IndentConfig;
use cubedbt_dbt::{Dbt, DbtError};
use minijinja::{Error, ErrorKind};

/// `model_as_cube(name)`
pub fn model_as_cube(dbt: &Dbt, indent: &IndentConfig, name: &str) -> Result<String, DbtError> {
    dbt.model(name)?.as_cube(indent.cube)
}

/// `model_as_dimensions(name, skip=[...])`
pub fn model_as_dimensions(
    dbt: &Dbt,
    indent: &IndentConfig,
    name: &str,
    skip: &[String],
) -> Result<String, DbtError> {
    dbt.model(name)?.as_dimensions(skip, indent.dimensions)
}

/// `column_as_dimension(model, column)`
pub fn column_as_dimension(
    dbt: &Dbt,
    indent: &IndentConfig,
    model: &str,
    column: &str,
) -> Result<String, DbtError> {
    dbt.model(model)?.column_as_dimension(column, indent.dimension)
}

/// `model_primary_key(name)`: names of the primary key columns
pub fn model_primary_key(dbt: &Dbt, name: &str) -> Result<Vec<String>, DbtError> {
    Ok(dbt
        .model(name)?
        .primary_key()
        .iter()
        .map(|column| column.name().to_string())
        .collect())
}

/// Helpers fail when no project has been attached
pub fn loaded(dbt: Option<&Dbt>) -> Result<&Dbt, DbtError> {
    dbt.ok_or(DbtError::ManifestNotLoaded)
}

/// Surface a project error to the template engine
pub fn to_jinja_error(error: DbtError) -> Error {
    Error::new(ErrorKind::InvalidOperation, error.to_string()).with_source(error)
}
