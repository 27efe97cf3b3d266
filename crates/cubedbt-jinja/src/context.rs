//! Template context
//!
//! Describes the selected models to templates, so they can loop over them.

use cubedbt_dbt::{Dbt, Model};
use minijinja::Value;
use serde::Serialize;

/// A selected model as seen by templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelContext {
    pub name: String,
    pub description: Option<String>,
    pub sql_table: String,
    pub path: String,
    pub tags: Vec<String>,
    pub primary_key: Vec<String>,
}

impl From<&Model> for ModelContext {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name().to_string(),
            description: model.description().map(str::to_string),
            sql_table: model.sql_table(),
            path: model.path().to_string(),
            tags: model.tags().to_vec(),
            primary_key: model
                .primary_key()
                .iter()
                .map(|column| column.name().to_string())
                .collect(),
        }
    }
}

/// Every selected model, in manifest order
pub fn models(dbt: &Dbt) -> Vec<ModelContext> {
    dbt.models().iter().map(ModelContext::from).collect()
}

/// The `models` global
pub fn models_value(dbt: &Dbt) -> Value {
    Value::from_serialize(models(dbt))
}
