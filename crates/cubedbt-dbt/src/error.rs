//! Errors raised while turning a manifest into cubes

use crate::manifest::ManifestError;
use cubedbt_core::{DumpError, TypeMappingError};

/// dbt project errors
#[derive(Debug, thiserror::Error)]
pub enum DbtError {
    #[error(transparent)]
    TypeMapping(#[from] TypeMappingError),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Column '{column}' not found in model '{model}'")]
    ColumnNotFound { model: String, column: String },

    #[error("No dbt manifest has been loaded")]
    ManifestNotLoaded,

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Dump(#[from] DumpError),
}
