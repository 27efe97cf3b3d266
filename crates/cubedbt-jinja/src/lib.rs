//! Jinja templating for Cube data models
//!
//! This crate handles:
//! - Exposing selected dbt models to templates (`models` global)
//! - Model helpers: `model_as_cube`, `model_as_dimensions`,
//!   `column_as_dimension`, `model_primary_key`
//! - Rendering template strings and files

pub mod templates;
pub mod context;
pub mod functions;

pub use templates::{CubeTemplates, TemplateError};
pub use context::{ModelContext, models};
