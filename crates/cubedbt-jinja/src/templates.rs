//! Cube template rendering
//!
//! Renders Cube data model templates with the dbt project exposed through
//! the `models` global and the model helper functions.

use crate::context;
use crate::functions::{self, loaded, to_jinja_error};
use cubedbt_core::IndentConfig;
use cubedbt_dbt::Dbt;
use minijinja::value::Kwargs;
use minijinja::{context, Environment, Error as JinjaError, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error during template rendering
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to render {}: {source}", display_name(.file_path))]
    RenderError {
        file_path: Option<PathBuf>,
        #[source]
        source: JinjaError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn display_name(file_path: &Option<PathBuf>) -> String {
    file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "template".to_string())
}

/// Template renderer with an optional dbt project attached
#[derive(Debug, Clone, Default)]
pub struct CubeTemplates {
    dbt: Option<Arc<Dbt>>,
    indent: IndentConfig,
}

impl CubeTemplates {
    /// Create a renderer with no project attached
    pub fn new(indent: IndentConfig) -> Self {
        Self { dbt: None, indent }
    }

    /// Attach the project the helpers read from
    pub fn with_dbt(mut self, dbt: Arc<Dbt>) -> Self {
        self.dbt = Some(dbt);
        self
    }

    pub fn dbt(&self) -> Option<&Dbt> {
        self.dbt.as_deref()
    }

    /// Check if a template contains Jinja syntax
    pub fn has_jinja(source: &str) -> bool {
        source.contains("{{") || source.contains("{%") || source.contains("{#")
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);

        let dbt = self.dbt.clone();
        let indent = self.indent;
        env.add_function("model_as_cube", move |name: String| -> Result<String, JinjaError> {
            let dbt = loaded(dbt.as_deref()).map_err(to_jinja_error)?;
            functions::model_as_cube(dbt, &indent, &name).map_err(to_jinja_error)
        });

        let dbt = self.dbt.clone();
        env.add_function(
            "model_as_dimensions",
            move |name: String, kwargs: Kwargs| -> Result<String, JinjaError> {
                let skip: Option<Vec<String>> = kwargs.get("skip")?;
                kwargs.assert_all_used()?;
                let dbt = loaded(dbt.as_deref()).map_err(to_jinja_error)?;
                functions::model_as_dimensions(dbt, &indent, &name, &skip.unwrap_or_default())
                    .map_err(to_jinja_error)
            },
        );

        let dbt = self.dbt.clone();
        env.add_function(
            "column_as_dimension",
            move |model: String, column: String| -> Result<String, JinjaError> {
                let dbt = loaded(dbt.as_deref()).map_err(to_jinja_error)?;
                functions::column_as_dimension(dbt, &indent, &model, &column).map_err(to_jinja_error)
            },
        );

        let dbt = self.dbt.clone();
        env.add_function("model_primary_key", move |name: String| -> Result<Value, JinjaError> {
            let dbt = loaded(dbt.as_deref()).map_err(to_jinja_error)?;
            functions::model_primary_key(dbt, &name)
                .map(Value::from)
                .map_err(to_jinja_error)
        });

        if let Some(dbt) = &self.dbt {
            env.add_global("models", context::models_value(dbt));
        }

        env
    }

    /// Render a template
    pub fn render(&self, source: &str, file_path: Option<&Path>) -> Result<String, TemplateError> {
        if !Self::has_jinja(source) {
            return Ok(source.to_string());
        }

        self.environment()
            .render_str(source, context! {})
            .map_err(|source| TemplateError::RenderError {
                file_path: file_path.map(|p| p.to_path_buf()),
                source,
            })
    }

    /// Render a template file
    pub fn render_file(&self, path: &Path) -> Result<String, TemplateError> {
        let source = std::fs::read_to_string(path)?;
        self.render(&source, Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubedbt_dbt::Manifest;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn templates() -> CubeTemplates {
        let manifest = Manifest::from_value(json!({
            "nodes": {
                "model.p.orders": {
                    "name": "orders",
                    "resource_type": "model",
                    "relation_name": "analytics.orders",
                    "config": { "materialized": "table" },
                    "columns": {
                        "id": { "name": "id", "data_type": "int64", "tags": ["primary_key"] },
                        "status": { "name": "status", "data_type": "string" }
                    }
                },
                "model.p.broken": {
                    "name": "broken",
                    "resource_type": "model",
                    "relation_name": "analytics.broken",
                    "config": { "materialized": "table" },
                    "columns": {
                        "blob": { "name": "blob", "data_type": "hyperloglog" }
                    }
                }
            }
        }))
        .unwrap();

        CubeTemplates::new(IndentConfig::default()).with_dbt(Arc::new(Dbt::new(manifest)))
    }

    #[test]
    fn test_has_jinja() {
        assert!(CubeTemplates::has_jinja("cubes:\n  - {{ model_as_cube('orders') }}"));
        assert!(CubeTemplates::has_jinja("{% for model in models %}{% endfor %}"));
        assert!(CubeTemplates::has_jinja("{# comment #}"));
        assert!(!CubeTemplates::has_jinja("cubes: []"));
    }

    #[test]
    fn test_no_jinja_passthrough() {
        let rendered = CubeTemplates::default().render("cubes: []\n", None).unwrap();
        assert_eq!(rendered, "cubes: []\n");
    }

    #[test]
    fn test_render_cube_template() {
        let template = "\
cubes:
  - {{ model_as_cube('orders') }}dimensions:
      {{ model_as_dimensions('orders') }}";

        let expected = "\
cubes:
  - name: orders
    sql_table: analytics.orders
    dimensions:
      - name: id
        sql: id
        type: number
        primary_key: true
      - name: status
        sql: status
        type: string
      ";

        assert_eq!(templates().render(template, None).unwrap(), expected);
    }

    #[test]
    fn test_models_global() {
        let template = "{% for model in models %}{{ model.name }}={{ model.primary_key | join(',') }};{% endfor %}";
        assert_eq!(templates().render(template, None).unwrap(), "orders=id;broken=;");
    }

    #[test]
    fn test_skip_kwarg() {
        let template = "{{ model_as_dimensions('broken', skip=['blob']) }}|{{ model_primary_key('orders') | join(',') }}";
        assert_eq!(templates().render(template, None).unwrap(), "|id");
    }

    #[test]
    fn test_type_error_aborts_render() {
        let err = templates()
            .render("{{ model_as_dimensions('broken') }}", Some(Path::new("model.yml.jinja")))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("model.yml.jinja"), "{message}");
        assert!(message.contains("Unknown column type of broken.blob: hyperloglog"), "{message}");
    }

    #[test]
    fn test_manifest_not_loaded() {
        let err = CubeTemplates::default()
            .render("{{ model_as_cube('orders') }}", None)
            .unwrap_err();
        assert!(err.to_string().contains("No dbt manifest has been loaded"));
    }

    #[test]
    fn test_render_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.yml.jinja");
        std::fs::write(&path, "{{ column_as_dimension('orders', 'status') }}").unwrap();

        assert_eq!(
            templates().render_file(&path).unwrap(),
            "name: status\n        sql: status\n        type: string\n        "
        );
    }
}
