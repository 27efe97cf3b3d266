//! Rendering templates against the jaffle_shop fixture manifest

use cubedbt_core::IndentConfig;
use cubedbt_dbt::{Dbt, ModelFilter};
use cubedbt_jinja::CubeTemplates;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;

const MANIFEST_PATH: &str = "../../fixtures/jaffle-shop/target/manifest.json";

fn templates(filter: ModelFilter) -> CubeTemplates {
    let dbt = Dbt::from_file(Path::new(MANIFEST_PATH)).unwrap().filter(filter);
    CubeTemplates::new(IndentConfig::default()).with_dbt(Arc::new(dbt))
}

#[test]
fn renders_cube_per_selected_model() {
    let template = "\
cubes:
{%- for model in models %}
  - {{ model_as_cube(model.name) }}dimensions:
      {{ model_as_dimensions(model.name, skip=['first_name', 'lifetime_value', 'customer_id', 'order_date', 'status', 'amount', 'is_paid']) }}
{%- endfor %}
";

    let expected = "\
cubes:
  - name: customers
    description: One record per customer
    sql_table: '`jaffle-prod`.`analytics`.`customers`'
    dimensions:
      - name: first_order
        sql: first_order
        type: time
      
  - name: orders
    sql_table: '`jaffle-prod`.`analytics`.`orders`'
    dimensions:
      - name: order_id
        sql: order_id
        type: number
        primary_key: true
      
";

    let rendered = templates(ModelFilter::new().tag("cube")).render(template, None).unwrap();
    assert_eq!(rendered, expected);
}

#[test]
fn primary_key_helper_reports_composite_keys() {
    let rendered = templates(ModelFilter::new())
        .render("{{ model_primary_key('order_items') | join(', ') }}", None)
        .unwrap();
    assert_eq!(rendered, "order_id, product_id");
}

#[test]
fn unselected_model_aborts_render() {
    let err = templates(ModelFilter::new().path_prefix("staging/"))
        .render("{{ model_as_cube('orders') }}", None)
        .unwrap_err();
    assert!(err.to_string().contains("orders"), "{err}");
}
