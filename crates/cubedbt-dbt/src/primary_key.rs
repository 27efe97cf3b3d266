//! Primary key detection
//!
//! Constraints take precedence: if any `primary_key` constraint (model-level,
//! then column-level) names a known column, only constraints count.
//! Otherwise a column is part of the key if it is tagged `primary_key` or
//! tested both `unique` and `not_null`. Composite keys are allowed.

use crate::column::{Column, PRIMARY_KEY_TAG};
use crate::manifest::{ConstraintType, ModelConstraint};
use serde::Serialize;

/// Where a model's primary key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryKeySource {
    Constraint,
    Tag,
    Test,
    /// Some columns tagged, others found through tests only
    Mixed,
    None,
}

impl std::fmt::Display for PrimaryKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint => write!(f, "constraint"),
            Self::Tag => write!(f, "tag"),
            Self::Test => write!(f, "test"),
            Self::Mixed => write!(f, "tag and test"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Detected primary key: positions into the model's column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    /// How the key columns were found
    pub source: PrimaryKeySource,
    /// Positions in declaration order
    pub columns: Vec<usize>,
}

impl PrimaryKey {
    fn none() -> Self {
        Self {
            source: PrimaryKeySource::None,
            columns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.columns.contains(&position)
    }
}

/// Detect the primary key of a model from its constraints and columns
pub fn detect(model_name: &str, constraints: &[ModelConstraint], columns: &[Column]) -> PrimaryKey {
    let by_constraint = from_constraints(model_name, constraints, columns);
    if !by_constraint.is_empty() {
        return PrimaryKey {
            source: PrimaryKeySource::Constraint,
            columns: by_constraint,
        };
    }

    let tagged = |c: &Column| c.has_tag(PRIMARY_KEY_TAG);
    let tested = |c: &Column| c.has_test("unique") && c.has_test("not_null");

    let by_convention = positions(columns, |c| tagged(c) || tested(c));
    if !by_convention.is_empty() {
        let any_tagged = by_convention.iter().any(|&i| tagged(&columns[i]));
        let all_tagged = by_convention.iter().all(|&i| tagged(&columns[i]));
        let source = match (any_tagged, all_tagged) {
            (_, true) => PrimaryKeySource::Tag,
            (true, false) => PrimaryKeySource::Mixed,
            (false, false) => PrimaryKeySource::Test,
        };
        return PrimaryKey {
            source,
            columns: by_convention,
        };
    }

    PrimaryKey::none()
}

/// Constraint columns in first-seen order; unknown names are dropped
fn from_constraints(
    model_name: &str,
    constraints: &[ModelConstraint],
    columns: &[Column],
) -> Vec<usize> {
    let mut found = Vec::new();

    let declared = constraints
        .iter()
        .filter(|c| c.constraint_type == ConstraintType::PrimaryKey)
        .flat_map(|c| c.columns.iter());

    for name in declared {
        match columns.iter().position(|c| c.name() == name) {
            Some(position) if !found.contains(&position) => found.push(position),
            Some(_) => {}
            None => tracing::warn!(
                model = model_name,
                column = name.as_str(),
                "primary key constraint references unknown column"
            ),
        }
    }

    for (position, column) in columns.iter().enumerate() {
        if column.has_constraint(ConstraintType::PrimaryKey) && !found.contains(&position) {
            found.push(position);
        }
    }

    found
}

fn positions(columns: &[Column], predicate: impl Fn(&Column) -> bool) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, column)| predicate(column))
        .map(|(position, _)| position)
        .collect()
}
