//! Dimension types and source type mapping
//!
//! Maps warehouse-specific column types (as written in dbt `data_type`) to the
//! small, fixed set of Cube dimension types.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

/// Cube dimension type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    /// Boolean dimension
    Boolean,

    /// Geographic dimension (latitude/longitude)
    Geo,

    /// Numeric dimension
    Number,

    /// Textual dimension
    String,

    /// Date/time dimension
    Time,
}

impl DimensionType {
    /// Every valid dimension type
    pub const ALL: [DimensionType; 5] = [
        Self::Boolean,
        Self::Geo,
        Self::Number,
        Self::String,
        Self::Time,
    ];

    /// Name used in Cube data model files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Geo => "geo",
            Self::Number => "number",
            Self::String => "string",
            Self::Time => "time",
        }
    }
}

impl std::fmt::Display for DimensionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A name that is not one of the dimension types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a dimension type: {0}")]
pub struct UnknownDimensionType(pub String);

impl FromStr for DimensionType {
    type Err = UnknownDimensionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownDimensionType(s.to_string()))
    }
}

/// Warehouse whose type names appear in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDialect {
    /// Google BigQuery
    BigQuery,

    /// Snowflake
    Snowflake,

    /// Amazon Redshift
    Redshift,
}

impl SourceDialect {
    /// Layering order of dialect tables; later entries win on collision
    pub const PRECEDENCE: [SourceDialect; 3] = [Self::BigQuery, Self::Snowflake, Self::Redshift];

    fn table(&self) -> &'static [(&'static str, DimensionType)] {
        match self {
            Self::BigQuery => BIGQUERY_TYPES,
            Self::Snowflake => SNOWFLAKE_TYPES,
            Self::Redshift => REDSHIFT_TYPES,
        }
    }
}

impl std::fmt::Display for SourceDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BigQuery => write!(f, "bigquery"),
            Self::Snowflake => write!(f, "snowflake"),
            Self::Redshift => write!(f, "redshift"),
        }
    }
}

use DimensionType::{Boolean, Geo, Number, String as Text, Time};

/// ANSI-style names understood regardless of warehouse
const GENERIC_TYPES: &[(&str, DimensionType)] = &[
    ("bool", Boolean),
    ("boolean", Boolean),
    ("int", Number),
    ("integer", Number),
    ("bigint", Number),
    ("smallint", Number),
    ("tinyint", Number),
    ("decimal", Number),
    ("numeric", Number),
    ("float", Number),
    ("double", Number),
    ("double precision", Number),
    ("real", Number),
    ("char", Text),
    ("character", Text),
    ("varchar", Text),
    ("character varying", Text),
    ("text", Text),
    ("uuid", Text),
    ("date", Time),
    ("time", Time),
    ("datetime", Time),
    ("timestamp", Time),
    // Structural values are opaque text at the semantic layer
    ("array", Text),
    ("json", Text),
    ("jsonb", Text),
    ("object", Text),
    ("record", Text),
    ("struct", Text),
    ("variant", Text),
];

const BIGQUERY_TYPES: &[(&str, DimensionType)] = &[
    ("array", Text),
    ("bool", Boolean),
    ("bytes", Text),
    ("date", Time),
    ("datetime", Time),
    ("geography", Geo),
    ("interval", Text),
    ("json", Text),
    ("int64", Number),
    ("int", Number),
    ("smallint", Number),
    ("integer", Number),
    ("bigint", Number),
    ("tinyint", Number),
    ("byteint", Number),
    ("numeric", Number),
    ("decimal", Number),
    ("bignumeric", Number),
    ("bigdecimal", Number),
    ("float64", Number),
    ("range", Text),
    ("string", Text),
    ("struct", Text),
    ("record", Text),
    ("time", Time),
    ("timestamp", Time),
];

const SNOWFLAKE_TYPES: &[(&str, DimensionType)] = &[
    ("number", Number),
    ("decimal", Number),
    ("dec", Number),
    ("numeric", Number),
    ("int", Number),
    ("integer", Number),
    ("bigint", Number),
    ("smallint", Number),
    ("tinyint", Number),
    ("byteint", Number),
    ("float", Number),
    ("float4", Number),
    ("float8", Number),
    ("double", Number),
    ("double precision", Number),
    ("real", Number),
    ("varchar", Text),
    ("char", Text),
    ("character", Text),
    ("nchar", Text),
    ("string", Text),
    ("text", Text),
    ("nvarchar", Text),
    ("nvarchar2", Text),
    ("char varying", Text),
    ("nchar varying", Text),
    ("binary", Text),
    ("varbinary", Text),
    ("boolean", Boolean),
    ("date", Time),
    ("datetime", Time),
    ("time", Time),
    ("timestamp", Time),
    ("timestamp_ltz", Time),
    ("timestamp_ntz", Time),
    ("timestamp_tz", Time),
    ("variant", Text),
    ("object", Text),
    ("array", Text),
    ("map", Text),
    ("vector", Text),
    ("geography", Geo),
    // Planar coordinates, not latitude/longitude
    ("geometry", Text),
];

const REDSHIFT_TYPES: &[(&str, DimensionType)] = &[
    ("smallint", Number),
    ("int2", Number),
    ("integer", Number),
    ("int", Number),
    ("int4", Number),
    ("bigint", Number),
    ("int8", Number),
    ("decimal", Number),
    ("numeric", Number),
    ("real", Number),
    ("float4", Number),
    ("double precision", Number),
    ("float8", Number),
    ("float", Number),
    ("char", Text),
    ("character", Text),
    ("nchar", Text),
    ("bpchar", Text),
    ("varchar", Text),
    ("character varying", Text),
    ("nvarchar", Text),
    ("text", Text),
    ("date", Time),
    ("time", Time),
    ("time without time zone", Time),
    ("timetz", Time),
    ("time with time zone", Time),
    ("timestamp", Time),
    ("timestamp without time zone", Time),
    ("timestamptz", Time),
    ("timestamp with time zone", Time),
    ("interval year to month", Text),
    ("interval day to second", Text),
    ("boolean", Boolean),
    ("bool", Boolean),
    ("hllsketch", Text),
    ("super", Text),
    ("varbyte", Text),
    ("varbinary", Text),
    ("binary varying", Text),
    ("geometry", Geo),
    ("geography", Geo),
];

static PRECISION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));
static TYPE_PARAMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*>").expect("valid regex"));

static LAYERED: LazyLock<TypeMapper> = LazyLock::new(TypeMapper::layered);
static BIGQUERY: LazyLock<TypeMapper> = LazyLock::new(|| TypeMapper::for_dialect(SourceDialect::BigQuery));
static SNOWFLAKE: LazyLock<TypeMapper> = LazyLock::new(|| TypeMapper::for_dialect(SourceDialect::Snowflake));
static REDSHIFT: LazyLock<TypeMapper> = LazyLock::new(|| TypeMapper::for_dialect(SourceDialect::Redshift));

/// Model and column a type belongs to, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnContext<'a> {
    /// Model the column belongs to
    pub model_name: &'a str,
    /// Column whose type is being resolved
    pub column_name: &'a str,
}

impl<'a> ColumnContext<'a> {
    pub fn new(model_name: &'a str, column_name: &'a str) -> Self {
        Self { model_name, column_name }
    }
}

/// Raised when a column type has no dimension type counterpart
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown column type of {model}.{column}: {data_type}")]
pub struct TypeMappingError {
    pub model: String,
    pub column: String,
    pub data_type: String,
}

/// Immutable lookup from normalized source type names to dimension types
#[derive(Debug, Clone)]
pub struct TypeMapper {
    table: HashMap<&'static str, DimensionType>,
}

impl TypeMapper {
    /// Generic table overlaid with every dialect, in `SourceDialect::PRECEDENCE` order
    pub fn layered() -> Self {
        let mut table: HashMap<_, _> = GENERIC_TYPES.iter().copied().collect();
        for dialect in SourceDialect::PRECEDENCE {
            table.extend(dialect.table().iter().copied());
        }
        Self { table }
    }

    /// Generic table overlaid with a single dialect
    pub fn for_dialect(dialect: SourceDialect) -> Self {
        let mut table: HashMap<_, _> = GENERIC_TYPES.iter().copied().collect();
        table.extend(dialect.table().iter().copied());
        Self { table }
    }

    /// Process-wide mapper for an optional dialect, built on first use
    pub fn shared(dialect: Option<SourceDialect>) -> &'static TypeMapper {
        match dialect {
            None => &LAYERED,
            Some(SourceDialect::BigQuery) => &BIGQUERY,
            Some(SourceDialect::Snowflake) => &SNOWFLAKE,
            Some(SourceDialect::Redshift) => &REDSHIFT,
        }
    }

    /// Lower-case and drop precision qualifiers and type parameters
    ///
    /// `NUMERIC(38, 0)` becomes `numeric`, `ARRAY<STRUCT<a INT64>>` becomes `array`.
    pub fn normalize(data_type: &str) -> String {
        let lower = data_type.to_lowercase();
        let without_precision = PRECISION.replace_all(&lower, "");
        let without_params = TYPE_PARAMS.replace_all(&without_precision, "");
        without_params.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Look up an already-normalized name
    pub fn lookup(&self, normalized: &str) -> Option<DimensionType> {
        self.table.get(normalized).copied()
    }

    /// Resolve a raw `data_type` to a dimension type
    ///
    /// Missing types and types that normalize to nothing are strings. Names
    /// not found in the table pass through if they already are dimension types.
    pub fn resolve(
        &self,
        data_type: Option<&str>,
        context: ColumnContext<'_>,
    ) -> Result<DimensionType, TypeMappingError> {
        let Some(raw) = data_type else {
            return Ok(DimensionType::String);
        };

        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Ok(DimensionType::String);
        }

        match self.lookup(&normalized) {
            Some(dimension_type) => Ok(dimension_type),
            None => normalized.parse().map_err(|_| TypeMappingError {
                model: context.model_name.to_string(),
                column: context.column_name.to_string(),
                data_type: raw.to_string(),
            }),
        }
    }
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self::layered()
    }
}

/// Resolve with the layered mapper shared by the process
pub fn resolve_type(
    data_type: Option<&str>,
    context: ColumnContext<'_>,
) -> Result<DimensionType, TypeMappingError> {
    TypeMapper::shared(None).resolve(data_type, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ColumnContext<'static> {
        ColumnContext::new("orders", "amount")
    }

    #[test]
    fn missing_type_is_string() {
        assert_eq!(resolve_type(None, ctx()), Ok(DimensionType::String));
    }

    #[test]
    fn precision_and_case_are_ignored() {
        assert_eq!(resolve_type(Some("NUMERIC(38,0)"), ctx()), Ok(DimensionType::Number));
        assert_eq!(resolve_type(Some("timestamp(3)"), ctx()), Ok(DimensionType::Time));
        assert_eq!(
            resolve_type(Some("character varying(256)"), ctx()),
            Ok(DimensionType::String)
        );
        assert_eq!(
            resolve_type(Some("TIMESTAMP(6) WITH TIME ZONE"), ctx()),
            Ok(DimensionType::Time)
        );
    }

    #[test]
    fn structural_types_are_strings() {
        for raw in ["ARRAY<STRUCT<a INT64, b STRING>>", "struct<x int>", "JSON", "variant", "super"] {
            assert_eq!(resolve_type(Some(raw), ctx()), Ok(DimensionType::String), "{raw}");
        }
    }

    #[test]
    fn empty_type_is_string() {
        assert_eq!(resolve_type(Some(""), ctx()), Ok(DimensionType::String));
        assert_eq!(resolve_type(Some("(10)"), ctx()), Ok(DimensionType::String));
    }

    #[test]
    fn dimension_type_names_pass_through() {
        assert_eq!(resolve_type(Some("geo"), ctx()), Ok(DimensionType::Geo));
        assert_eq!(resolve_type(Some("number"), ctx()), Ok(DimensionType::Number));
    }

    #[test]
    fn unknown_type_fails() {
        let err = resolve_type(Some("unknown_type"), ctx()).unwrap_err();
        assert_eq!(err.model, "orders");
        assert_eq!(err.column, "amount");
        assert_eq!(err.data_type, "unknown_type");
        assert_eq!(err.to_string(), "Unknown column type of orders.amount: unknown_type");
    }

    #[test]
    fn later_dialects_win_collisions() {
        assert_eq!(resolve_type(Some("GEOMETRY"), ctx()), Ok(DimensionType::Geo));

        let snowflake = TypeMapper::for_dialect(SourceDialect::Snowflake);
        assert_eq!(snowflake.resolve(Some("GEOMETRY"), ctx()), Ok(DimensionType::String));
    }

    #[test]
    fn dialect_mapper_keeps_generic_fallback() {
        let bigquery = TypeMapper::shared(Some(SourceDialect::BigQuery));
        assert_eq!(bigquery.resolve(Some("varchar(10)"), ctx()), Ok(DimensionType::String));
        assert_eq!(bigquery.resolve(Some("INT64"), ctx()), Ok(DimensionType::Number));
        assert!(bigquery.resolve(Some("timestamp_ntz"), ctx()).is_err());
    }

    #[test]
    fn every_table_entry_resolves() {
        let layered = TypeMapper::layered();
        for (name, _) in GENERIC_TYPES
            .iter()
            .chain(BIGQUERY_TYPES)
            .chain(SNOWFLAKE_TYPES)
            .chain(REDSHIFT_TYPES)
        {
            assert!(layered.lookup(name).is_some(), "{name}");
            assert_eq!(TypeMapper::normalize(&name.to_uppercase()), *name);
        }
    }

    #[test]
    fn dimension_type_display() {
        assert_eq!(DimensionType::Boolean.to_string(), "boolean");
        assert_eq!("time".parse::<DimensionType>(), Ok(DimensionType::Time));
        assert_eq!(
            "timestamp".parse::<DimensionType>(),
            Err(UnknownDimensionType("timestamp".to_string()))
        );
        assert_eq!(
            UnknownDimensionType("timestamp".to_string()).to_string(),
            "Not a dimension type: timestamp"
        );
    }
}
