//! cubedbt core
//!
//! Shared building blocks: the dimension type system, source type mapping,
//! YAML rendering and configuration.

pub mod types;
pub mod dump;
pub mod config;

pub use types::{DimensionType, SourceDialect, TypeMapper, TypeMappingError, UnknownDimensionType, ColumnContext, resolve_type};
pub use dump::{dump, dump_seq, indent_string, DumpError};
pub use config::{Config, ConfigError, FilterConfig, IndentConfig, CONFIG_FILE_NAME, DEFAULT_MANIFEST_PATH};
