//! Shared types, error model, and configuration for docbind.
//!
//! This crate is the foundation depended on by all other docbind crates.
//! It provides:
//! - [`DocbindError`]: the unified error type
//! - The inferred type model ([`TypeExpr`], [`FieldSpec`], [`DataTypeEntry`], ...)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OutputConfig, ScrapeConfig, SourceConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_source,
};
pub use error::{DocbindError, Result};
pub use types::{
    ArtifactMeta, CURRENT_SCHEMA_VERSION, DataTypeEntry, FieldSpec, OperationEntry, ParamSpec,
    Registries, Scalar, SnapshotManifest, TypeExpr, TypeRegistry,
};
