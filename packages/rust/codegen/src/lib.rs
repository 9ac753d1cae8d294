//! Artifact emitter: the registry dump, the data-model source and the operation-binding
//! source.
//!
//! Rendering is pure. The same registries and options always produce the same bytes,
//! so a frozen dump regenerates identical sources.

pub mod bindings;
pub mod doc;
pub mod dump;
pub mod models;
pub mod naming;

use tracing::{debug, instrument};

use docbind_shared::{OutputConfig, Registries, Result};

pub use bindings::render_bindings;
pub use dump::{parse_operations, parse_types, render_dump};
pub use models::{render_models, rust_return_type, rust_type};
pub use naming::{field_name, method_name, request_type_name};

/// Names the generated bindings are written against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Type the operation methods are implemented on.
    pub client_type: String,
    /// Error type of the transport primitive.
    pub error_type: String,
    /// Module path exporting the client and error types.
    pub transport_path: String,
    /// Module path exporting the generated models.
    pub models_path: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from(&OutputConfig::default())
    }
}

impl From<&OutputConfig> for EmitOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            client_type: config.client_type.clone(),
            error_type: config.error_type.clone(),
            transport_path: config.transport_path.clone(),
            models_path: config.models_path.clone(),
        }
    }
}

/// Rendered contents of all artifacts, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub types_json: String,
    pub operations_json: String,
    pub models: String,
    pub bindings: String,
}

/// Render every artifact from resolved registries.
#[instrument(skip_all, fields(types = registries.types.len(), operations = registries.operations.len()))]
pub fn render(registries: &Registries, opts: &EmitOptions) -> Result<Artifacts> {
    let artifacts = Artifacts {
        types_json: render_dump(&registries.types)?,
        operations_json: render_dump(&registries.operations)?,
        models: render_models(&registries.types),
        bindings: render_bindings(&registries.operations, opts),
    };

    debug!(
        models_bytes = artifacts.models.len(),
        bindings_bytes = artifacts.bindings.len(),
        "artifacts rendered"
    );
    Ok(artifacts)
}

/// Rebuild the registries from a snapshot's two dump files.
pub fn load_registries(types_json: &str, operations_json: &str) -> Result<Registries> {
    Ok(Registries {
        types: parse_types(types_json)?,
        operations: parse_operations(operations_json)?,
    })
}
