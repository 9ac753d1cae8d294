//! Turns a parsed reference page into the two registries.
//!
//! Pass one segments the page, classifies every entry and infers types with
//! references left unresolved. Pass two builds the immutable [`TypeRegistry`] from the
//! data-type names and resolves every reference against it; a target that is not a
//! registered data type becomes opaque.

pub mod infer;
pub mod prose;
pub mod returns;
pub mod segment;

use tracing::{debug, info, instrument};

use docbind_html::Document;
use docbind_shared::{
    DataTypeEntry, FieldSpec, OperationEntry, ParamSpec, Registries, Result, ScrapeConfig,
    TypeRegistry,
};

pub use infer::{canonical_type, normalize_type_cell, normalize_type_text};
pub use prose::extract_prose;
pub use returns::{RETURN_TEMPLATES, ReturnMatch, infer_return_type, match_return};
pub use segment::{EntryKind, RawEntry, Segmenter};

/// Scrape `doc` into resolved registries.
#[instrument(skip_all)]
pub fn scrape(doc: &Document, config: &ScrapeConfig) -> Result<Registries> {
    let segmenter = Segmenter::new(config)?;
    let content = segmenter.content(doc)?;
    let entries = segmenter.segment(content);

    let unresolved = classify_entries(&entries)?;
    let registry = unresolved.type_registry();
    let registries = resolve(unresolved, &registry);

    info!(
        types = registries.types.len(),
        operations = registries.operations.len(),
        "reference page scraped"
    );
    Ok(registries)
}

/// Pass one: build entries with unresolved references, in document order.
pub fn classify_entries(entries: &[RawEntry<'_>]) -> Result<Registries> {
    let mut registries = Registries::default();

    for entry in entries {
        match entry.classify() {
            EntryKind::DataType => {
                if entry.table.is_none() {
                    debug!(title = %entry.title, "data type without table discarded");
                    continue;
                }
                registries.types.push(DataTypeEntry {
                    name: entry.title.clone(),
                    description: entry.description.clone(),
                    additional_notes: entry.additional_notes.clone(),
                    fields: entry.fields()?,
                });
            }
            EntryKind::Operation => {
                registries.operations.push(OperationEntry {
                    name: entry.title.clone(),
                    description: entry.description.clone(),
                    additional_notes: entry.additional_notes.clone(),
                    parameters: entry.parameters()?,
                    return_type: infer_return_type(&entry.description)?,
                });
            }
        }
    }

    Ok(registries)
}

/// Pass two: resolve every reference against `registry`.
pub fn resolve(registries: Registries, registry: &TypeRegistry) -> Registries {
    let types = registries
        .types
        .into_iter()
        .map(|entry| DataTypeEntry {
            fields: entry
                .fields
                .into_iter()
                .map(|field| FieldSpec {
                    ty: field.ty.resolve(registry),
                    ..field
                })
                .collect(),
            ..entry
        })
        .collect();

    let operations = registries
        .operations
        .into_iter()
        .map(|op| OperationEntry {
            parameters: op
                .parameters
                .into_iter()
                .map(|param| ParamSpec {
                    ty: param.ty.resolve(registry),
                    ..param
                })
                .collect(),
            return_type: op.return_type.resolve(registry),
            ..op
        })
        .collect();

    Registries { types, operations }
}
