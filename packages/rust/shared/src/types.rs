//! Core domain types: the inferred type model, registry entries, and the snapshot manifest.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocbindError, Result};

/// Current schema version for the snapshot manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// TypeExpr
// ---------------------------------------------------------------------------

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Int,
    Int64,
    Float,
    String,
}

impl Scalar {
    /// Canonical lowercase name, as used in the snapshot notation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::String => "string",
        }
    }

    fn from_canonical(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "int64" => Some(Self::Int64),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

/// Normalized type of a field, parameter, or return value.
///
/// Serialized in a compact notation: `int64`, `[Message]`, `int64 | string`,
/// `Message`, `opaque(InputFile)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TypeExpr {
    Scalar(Scalar),
    ArrayOf(Box<TypeExpr>),
    /// Alternatives in document order; duplicates are kept.
    Union(Vec<TypeExpr>),
    /// Named data type, not yet checked against the registry.
    Reference(String),
    /// Named type that is not a known data type; carried as generic JSON.
    Opaque(String),
}

impl TypeExpr {
    /// Wrap `inner` in `depth` levels of `ArrayOf`.
    pub fn array_of(inner: TypeExpr, depth: usize) -> Self {
        (0..depth).fold(inner, |ty, _| TypeExpr::ArrayOf(Box::new(ty)))
    }

    /// Replace every `Reference` whose target is not registered with `Opaque`.
    pub fn resolve(self, registry: &TypeRegistry) -> Self {
        match self {
            TypeExpr::Reference(name) if !registry.contains(&name) => TypeExpr::Opaque(name),
            TypeExpr::ArrayOf(inner) => TypeExpr::ArrayOf(Box::new(inner.resolve(registry))),
            TypeExpr::Union(members) => {
                TypeExpr::Union(members.into_iter().map(|m| m.resolve(registry)).collect())
            }
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(s) => f.write_str(s.as_str()),
            TypeExpr::ArrayOf(inner) => write!(f, "[{inner}]"),
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeExpr::Reference(name) => f.write_str(name),
            TypeExpr::Opaque(name) => write!(f, "opaque({name})"),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = DocbindError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DocbindError::validation("empty type notation"));
        }

        let members = split_top_level(s);
        if members.len() > 1 {
            return members
                .into_iter()
                .map(|m| m.parse::<TypeExpr>())
                .collect::<Result<Vec<_>>>()
                .map(TypeExpr::Union);
        }

        if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Ok(TypeExpr::ArrayOf(Box::new(inner.parse()?)));
        }

        if let Some(inner) = s.strip_prefix("opaque(").and_then(|r| r.strip_suffix(')')) {
            return Ok(TypeExpr::Opaque(inner.to_string()));
        }

        if let Some(scalar) = Scalar::from_canonical(s) {
            return Ok(TypeExpr::Scalar(scalar));
        }

        if s.starts_with(|c: char| c.is_ascii_uppercase()) && s.chars().all(|c| c.is_alphanumeric()) {
            return Ok(TypeExpr::Reference(s.to_string()));
        }

        Err(DocbindError::validation(format!("invalid type notation '{s}'")))
    }
}

/// Split on `|` outside of brackets/parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

impl From<TypeExpr> for String {
    fn from(ty: TypeExpr) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = DocbindError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

/// One field of a data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Wire name, exactly as documented.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// One parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Wire name, exactly as documented.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A named structured record of the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTypeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub additional_notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
}

/// A named remote callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub additional_notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamSpec>,
    pub return_type: TypeExpr,
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// Immutable set of recognized data-type names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    names: BTreeSet<String>,
}

impl TypeRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Both registries in first-seen document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registries {
    pub types: Vec<DataTypeEntry>,
    pub operations: Vec<OperationEntry>,
}

impl Registries {
    /// Name registry derived from the data-type entries.
    pub fn type_registry(&self) -> TypeRegistry {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// SnapshotManifest
// ---------------------------------------------------------------------------

/// Checksum record for one written artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `manifest.json` written next to the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// URL (or local path) the HTML was read from.
    pub source_url: String,
    /// Tool version that produced the artifacts.
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    /// SHA-256 of the input HTML; absent when a snapshot without one was regenerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
    pub type_count: usize,
    pub operation_count: usize,
    #[serde(default)]
    pub artifacts: Vec<ArtifactMeta>,
}
