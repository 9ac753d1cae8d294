//! JSON snapshot of the registries.
//!
//! Keys follow struct declaration order, empty text and lists are omitted, and types
//! use the compact notation of [`TypeExpr`](docbind_shared::TypeExpr). The output is
//! stable for a given registry, which is what makes regeneration byte-identical.

use serde::Serialize;
use serde::de::DeserializeOwned;

use docbind_shared::{DataTypeEntry, DocbindError, OperationEntry, Result};

/// Pretty-printed JSON with a trailing newline.
pub fn render_dump<T: Serialize>(entries: &[T]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(entries)?;
    json.push('\n');
    Ok(json)
}

/// Parse a data-type dump.
pub fn parse_types(json: &str) -> Result<Vec<DataTypeEntry>> {
    parse_dump(json, "types")
}

/// Parse an operation dump.
pub fn parse_operations(json: &str) -> Result<Vec<OperationEntry>> {
    parse_dump(json, "operations")
}

fn parse_dump<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>> {
    serde_json::from_str(json)
        .map_err(|e| DocbindError::validation(format!("invalid {what} dump: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbind_shared::{FieldSpec, Scalar, TypeExpr};

    fn user() -> DataTypeEntry {
        DataTypeEntry {
            name: "User".into(),
            description: "A <b>user</b> — or bot.".into(),
            additional_notes: String::new(),
            fields: vec![FieldSpec {
                name: "id".into(),
                ty: TypeExpr::Scalar(Scalar::Int64),
                optional: false,
                description: String::new(),
            }],
        }
    }

    #[test]
    fn dump_layout() {
        let json = render_dump(&[user()]).unwrap();
        assert!(json.ends_with("]\n"));
        assert!(json.contains(r#""type": "int64""#));
        assert!(!json.contains("additional_notes"));
        // Only the field's empty description is omitted, the entry's is kept.
        assert_eq!(json.matches("description").count(), 1);

        let name_at = json.find(r#""name": "User""#).unwrap();
        let desc_at = json.find(r#""description""#).unwrap();
        assert!(name_at < desc_at);
    }

    #[test]
    fn characters_are_not_escaped() {
        let json = render_dump(&[user()]).unwrap();
        assert!(json.contains("A <b>user</b> — or bot."));
    }

    #[test]
    fn dump_parses_back() {
        let json = render_dump(&[user()]).unwrap();
        assert_eq!(parse_types(&json).unwrap(), vec![user()]);
    }

    #[test]
    fn malformed_dump_is_a_validation_error() {
        let err = parse_operations(r#"[{"name": "getMe", "return_type": "not a type"}]"#).unwrap_err();
        assert!(matches!(err, DocbindError::Validation { .. }));
        assert!(err.to_string().contains("operations dump"));
    }
}
