//! Type-cell normalization: the documentation's type vocabulary ("Integer",
//! "Array of X", "X or Y") mapped onto [`TypeExpr`].

use std::sync::LazyLock;

use docbind_html::{DomNode, Selector};
use docbind_shared::{DocbindError, Result, Scalar, TypeExpr};

static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));

const ARRAY_PREFIX: &str = "array of ";
const UNION_SEPARATOR: &str = " or ";

/// Normalize the type cell of the field/parameter `name`.
///
/// References are left unresolved; the caller checks them against the registry once
/// every data type is known.
pub fn normalize_type_cell(cell: DomNode<'_>, name: &str) -> Result<TypeExpr> {
    let text = cell.inner_text();
    let links: Vec<String> = cell
        .select_all(std::slice::from_ref(&*LINK))
        .iter()
        .map(|a| a.inner_text().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let (depth, rest) = strip_array_prefixes(text.trim());

    let base = if links.len() > 1 {
        union(links.iter().map(String::as_str), name)?
    } else if rest.contains(UNION_SEPARATOR) {
        union(rest.split(UNION_SEPARATOR), name)?
    } else if let Some(link) = links.first() {
        canonical_type(link, Some(name))?
    } else {
        canonical_type(rest, Some(name))?
    };

    Ok(TypeExpr::array_of(base, depth))
}

/// Normalize free type text (no markup), e.g. `"Array of Integer"`.
pub fn normalize_type_text(text: &str, name: &str) -> Result<TypeExpr> {
    let (depth, rest) = strip_array_prefixes(text.trim());
    let base = if rest.contains(UNION_SEPARATOR) {
        union(rest.split(UNION_SEPARATOR), name)?
    } else {
        canonical_type(rest, Some(name))?
    };
    Ok(TypeExpr::array_of(base, depth))
}

/// Map one type token through the canonical table.
///
/// `integer` widens to `int64` when `name` is `id` or contains `_id`. Capitalized
/// unknown tokens become references; anything else is a parse error.
pub fn canonical_type(token: &str, name: Option<&str>) -> Result<TypeExpr> {
    let token = token.trim().trim_matches('*').trim();

    let scalar = match token.to_lowercase().as_str() {
        "integer" => {
            if name.is_some_and(is_identifier_name) {
                Scalar::Int64
            } else {
                Scalar::Int
            }
        }
        "int" => Scalar::Int,
        "int64" => Scalar::Int64,
        "boolean" | "bool" | "true" => Scalar::Bool,
        "float" | "float number" => Scalar::Float,
        "string" => Scalar::String,
        "array" => {
            return Err(DocbindError::parse(format!(
                "type token '{token}' is a bare array without element type"
            )));
        }
        _ if is_type_name(token) => return Ok(TypeExpr::Reference(token.to_string())),
        _ => {
            return Err(DocbindError::parse(format!("unknown type token '{token}'")));
        }
    };

    Ok(TypeExpr::Scalar(scalar))
}

fn union<'t>(members: impl Iterator<Item = &'t str>, name: &str) -> Result<TypeExpr> {
    members
        .map(|member| canonical_type(member, Some(name)))
        .collect::<Result<Vec<_>>>()
        .map(TypeExpr::Union)
}

/// Strip repeated case-insensitive `array of ` prefixes, returning the depth.
fn strip_array_prefixes(mut text: &str) -> (usize, &str) {
    let mut depth = 0;
    while let Some(head) = text.get(..ARRAY_PREFIX.len()) {
        if !head.eq_ignore_ascii_case(ARRAY_PREFIX) {
            break;
        }
        text = text[ARRAY_PREFIX.len()..].trim_start();
        depth += 1;
    }
    (depth, text)
}

fn is_identifier_name(name: &str) -> bool {
    name == "id" || name.contains("_id")
}

fn is_type_name(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_uppercase()) && token.chars().all(char::is_alphanumeric)
}
