//! Data-model source: one serde struct per data type.

use std::fmt::Write as _;

use docbind_shared::{DataTypeEntry, FieldSpec, Scalar, TypeExpr};

use crate::doc::{doc_comment, entry_doc};
use crate::naming::field_name;

/// First lines of every generated file.
pub(crate) const GENERATED_HEADER: &str = "// Code generated by docbind. DO NOT EDIT.\n";

/// Rust spelling of a field or parameter type.
///
/// Direct references are boxed so self-referential types (`Message.reply_to_message`)
/// have a finite size; inside `Vec` they are stored plainly. Unions and opaque types are
/// carried as raw JSON.
pub fn rust_type(ty: &TypeExpr) -> String {
    render(ty, false)
}

/// Rust spelling of a return type. References are never boxed here.
pub fn rust_return_type(ty: &TypeExpr) -> String {
    render(ty, true)
}

fn render(ty: &TypeExpr, plain_references: bool) -> String {
    match ty {
        TypeExpr::Scalar(scalar) => scalar_type(*scalar).to_string(),
        TypeExpr::ArrayOf(inner) => format!("Vec<{}>", render(inner, true)),
        TypeExpr::Reference(name) if plain_references => name.clone(),
        TypeExpr::Reference(name) => format!("Box<{name}>"),
        TypeExpr::Union(_) | TypeExpr::Opaque(_) => "serde_json::Value".to_string(),
    }
}

fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bool",
        Scalar::Int => "i32",
        Scalar::Int64 => "i64",
        Scalar::Float => "f64",
        Scalar::String => "String",
    }
}

/// Render the models file.
pub fn render_models(types: &[DataTypeEntry]) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("#![allow(non_snake_case)]\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n");

    for entry in types {
        out.push('\n');
        write_struct(&mut out, entry);
    }

    out
}

fn write_struct(out: &mut String, entry: &DataTypeEntry) {
    out.push_str(&entry_doc(&entry.description, &entry.additional_notes, ""));

    out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
    let _ = writeln!(out, "pub struct {} {{", entry.name);
    for field in &entry.fields {
        write_field(out, field);
    }
    out.push_str("}\n");
}

fn write_field(out: &mut String, field: &FieldSpec) {
    out.push_str(&doc_comment(&field.description, "    "));
    write_member(out, &field.name, &field.ty, field.optional);
}

/// One `pub` member with its serde attribute. Shared with the request structs so both
/// files spell wire names and optionality the same way.
pub(crate) fn write_member(out: &mut String, wire: &str, ty: &TypeExpr, optional: bool) {
    let ident = field_name(wire);
    let ty = rust_type(ty);

    if optional {
        let _ = writeln!(
            out,
            "    #[serde(rename = \"{wire}\", default, skip_serializing_if = \"Option::is_none\")]"
        );
        let _ = writeln!(out, "    pub {ident}: Option<{ty}>,");
    } else {
        let _ = writeln!(out, "    #[serde(rename = \"{wire}\")]");
        let _ = writeln!(out, "    pub {ident}: {ty},");
    }
}
