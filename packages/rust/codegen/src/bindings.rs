//! Operation-binding source: a request struct per operation with parameters, and one
//! `impl` block with an async method per operation.
//!
//! Every method goes through the client's single transport primitive:
//!
//! ```text
//! async fn perform<P: Serialize, R: DeserializeOwned>(&self, name: &str, payload: Option<&P>) -> Result<R, E>
//! ```

use std::fmt::Write as _;

use docbind_shared::OperationEntry;

use crate::EmitOptions;
use crate::doc::{doc_comment, entry_doc};
use crate::models::{GENERATED_HEADER, rust_return_type, write_member};
use crate::naming::{method_name, request_type_name};

/// Render the bindings file.
pub fn render_bindings(operations: &[OperationEntry], opts: &EmitOptions) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("#![allow(non_snake_case, unused_imports)]\n\n");
    out.push_str("use serde::Serialize;\n\n");
    let _ = writeln!(out, "use {}::*;", opts.models_path);
    let _ = writeln!(out, "use {}::{{{}, {}}};", opts.transport_path, opts.client_type, opts.error_type);

    for op in operations.iter().filter(|op| !op.parameters.is_empty()) {
        out.push('\n');
        write_request(&mut out, op);
    }

    out.push('\n');
    let _ = writeln!(out, "impl {} {{", opts.client_type);
    for (i, op) in operations.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_method(&mut out, op, &opts.error_type);
    }
    out.push_str("}\n");

    out
}

fn write_request(out: &mut String, op: &OperationEntry) {
    let _ = writeln!(out, "/// Parameters of `{}`.", op.name);
    out.push_str("#[derive(Debug, Clone, Serialize)]\n");
    let _ = writeln!(out, "pub struct {} {{", request_type_name(&op.name));
    for param in &op.parameters {
        out.push_str(&doc_comment(&param.description, "    "));
        write_member(out, &param.name, &param.ty, !param.required);
    }
    out.push_str("}\n");
}

fn write_method(out: &mut String, op: &OperationEntry, error_type: &str) {
    out.push_str(&entry_doc(&op.description, &op.additional_notes, "    "));

    let method = method_name(&op.name);
    let ret = rust_return_type(&op.return_type);

    if op.parameters.is_empty() {
        let _ = writeln!(
            out,
            "    pub async fn {method}(&self) -> Result<{ret}, {error_type}> {{"
        );
        let _ = writeln!(out, "        self.perform(\"{}\", None::<&()>).await", op.name);
    } else {
        let request = request_type_name(&op.name);
        let _ = writeln!(
            out,
            "    pub async fn {method}(&self, request: &{request}) -> Result<{ret}, {error_type}> {{"
        );
        let _ = writeln!(out, "        self.perform(\"{}\", Some(request)).await", op.name);
    }
    out.push_str("    }\n");
}
