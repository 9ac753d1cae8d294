//! Lightweight DOM over a parsed HTML page and the selector dialect used to query it.
//!
//! This crate provides:
//! - [`Document`] / [`DomNode`]: arena-backed, read-only tree handles with traversal,
//!   text extraction, markup re-serialization and sibling-range tests
//! - [`Selector`]: compiled `tag#id.class[attr=value]` predicates

pub mod node;
pub mod selector;

pub use node::{Document, DomNode};
pub use selector::{AttrPredicate, Selector, compile_chain};
