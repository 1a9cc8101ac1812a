//! Scalar path enumeration
//!
//! Walks a theme document and yields every leaf scalar with its path, in
//! document order. Arrays are opaque and null leaves are skipped.

use crate::document::{escape_segment, ScalarKind, ScalarValue, ThemeNode};
use serde::Serialize;

/// One enumerated leaf of the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarDescriptor {
    pub path: String,
    pub value: ScalarValue,
    pub kind: ScalarKind,
}

/// Enumerate all scalar leaves of `document`
///
/// Keys are escaped into their segments, so every path is unique and
/// resolves back to its own leaf.
/// Deterministic for a given document; the order is the probe order, which
/// also decides ties between equally strong candidates.
pub fn enumerate_scalars(document: &ThemeNode) -> Vec<ScalarDescriptor> {
    let mut scalars = Vec::new();
    walk(document, String::new(), &mut scalars);
    scalars
}

fn walk(node: &ThemeNode, path: String, out: &mut Vec<ScalarDescriptor>) {
    match node {
        ThemeNode::Scalar(value) => out.push(ScalarDescriptor {
            kind: value.kind(),
            value: value.clone(),
            path,
        }),
        ThemeNode::Object(children) => {
            for (key, child) in children {
                walk(child, format!("{}/{}", path, escape_segment(key)), out);
            }
        }
        ThemeNode::Array(_) | ThemeNode::Null => {}
    }
}
