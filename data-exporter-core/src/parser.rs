//! Interprets the JSON rendering of repository nodes.
//!
//! A descriptor is either an object (node properties and child nodes) or, when
//! the full `.infinity.json` rendering would be too large, an array of
//! alternative renderings ordered from most to least specific. Only the first
//! entry of such an array is ever used.
//!
//! Nothing here fails: malformed input yields an empty result.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Prefix identifying a DAM asset reference.
pub const ASSET_ROOT: &str = "/content/dam";

/// Property holding a node's type.
pub const PRIMARY_TYPE: &str = "jcr:primaryType";

/// Node type of a navigational page.
pub const PAGE_TYPE: &str = "cq:Page";

/// Namespaces of structural properties and resource categories.
const RESERVED_NAMESPACES: [&str; 3] = ["cq:", "jcr:", "sling:"];

/// Asset paths referenced anywhere inside a descriptor.
///
/// `source` is only used for logging.
pub fn asset_paths(source: &str, data: &[u8]) -> Vec<String> {
    let Some(root) = parse(source, data, Severity::Quiet) else {
        return Vec::new();
    };
    match root {
        Value::Array(entries) => first_entry(entries),
        Value::Object(fields) => {
            let mut found = Vec::new();
            collect_assets(&fields, &mut found);
            dedup(found)
        }
        _ => Vec::new(),
    }
}

/// Child page paths directly below `parent`.
///
/// When the descriptor is an array the returned entry is a full path to a
/// more specific rendering (e.g. `/content/site/home.3.json`), not a child.
pub fn page_children(parent: &str, data: &[u8]) -> Vec<String> {
    let Some(root) = parse(parent, data, Severity::Loud) else {
        return Vec::new();
    };
    match root {
        Value::Array(entries) => first_entry(entries),
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, value)| is_page_key(key) && is_page_node(value))
            .map(|(key, _)| format!("{parent}/{key}"))
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a property key may name a child page.
///
/// Keys in a reserved namespace are rejected unless they contain a dot, which
/// marks a file name rather than a resource category.
pub fn is_page_key(key: &str) -> bool {
    if key.trim().is_empty() {
        return false;
    }
    let lowered = key.to_ascii_lowercase();
    let reserved = RESERVED_NAMESPACES
        .iter()
        .any(|namespace| lowered.contains(namespace));
    !reserved || key.contains('.')
}

/// Whether a node's type marker is `cq:Page` (case-insensitive).
pub fn is_page_node(node: &Value) -> bool {
    node.get(PRIMARY_TYPE)
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.eq_ignore_ascii_case(PAGE_TYPE))
}

#[derive(Clone, Copy)]
enum Severity {
    /// Missing assets routinely answer 404; not worth more than debug.
    Quiet,
    Loud,
}

fn parse(source: &str, data: &[u8], severity: Severity) -> Option<Value> {
    match serde_json::from_slice::<Value>(data) {
        Ok(value) => Some(value),
        Err(e) => {
            let body = String::from_utf8_lossy(data);
            match severity {
                Severity::Quiet => {
                    debug!(path = %source, error = %e, body = %body, "Unable to parse JSON data")
                }
                Severity::Loud if data.is_empty() => {
                    debug!(path = %source, "No JSON data returned")
                }
                Severity::Loud => {
                    warn!(path = %source, error = %e, body = %body, "Unable to parse JSON data")
                }
            }
            None
        }
    }
}

fn first_entry(entries: Vec<Value>) -> Vec<String> {
    entries
        .into_iter()
        .next()
        .and_then(|first| first.as_str().map(str::to_owned))
        .into_iter()
        .collect()
}

// Nested objects are descended into before leaf values are tested.
fn collect_assets(fields: &Map<String, Value>, found: &mut Vec<String>) {
    for value in fields.values() {
        match value {
            Value::Object(nested) => collect_assets(nested, found),
            Value::String(text) if text.starts_with(ASSET_ROOT) => found.push(text.clone()),
            _ => {}
        }
    }
}

fn dedup(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(paths.len());
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_keys_need_a_dot() {
        assert!(is_page_key("products"));
        assert!(!is_page_key("jcr:content"));
        assert!(!is_page_key("CQ:Responsive"));
        assert!(!is_page_key("my-sling:thing"));
        assert!(is_page_key("jcr:image.png"));
        assert!(!is_page_key("  "));
    }

    #[test]
    fn type_marker_is_case_insensitive() {
        assert!(is_page_node(&json!({ "jcr:primaryType": "CQ:PAGE" })));
        assert!(!is_page_node(&json!({ "jcr:primaryType": "dam:Asset" })));
        assert!(!is_page_node(&json!({ "jcr:primaryType": 7 })));
        assert!(!is_page_node(&json!("cq:Page")));
    }

    #[test]
    fn empty_array_yields_nothing() {
        assert!(asset_paths("/x", b"[]").is_empty());
        assert!(page_children("/x", b"[42]").is_empty());
    }
}
