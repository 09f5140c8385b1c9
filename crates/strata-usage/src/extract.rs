//! Extraction of asset ids from property values.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use crate::usage::AssetId;

const ASSET_URI_SCHEME: &str = "asset://";

/// Collect all asset ids referenced by a property value.
///
/// Strings are scanned for embedded `asset://<id>` URIs, so both plain asset
/// properties and rich text holding several URIs are covered. Arrays and
/// objects are scanned recursively. Numbers, booleans and null reference
/// nothing. Malformed URIs are skipped with a warning; one bad value never
/// aborts indexing.
pub fn extract_asset_ids(value: &Value) -> BTreeSet<AssetId> {
    let mut ids = BTreeSet::new();
    collect(value, &mut ids);
    ids
}

fn collect(value: &Value, ids: &mut BTreeSet<AssetId>) {
    match value {
        Value::String(text) => scan_text(text, ids),
        Value::Array(items) => {
            for item in items {
                collect(item, ids);
            }
        }
        Value::Object(entries) => {
            for item in entries.values() {
                collect(item, ids);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn scan_text(text: &str, ids: &mut BTreeSet<AssetId>) {
    let mut rest = text;
    while let Some(start) = rest.find(ASSET_URI_SCHEME) {
        let after_scheme = &rest[start + ASSET_URI_SCHEME.len()..];
        let id_len = after_scheme
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(after_scheme.len());
        match AssetId::new(&after_scheme[..id_len]) {
            Ok(id) => {
                ids.insert(id);
            }
            Err(error) => {
                warn!(%error, "skipping malformed asset URI");
            }
        }
        rest = &after_scheme[id_len..];
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn id(s: &str) -> AssetId {
        AssetId::new(s).unwrap()
    }

    #[test]
    fn plain_uri_string() {
        let ids = extract_asset_ids(&json!("asset://img-1"));
        assert_eq!(ids, BTreeSet::from([id("img-1")]));
    }

    #[test]
    fn uris_embedded_in_rich_text() {
        let ids = extract_asset_ids(&json!(
            "<p>see <a href=\"asset://doc-1\">this</a> and <img src=\"asset://img-2\"/></p>"
        ));
        assert_eq!(ids, BTreeSet::from([id("doc-1"), id("img-2")]));
    }

    #[test]
    fn arrays_and_objects_are_scanned_recursively() {
        let ids = extract_asset_ids(&json!({
            "gallery": ["asset://a-1", "asset://a-2"],
            "meta": { "teaser": "asset://a-3" },
            "count": 3,
        }));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn duplicates_collapse() {
        let ids = extract_asset_ids(&json!("asset://x asset://x"));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn scalars_and_plain_text_reference_nothing() {
        assert!(extract_asset_ids(&json!(null)).is_empty());
        assert!(extract_asset_ids(&json!(42)).is_empty());
        assert!(extract_asset_ids(&json!("no assets here")).is_empty());
    }

    #[test]
    fn malformed_uri_is_skipped() {
        // Scheme with no id.
        let ids = extract_asset_ids(&json!("asset:// and asset://ok"));
        assert_eq!(ids, BTreeSet::from([id("ok")]));
    }
}
