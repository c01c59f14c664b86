//! The searchable-record contract consumed by the engine.
//!
//! Records are supplied by the host application's persistence layer. The
//! engine only needs three capabilities from them: a stable key, an ordered
//! map of searchable fields, and the name of the logical collection they
//! belong to. Records that can produce a better text representation than
//! the flattened field map override `searchable_text`; that override takes
//! precedence during indexing, replacing any runtime capability probing
//! with an explicit contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A record's native identifier: integer or string.
///
/// Keys round-trip through document metadata, never through the composite
/// vector id. A collection name or key containing `_` makes the composite id
/// ambiguous to split, so the id is write-only by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Str(String),
}

impl RecordKey {
    /// Parse a key out of a metadata value.
    ///
    /// Numbers become `Int` when they are whole; everything else is kept as
    /// its string form. Non-scalar values yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| Some(Self::Str(n.to_string()))),
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// A single searchable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Array-valued fields are joined with single spaces during flattening
    List(Vec<String>),
}

impl FieldValue {
    /// Whether this value contributes nothing to the searchable text.
    ///
    /// Mirrors the host framework's falsy filter: empty strings, zero-length
    /// lists, and `false` are dropped before joining.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(b) => !b,
            Self::Int(_) | Self::Float(_) => false,
        }
    }

    /// Render this value as one flattened text fragment.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => items.join(" "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Ordered searchable field map. Iteration order is the host layer's field
/// declaration order and is preserved into the flattened text.
pub type FieldMap = Vec<(String, FieldValue)>;

/// Capability contract for records the engine can index.
///
/// `searchable_text` is the explicit variant selector: records that leave
/// the default `None` are flattened from their field map; records that
/// return `Some` are indexed with that text verbatim. The field map is still
/// consulted either way to decide whether the record is indexable at all
/// (an empty field map drops the record silently).
pub trait Searchable {
    /// Stable key, unique within the record's logical collection.
    fn key(&self) -> RecordKey;

    /// Fully-qualified name of the logical collection this record belongs
    /// to. Used for id namespacing and the `model` metadata tag.
    fn collection(&self) -> &str;

    /// Ordered map of searchable fields. May be empty.
    fn field_map(&self) -> FieldMap;

    /// Precomputed searchable text. Takes precedence over the flattened
    /// field map when present.
    fn searchable_text(&self) -> Option<String> {
        None
    }
}

/// Build the namespaced vector id for a record in a collection.
///
/// Path separators in the collection name (`\` and `/`) are replaced with
/// underscores, then the key is appended after one more underscore:
/// `App\Models\Product` with key `123` becomes `App_Models_Product_123`.
/// Multiple collections can share one physical index without id collisions.
///
/// The id is never parsed back; key recovery always goes through the
/// `key` metadata field.
#[must_use]
pub fn namespaced_id(collection: &str, key: &RecordKey) -> String {
    let prefix = collection.replace(['\\', '/'], "_");
    format!("{prefix}_{key}")
}

/// Flatten an ordered field map into one embeddable text.
///
/// Empty values are dropped, list values are joined with single spaces, and
/// the remaining fragments are joined with `". "` in field-map order.
#[must_use]
pub fn flatten_field_map(fields: &FieldMap) -> String {
    fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(_, value)| value.to_text())
        .collect::<Vec<_>>()
        .join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_id_replaces_path_separators() {
        let id = namespaced_id("App\\Models\\Product", &RecordKey::Int(123));
        assert_eq!(id, "App_Models_Product_123");

        let id = namespaced_id("shop/orders", &RecordKey::Str("abc".to_string()));
        assert_eq!(id, "shop_orders_abc");

        let id = namespaced_id("Product", &RecordKey::Int(7));
        assert_eq!(id, "Product_7");
    }

    #[test]
    fn flatten_joins_fields_in_order() {
        let fields: FieldMap = vec![
            ("title".to_string(), "Test Title".into()),
            ("content".to_string(), "Test Content".into()),
        ];
        assert_eq!(flatten_field_map(&fields), "Test Title. Test Content");
    }

    #[test]
    fn flatten_joins_list_values_with_spaces() {
        let fields: FieldMap = vec![
            ("title".to_string(), "Post".into()),
            (
                "tags".to_string(),
                FieldValue::List(vec![
                    "tag1".to_string(),
                    "tag2".to_string(),
                    "tag3".to_string(),
                ]),
            ),
        ];
        assert_eq!(flatten_field_map(&fields), "Post. tag1 tag2 tag3");
    }

    #[test]
    fn flatten_drops_empty_values() {
        let fields: FieldMap = vec![
            ("title".to_string(), "Kept".into()),
            ("subtitle".to_string(), "".into()),
            ("tags".to_string(), FieldValue::List(vec![])),
            ("archived".to_string(), FieldValue::Bool(false)),
            ("views".to_string(), FieldValue::Int(0)),
        ];
        // Numbers survive even at zero; empty strings, empty lists, and
        // false are dropped
        assert_eq!(flatten_field_map(&fields), "Kept. 0");
    }

    #[test]
    fn record_key_from_json_scalars() {
        assert_eq!(
            RecordKey::from_json(&serde_json::json!(42)),
            Some(RecordKey::Int(42))
        );
        assert_eq!(
            RecordKey::from_json(&serde_json::json!("uuid-1")),
            Some(RecordKey::Str("uuid-1".to_string()))
        );
        assert_eq!(RecordKey::from_json(&serde_json::json!(null)), None);
        assert_eq!(RecordKey::from_json(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn record_key_display() {
        assert_eq!(RecordKey::Int(5).to_string(), "5");
        assert_eq!(RecordKey::Str("x".to_string()).to_string(), "x");
    }
}
