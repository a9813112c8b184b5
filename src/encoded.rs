//! Tagged wire values for relationship, binary, and file fields.
//!
//! The backend embeds non-scalar attribute values as JSON objects carrying a
//! `__type` discriminator. [`Encoded::classify`] turns a raw attribute value
//! into an explicit sum type so the resolver can match exhaustively; a
//! tagged structure with an unknown discriminator becomes
//! [`Encoded::Unrecognized`] rather than being silently passed through as a
//! plain map.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::attributes::AttrMap;

/// Discriminator key on tagged wire values.
pub const TYPE_KEY: &str = "__type";

/// Backend class name key on Pointer and Object values.
pub const CLASS_NAME_KEY: &str = "className";

/// Classified form of one attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    /// A by-reference link: resolving it fetches the target record.
    Pointer {
        class_name: String,
        object_id: String,
    },
    /// A by-value snapshot: the backend inlined the full target record.
    Object {
        class_name: String,
        fields: AttrMap,
    },
    /// Opaque binary data, base64-encoded on the wire.
    Bytes { base64: String },
    /// A file attachment handle (remote name and URL, no raw bytes).
    File {
        name: Option<String>,
        url: Option<String>,
    },
    /// Not a tagged structure at all.
    Scalar(Value),
    /// Tagged, but with a discriminator this version does not know.
    Unrecognized(Value),
}

impl Encoded {
    /// Classify a raw attribute value.
    pub fn classify(value: &Value) -> Encoded {
        let Some(map) = value.as_object() else {
            return Encoded::Scalar(value.clone());
        };
        let Some(tag) = map.get(TYPE_KEY).and_then(Value::as_str) else {
            return Encoded::Scalar(value.clone());
        };

        match tag {
            "Pointer" => {
                let class_name = map.get(CLASS_NAME_KEY).and_then(Value::as_str);
                let object_id = map.get("objectId").and_then(Value::as_str);
                match (class_name, object_id) {
                    (Some(class_name), Some(object_id)) => Encoded::Pointer {
                        class_name: class_name.to_string(),
                        object_id: object_id.to_string(),
                    },
                    _ => Encoded::Unrecognized(value.clone()),
                }
            }
            "Object" => {
                let Some(class_name) = map.get(CLASS_NAME_KEY).and_then(Value::as_str) else {
                    return Encoded::Unrecognized(value.clone());
                };
                let mut fields = map.clone();
                fields.remove(TYPE_KEY);
                fields.remove(CLASS_NAME_KEY);
                Encoded::Object {
                    class_name: class_name.to_string(),
                    fields,
                }
            }
            "Bytes" => match map.get("base64").and_then(Value::as_str) {
                Some(base64) => Encoded::Bytes {
                    base64: base64.to_string(),
                },
                None => Encoded::Unrecognized(value.clone()),
            },
            "File" => Encoded::File {
                name: map.get("name").and_then(Value::as_str).map(str::to_string),
                url: map.get("url").and_then(Value::as_str).map(str::to_string),
            },
            _ => Encoded::Unrecognized(value.clone()),
        }
    }
}

/// Encode a by-reference link to a record of `class_name`.
///
/// `object_id` is `None` for a record that has never been persisted; the
/// encoding carries a null identifier in that case, matching what the
/// backend stores for a dangling reference.
pub fn pointer_value(class_name: &str, object_id: Option<&str>) -> Value {
    json!({
        TYPE_KEY: "Pointer",
        CLASS_NAME_KEY: class_name,
        "objectId": object_id,
    })
}

/// Encode a file attachment handle. Null name/url clears the field.
pub fn file_value(name: Option<&str>, url: Option<&str>) -> Value {
    json!({
        TYPE_KEY: "File",
        "name": name,
        "url": url,
    })
}

/// Encode opaque binary data as a Bytes-tagged value.
pub fn bytes_value(data: &[u8]) -> Value {
    json!({
        TYPE_KEY: "Bytes",
        "base64": STANDARD.encode(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_scalar() {
        assert_eq!(Encoded::classify(&json!(42)), Encoded::Scalar(json!(42)));
        assert_eq!(
            Encoded::classify(&json!({"plain": "map"})),
            Encoded::Scalar(json!({"plain": "map"}))
        );
    }

    #[test]
    fn test_classify_pointer() {
        let raw = json!({"__type": "Pointer", "className": "Author", "objectId": "A1"});
        assert_eq!(
            Encoded::classify(&raw),
            Encoded::Pointer {
                class_name: "Author".to_string(),
                object_id: "A1".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_object_strips_discriminator() {
        let raw = json!({
            "__type": "Object",
            "className": "Author",
            "objectId": "A1",
            "name": "brett",
        });
        match Encoded::classify(&raw) {
            Encoded::Object { class_name, fields } => {
                assert_eq!(class_name, "Author");
                assert!(!fields.contains_key(TYPE_KEY));
                assert!(!fields.contains_key(CLASS_NAME_KEY));
                assert_eq!(fields.get("name"), Some(&json!("brett")));
                assert_eq!(fields.get("objectId"), Some(&json!("A1")));
            }
            other => panic!("expected Object, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_bytes() {
        let raw = json!({"__type": "Bytes", "base64": "aGk="});
        assert_eq!(
            Encoded::classify(&raw),
            Encoded::Bytes {
                base64: "aGk=".to_string()
            }
        );
    }

    #[test]
    fn test_classify_file() {
        let raw = json!({"__type": "File", "name": "f.png", "url": "http://x/f.png"});
        assert_eq!(
            Encoded::classify(&raw),
            Encoded::File {
                name: Some("f.png".to_string()),
                url: Some("http://x/f.png".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_unknown_tag() {
        let raw = json!({"__type": "GeoPoint", "latitude": 40.0, "longitude": -30.0});
        assert_eq!(Encoded::classify(&raw), Encoded::Unrecognized(raw.clone()));
    }

    #[test]
    fn test_classify_malformed_pointer() {
        let raw = json!({"__type": "Pointer", "className": "Author"});
        assert_eq!(Encoded::classify(&raw), Encoded::Unrecognized(raw.clone()));
    }

    #[test]
    fn test_pointer_value_without_id() {
        let value = pointer_value("Post", None);
        assert_eq!(value["objectId"], Value::Null);
        assert_eq!(value["className"], json!("Post"));
    }

    #[test]
    fn test_bytes_value_roundtrip() {
        let value = bytes_value(b"hello");
        match Encoded::classify(&value) {
            Encoded::Bytes { base64 } => {
                assert_eq!(STANDARD.decode(base64).unwrap(), b"hello")
            }
            other => panic!("expected Bytes, got {:?}", other),
        }
    }
}
