//! Relationship resolution: turning an encoded attribute value into a
//! scalar, a fetched record, an embedded record, or decoded bytes.
//!
//! Pointer resolution performs a fresh, blocking fetch on every call — no
//! memoization. Repeated reads of the same field re-fetch; this keeps the
//! resolved value as current as the backend.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::client::Client;
use crate::encoded::Encoded;
use crate::error::Error;
use crate::model::Record;

/// The result of resolving one attribute value.
#[derive(Debug)]
pub enum Resolved {
    /// A plain value, returned unchanged.
    Scalar(Value),
    /// A related record, either fetched (Pointer) or materialized from an
    /// embedded snapshot (Object). Always in the persisted state.
    Record(Record),
    /// Decoded binary data from a Bytes-tagged value.
    Bytes(Vec<u8>),
    /// A file attachment handle.
    File {
        name: Option<String>,
        url: Option<String>,
    },
    /// A tagged structure this version does not recognize, returned raw.
    Raw(Value),
}

/// Resolve a raw attribute value.
///
/// Type lookup failure for Pointer and Object values is a hard failure
/// ([`Error::UnknownClass`]); a Pointer whose target the backend no longer
/// holds resolves to `Scalar(Null)`.
pub fn resolve(client: &Client, value: &Value) -> Result<Resolved, Error> {
    match Encoded::classify(value) {
        Encoded::Scalar(value) => Ok(Resolved::Scalar(value)),
        Encoded::Pointer {
            class_name,
            object_id,
        } => {
            let model = client.registry().resolve(&class_name)?;
            tracing::debug!(class = model.name, id = %object_id, "resolving pointer");
            match client.find(model, &object_id)? {
                Some(record) => Ok(Resolved::Record(record)),
                None => Ok(Resolved::Scalar(Value::Null)),
            }
        }
        Encoded::Object { class_name, fields } => {
            let model = client.registry().resolve(&class_name)?;
            Ok(Resolved::Record(Record::from_backend(model, fields)))
        }
        Encoded::Bytes { base64 } => Ok(Resolved::Bytes(STANDARD.decode(base64.as_bytes())?)),
        Encoded::File { name, url } => Ok(Resolved::File { name, url }),
        Encoded::Unrecognized(value) => Ok(Resolved::Raw(value)),
    }
}
