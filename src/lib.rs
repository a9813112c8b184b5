//! RestModel Core Library
//!
//! Client-side object mapper for schema-less REST document backends: local
//! model types map to remote collections, instances map to remote records
//! addressed by an opaque identifier, and a dynamic attribute bag is read,
//! mutated, encoded for transmission, and reconciled with whatever the
//! backend returns — including relationship references (by-reference,
//! by-value, and binary encodings) and file attachments that upload before
//! their owning record saves.
//!
//! ```no_run
//! use restmodel::{Client, ModelType, Record, Settings};
//!
//! static POST: ModelType = ModelType::new("Post");
//!
//! let mut client = Client::new(&Settings::load(None)?)?;
//! client.register(&POST);
//!
//! let mut post = Record::new(&POST);
//! post.set("title", "hello");
//! if post.save(&client)? {
//!     println!("created {}", post.id().unwrap_or("?"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attributes;
pub mod client;
pub mod config;
pub mod encoded;
pub mod error;
pub mod file;
mod macros;
pub mod model;
pub mod query;
pub mod registry;
pub mod relation;
pub mod resolver;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use attributes::{AttrMap, AttributeStore};
pub use client::Client;
pub use config::{ConfigError, Settings};
pub use encoded::Encoded;
pub use error::{Error, Violation, Violations};
pub use file::{FileAttachment, FileUpload};
pub use model::{ModelType, Record, Referenceable};
pub use query::Query;
pub use registry::Registry;
pub use relation::Children;
pub use resolver::{resolve, Resolved};
pub use transport::{HttpTransport, Method, Request, RequestBody, Response, Transport};

// Attribute values are plain JSON; re-exported so generated accessors and
// caller code need no direct serde_json dependency.
pub use serde_json::Value;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
