//! Model types and the record persistence lifecycle.
//!
//! A [`ModelType`] is a static descriptor of one local model: its name, an
//! optional remote class-name override, its declared file fields, and an
//! optional validation hook. A [`Record`] is one instance: a dynamic
//! attribute bag with committed/pending views, lazily-created file
//! attachments, and accumulated violations.
//!
//! # Lifecycle
//!
//! A record is *new* until its first successful create assigns an
//! identifier, *persisted* afterwards, and conceptually empty again after
//! destroy. `save` validates, drains file attachments (uploads complete
//! strictly before the owner's own request), then dispatches create or
//! update. A 400 from the backend becomes a field violation and `Ok(false)`
//! with all pre-save state intact; any other response is reconciled into
//! the committed view.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::attributes::{AttrMap, AttributeStore};
use crate::client::Client;
use crate::encoded;
use crate::error::{violation_from_body, Error, Violation, Violations};
use crate::file::FileAttachment;
use crate::transport::{Method, Request, Response};

/// Server-assigned identifier field.
pub const ID_FIELD: &str = "objectId";

/// Server-assigned creation timestamp field.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Server-assigned update timestamp field.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Local name of the reserved user type.
pub const USER_CLASS: &str = "User";

/// Backend collection alias for the reserved user type.
pub const RESERVED_USER_CLASS: &str = "_User";

/// Fields owned by the server, stripped from outgoing update payloads.
const SERVER_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Static descriptor of one local model type.
///
/// Declared as a `static` and registered with the client:
///
/// ```
/// use restmodel::ModelType;
///
/// static POST: ModelType = ModelType::new("Post").with_file_fields(&["attachment"]);
///
/// assert_eq!(POST.collection_path(), "classes/Post");
/// ```
#[derive(Debug)]
pub struct ModelType {
    /// Local type name, e.g. `"Post"`.
    pub name: &'static str,
    /// Remote class name when it differs from the local name.
    pub remote_name: Option<&'static str>,
    /// Fields holding file attachments rather than plain attributes.
    pub file_fields: &'static [&'static str],
    /// Validation gate run before every save. Violations abort the save
    /// without a remote call.
    pub validate: Option<fn(&Record) -> Vec<Violation>>,
}

impl ModelType {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            remote_name: None,
            file_fields: &[],
            validate: None,
        }
    }

    pub const fn with_remote_name(mut self, remote_name: &'static str) -> Self {
        self.remote_name = Some(remote_name);
        self
    }

    pub const fn with_file_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.file_fields = fields;
        self
    }

    pub const fn with_validator(mut self, validate: fn(&Record) -> Vec<Violation>) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Class name used in Pointer encodings: the override if set, the
    /// reserved alias for the user type, else the local name.
    pub fn backend_class(&self) -> &'static str {
        if let Some(remote) = self.remote_name {
            return remote;
        }
        if self.name == USER_CLASS {
            return RESERVED_USER_CLASS;
        }
        self.name
    }

    /// Collection endpoint path. The reserved user type has its own
    /// top-level signup/account endpoint.
    pub fn collection_path(&self) -> String {
        if self.name == USER_CLASS {
            return "users".to_string();
        }
        format!("classes/{}", self.remote_name.unwrap_or(self.name))
    }
}

/// Capability of being stored by reference: any persisted-or-new record can
/// encode itself as a Pointer.
pub trait Referenceable {
    fn to_pointer(&self) -> Value;
}

/// One model instance: a dynamic attribute bag bound to a model type.
#[derive(Debug)]
pub struct Record {
    model: &'static ModelType,
    attrs: AttributeStore,
    files: HashMap<String, FileAttachment>,
    errors: Violations,
}

impl Record {
    /// A new, empty, unsaved record.
    pub fn new(model: &'static ModelType) -> Self {
        Self {
            model,
            attrs: AttributeStore::new(),
            files: HashMap::new(),
            errors: Violations::new(),
        }
    }

    /// A new unsaved record with initial attributes.
    pub fn with_attrs(model: &'static ModelType, attrs: AttrMap) -> Self {
        Self {
            model,
            attrs: AttributeStore::from_new(attrs),
            files: HashMap::new(),
            errors: Violations::new(),
        }
    }

    /// A record the backend already holds (a query result or an embedded
    /// Object snapshot). Nothing is pending.
    pub fn from_backend(model: &'static ModelType, attrs: AttrMap) -> Self {
        Self {
            model,
            attrs: AttributeStore::from_committed(attrs),
            files: HashMap::new(),
            errors: Violations::new(),
        }
    }

    pub fn model(&self) -> &'static ModelType {
        self.model
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attrs
    }

    /// Remote identifier; absent until the first successful create.
    pub fn id(&self) -> Option<&str> {
        self.attrs.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    pub fn is_new(&self) -> bool {
        !self.is_persisted()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT_FIELD)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT_FIELD)
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.attrs
            .get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Read a field: committed value if present, else pending.
    ///
    /// Fields the backend introduced that were never declared locally are
    /// readable through this same path.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attrs.get(field)
    }

    /// Write a field into both attribute views.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.attrs.set(field, value.into());
    }

    /// Write a reference field: the target's Pointer encoding is stored,
    /// never the live instance, keeping the attribute bag JSON-safe.
    pub fn set_reference(&mut self, field: &str, target: &impl Referenceable) {
        self.attrs.set(field, target.to_pointer());
    }

    /// Field names currently present in either view.
    pub fn keys(&self) -> Vec<&str> {
        self.attrs.keys()
    }

    /// Violations accumulated by the last failed save.
    pub fn errors(&self) -> &Violations {
        &self.errors
    }

    /// The file attachment bound to `field`, created lazily. When the
    /// committed attribute already holds a File-tagged value, the
    /// attachment adopts its remote name and URL.
    pub fn file(&mut self, field: &str) -> &mut FileAttachment {
        let seed = self.attrs.get(field).cloned();
        self.files
            .entry(field.to_string())
            .or_insert_with(|| match seed {
                Some(value) => FileAttachment::from_attr(field, &value),
                None => FileAttachment::new(field),
            })
    }

    /// Persist this record: validate, drain file attachments, then create
    /// or update.
    ///
    /// `Ok(false)` means a validation or backend domain failure; inspect
    /// [`errors`](Record::errors). Transport failures propagate.
    pub fn save(&mut self, client: &Client) -> Result<bool, Error> {
        self.errors.clear();

        if let Some(validate) = self.model.validate {
            let violations = validate(self);
            if !violations.is_empty() {
                self.errors.extend(violations);
                return Ok(false);
            }
        }

        self.save_attachments(client)?;

        if self.is_new() {
            self.create(client)
        } else {
            self.update(client, AttrMap::new())
        }
    }

    /// Upload every declared file attachment, folding dirty results into
    /// the pending view, strictly before the owner's own request. The
    /// owner's payload depends on the post-upload name/url, so this
    /// ordering is a requirement, not an optimization.
    fn save_attachments(&mut self, client: &Client) -> Result<(), Error> {
        let fields = self.model.file_fields;
        for field in fields {
            let (dirty, attr) = {
                let attachment = self.file(field);
                attachment.save(client)?;
                (attachment.dirty(), attachment.to_attr())
            };
            if dirty {
                self.attrs.stage(field, attr);
            }
        }
        Ok(())
    }

    fn create(&mut self, client: &Client) -> Result<bool, Error> {
        let body = Value::Object(self.attrs.pending().clone());
        let request = Request::new(Method::Post, self.model.collection_path()).with_json(body);
        let response = client.execute(&request)?;
        self.reconcile(response)
    }

    /// Persist local changes to an existing record. `extra` merges into the
    /// pending view first; server-owned fields are stripped from the
    /// outgoing payload.
    pub fn update(&mut self, client: &Client, extra: AttrMap) -> Result<bool, Error> {
        self.attrs.merge_staged(extra);

        let id = self.id().ok_or(Error::RecordNotFound)?.to_string();
        let mut payload = self.attrs.pending().clone();
        for field in SERVER_FIELDS {
            payload.remove(field);
        }

        let path = format!("{}/{}", self.model.collection_path(), id);
        let request = Request::new(Method::Put, path).with_json(Value::Object(payload));
        let response = client.execute(&request)?;
        self.reconcile(response)
    }

    /// Fold a save response back into this record. A 400 becomes a single
    /// field violation and leaves every view untouched; any other status
    /// merges the body into committed, re-applies pending over it, and
    /// clears pending.
    fn reconcile(&mut self, response: Response) -> Result<bool, Error> {
        if response.status == 400 {
            let violation = violation_from_body(&response.body);
            tracing::debug!(field = %violation.field, "backend rejected save");
            self.errors.add(violation);
            return Ok(false);
        }

        let body = response.json_object()?;
        self.attrs.commit_response(body);
        Ok(true)
    }

    /// Remove this record from the backend: detach file attachments
    /// remotely, delete the record's own endpoint, then clear both
    /// attribute views unconditionally.
    pub fn destroy(&mut self, client: &Client) -> Result<(), Error> {
        let fields = self.model.file_fields;
        for field in fields {
            let attachment = self.file(field);
            attachment.destroy(client)?;
        }

        if let Some(id) = self.id() {
            let path = format!("{}/{}", self.model.collection_path(), id);
            client.execute(&Request::new(Method::Delete, path))?;
        }

        self.attrs.clear();
        self.files.clear();
        Ok(())
    }

    /// Resolve a relationship-shaped field value.
    ///
    /// Pointer fields fetch fresh on every call; see [`crate::resolver`].
    pub fn resolve(&self, client: &Client, field: &str) -> Result<crate::resolver::Resolved, Error> {
        match self.get(field) {
            Some(value) => crate::resolver::resolve(client, value),
            None => Ok(crate::resolver::Resolved::Scalar(Value::Null)),
        }
    }
}

impl Referenceable for Record {
    fn to_pointer(&self) -> Value {
        encoded::pointer_value(self.model.backend_class(), self.id())
    }
}
