//! Backend client: owns the transport and the type registry, and exposes
//! the type-level finders and collection operations.

use serde_json::Value;

use crate::attributes::AttrMap;
use crate::config::Settings;
use crate::error::Error;
use crate::model::{ModelType, Record, ID_FIELD};
use crate::query::Query;
use crate::registry::Registry;
use crate::transport::{HttpTransport, Request, Response, Transport};

/// Entry point for all remote operations.
///
/// Every create, update, destroy, find, upload, and delete flows through
/// one client; records themselves hold no live connection state.
pub struct Client {
    transport: Box<dyn Transport>,
    registry: Registry,
}

impl Client {
    /// Client over the default HTTP transport.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(settings)?)))
    }

    /// Client over a caller-provided transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            registry: Registry::new(),
        }
    }

    /// Register a model type for relationship resolution.
    pub fn register(&mut self, model: &'static ModelType) {
        self.registry.register(model);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn execute(&self, request: &Request) -> Result<Response, Error> {
        tracing::debug!(method = request.method.as_str(), path = %request.path, "backend request");
        let response = self.transport.execute(request)?;
        tracing::debug!(status = response.status, path = %request.path, "backend response");
        Ok(response)
    }

    /// A lazy query over a model type's collection.
    pub fn query(&self, model: &'static ModelType) -> Query {
        Query::new(model)
    }

    /// Find one record by identifier.
    ///
    /// An empty or missing identifier fails fast with
    /// [`Error::RecordNotFound`] before any remote call.
    pub fn find(&self, model: &'static ModelType, id: &str) -> Result<Option<Record>, Error> {
        if id.trim().is_empty() {
            return Err(Error::RecordNotFound);
        }
        Query::new(model).where_eq(ID_FIELD, id).first(self)
    }

    /// Find the first record whose `field` equals `value`.
    pub fn find_by(
        &self,
        model: &'static ModelType,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Record>, Error> {
        Query::new(model).where_eq(field, value).first(self)
    }

    /// Find all records whose `field` equals `value`.
    pub fn find_all_by(
        &self,
        model: &'static ModelType,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Record>, Error> {
        Query::new(model).where_eq(field, value).all(self)
    }

    /// All records of a model type.
    pub fn all(&self, model: &'static ModelType) -> Result<Vec<Record>, Error> {
        Query::new(model).all(self)
    }

    /// The first record of a model type, in backend order.
    pub fn first(&self, model: &'static ModelType) -> Result<Option<Record>, Error> {
        Query::new(model).first(self)
    }

    /// The number of records in a model type's collection.
    pub fn count(&self, model: &'static ModelType) -> Result<u64, Error> {
        Query::new(model).count(self)
    }

    /// Construct a record and save it in one step. Inspect the returned
    /// record's violations when it comes back unsaved.
    pub fn create(
        &self,
        model: &'static ModelType,
        attrs: AttrMap,
    ) -> Result<Record, Error> {
        let mut record = Record::with_attrs(model, attrs);
        record.save(self)?;
        Ok(record)
    }

    /// Destroy every record in a model type's collection.
    pub fn destroy_all(&self, model: &'static ModelType) -> Result<(), Error> {
        for mut record in self.all(model)? {
            record.destroy(self)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_with, StubTransport};
    use serde_json::json;

    static POST: ModelType = ModelType::new("Post");

    #[test]
    fn test_find_empty_id_fails_before_remote_call() {
        let stub = StubTransport::new();
        let client = client_with(&stub);

        assert!(matches!(client.find(&POST, ""), Err(Error::RecordNotFound)));
        assert!(matches!(
            client.find(&POST, "   "),
            Err(Error::RecordNotFound)
        ));
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn test_find_queries_identifier_field() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({"results": [{"objectId": "X1"}]}));
        let client = client_with(&stub);

        let record = client.find(&POST, "X1").unwrap().unwrap();
        assert_eq!(record.id(), Some("X1"));

        let requests = stub.requests();
        let where_param = requests[0]
            .query
            .iter()
            .find(|(k, _)| k == "where")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&where_param).unwrap(),
            json!({"objectId": "X1"})
        );
    }

    #[test]
    fn test_find_no_match_is_none() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({"results": []}));
        let client = client_with(&stub);

        assert!(client.find(&POST, "missing").unwrap().is_none());
    }

    #[test]
    fn test_find_by_field() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({"results": [{"objectId": "X1", "title": "a"}]}));
        let client = client_with(&stub);

        let record = client.find_by(&POST, "title", "a").unwrap().unwrap();
        assert_eq!(record.get("title"), Some(&json!("a")));
    }

    #[test]
    fn test_find_all_by_field() {
        let stub = StubTransport::new();
        stub.push_json(
            200,
            json!({"results": [{"objectId": "X1"}, {"objectId": "X2"}]}),
        );
        let client = client_with(&stub);

        let records = client.find_all_by(&POST, "rank", 3).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_create_convenience() {
        let stub = StubTransport::new();
        stub.push_json(201, json!({"objectId": "X1", "createdAt": "2024-03-01T10:00:00Z"}));
        let client = client_with(&stub);

        let mut attrs = AttrMap::new();
        attrs.insert("title".to_string(), json!("a"));
        let record = client.create(&POST, attrs).unwrap();

        assert!(record.is_persisted());
        assert!(record.errors().is_empty());
    }

    #[test]
    fn test_destroy_all() {
        let stub = StubTransport::new();
        stub.push_json(
            200,
            json!({"results": [{"objectId": "X1"}, {"objectId": "X2"}]}),
        );
        stub.push_json(200, json!({}));
        stub.push_json(200, json!({}));
        let client = client_with(&stub);

        client.destroy_all(&POST).unwrap();

        let requests = stub.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].path, "classes/Post/X1");
        assert_eq!(requests[2].path, "classes/Post/X2");
    }
}
