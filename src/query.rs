//! Lazily-built equality queries against a remote collection.
//!
//! A [`Query`] accumulates conditions, a limit, an ordering, and eager
//! includes without touching the network; it materializes only on
//! [`first`](Query::first), [`all`](Query::all), or [`count`](Query::count).

use serde_json::Value;

use crate::attributes::AttrMap;
use crate::client::Client;
use crate::error::Error;
use crate::model::{ModelType, Record};
use crate::transport::{Method, Request};

/// A lazy query over one model type's remote collection.
#[derive(Debug, Clone)]
pub struct Query {
    model: &'static ModelType,
    conditions: AttrMap,
    limit: Option<u32>,
    order: Option<String>,
    include: Vec<String>,
}

impl Query {
    pub fn new(model: &'static ModelType) -> Self {
        Self {
            model,
            conditions: AttrMap::new(),
            limit: None,
            order: None,
            include: Vec::new(),
        }
    }

    /// Constrain a field to equal a value.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.to_string(), value.into());
        self
    }

    /// Merge a map of equality conditions.
    pub fn where_map(mut self, conditions: AttrMap) -> Self {
        for (field, value) in conditions {
            self.conditions.insert(field, value);
        }
        self
    }

    /// Limit the number of returned records.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Order results by a field.
    pub fn order(mut self, field: &str) -> Self {
        self.order = Some(field.to_string());
        self
    }

    /// Ask the backend to inline the referenced record for a pointer
    /// field, so resolution needs no second fetch.
    pub fn include_object(mut self, field: &str) -> Self {
        self.include.push(field.to_string());
        self
    }

    /// Execute and return the first match, if any.
    pub fn first(&self, client: &Client) -> Result<Option<Record>, Error> {
        let mut limited = self.clone();
        limited.limit = Some(1);
        Ok(limited.all(client)?.into_iter().next())
    }

    /// Execute and return all matches.
    pub fn all(&self, client: &Client) -> Result<Vec<Record>, Error> {
        let response = client.execute(&self.request())?;
        let body = response.json_object()?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidResponse("missing results array".to_string()))?;

        results
            .iter()
            .map(|value| match value.as_object() {
                Some(map) => Ok(Record::from_backend(self.model, map.clone())),
                None => Err(Error::InvalidResponse(
                    "non-object entry in results".to_string(),
                )),
            })
            .collect()
    }

    /// Execute and return only the number of matches.
    pub fn count(&self, client: &Client) -> Result<u64, Error> {
        let request = self
            .request()
            .with_query("count", "1")
            .with_query("limit", "0");
        let response = client.execute(&request)?;
        let body = response.json_object()?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::InvalidResponse("missing count".to_string()))
    }

    fn request(&self) -> Request {
        let mut request = Request::new(Method::Get, self.model.collection_path());
        if !self.conditions.is_empty() {
            request = request.with_query(
                "where",
                Value::Object(self.conditions.clone()).to_string(),
            );
        }
        if let Some(limit) = self.limit {
            request = request.with_query("limit", limit.to_string());
        }
        if let Some(order) = &self.order {
            request = request.with_query("order", order.clone());
        }
        if !self.include.is_empty() {
            request = request.with_query("include", self.include.join(","));
        }
        request
    }
}
