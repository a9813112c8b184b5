//! Transport seam between the mapper and the backend's REST interface.
//!
//! The persistence lifecycle builds [`Request`] values and consumes
//! [`Response`] values; everything about actually executing HTTP — base
//! URL, credential headers, timeouts — lives behind the [`Transport`]
//! trait. The default implementation is [`HttpTransport`] over a blocking
//! reqwest client. Tests substitute a scripted stub.
//!
//! A transport never fails on HTTP status: statuses are data the lifecycle
//! branches on. Only connectivity and request-construction problems become
//! [`Error::Transport`].

use std::time::Duration;

use serde_json::Value;

use crate::attributes::AttrMap;
use crate::config::Settings;
use crate::error::Error;

/// HTTP method for a backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// JSON-encoded attribute payload.
    Json(Value),
    /// Raw bytes with an explicit content type (file uploads).
    Raw {
        data: Vec<u8>,
        content_type: String,
    },
}

/// One backend request, path relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_raw(mut self, data: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            data,
            content_type: content_type.into(),
        };
        self
    }

    /// The JSON body, if this request carries one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// One backend response: status plus raw body bytes.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// Parse the body as a JSON object, the shape of every record payload.
    pub fn json_object(&self) -> Result<AttrMap, Error> {
        match self.json()? {
            Value::Object(map) => Ok(map),
            other => Err(Error::InvalidResponse(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }
}

/// Executes backend requests. Implementations block until a response or a
/// transport error is available.
pub trait Transport {
    fn execute(&self, request: &Request) -> Result<Response, Error>;
}

/// Default transport: blocking reqwest client applying the base URL and
/// credential headers from [`Settings`].
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    base_url: String,
    app_id: String,
    master_key: String,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            app_id: settings.app_id.clone(),
            master_key: settings.master_key.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> Result<Response, Error> {
        let url = format!("{}/{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };

        builder = builder
            .header("X-Application-Id", &self.app_id)
            .header("X-Master-Key", &self.master_key);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Raw { data, content_type } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(data.clone()),
        };

        let response = builder
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_as_str() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(Method::Post, "classes/Post")
            .with_query("limit", "1")
            .with_json(json!({"title": "a"}));

        assert_eq!(request.path, "classes/Post");
        assert_eq!(request.query, vec![("limit".to_string(), "1".to_string())]);
        assert_eq!(request.json_body(), Some(&json!({"title": "a"})));
    }

    #[test]
    fn test_response_success_range() {
        assert!(Response { status: 201, body: vec![] }.is_success());
        assert!(!Response { status: 400, body: vec![] }.is_success());
        assert!(!Response { status: 500, body: vec![] }.is_success());
    }

    #[test]
    fn test_response_json_object() {
        let response = Response {
            status: 200,
            body: br#"{"objectId": "X1"}"#.to_vec(),
        };
        let map = response.json_object().unwrap();
        assert_eq!(map.get("objectId"), Some(&json!("X1")));
    }

    #[test]
    fn test_response_json_object_rejects_array() {
        let response = Response {
            status: 200,
            body: b"[1, 2]".to_vec(),
        };
        assert!(response.json_object().is_err());
    }

    #[test]
    fn test_response_invalid_json() {
        let response = Response {
            status: 200,
            body: b"<html>oops</html>".to_vec(),
        };
        assert!(matches!(response.json(), Err(Error::InvalidResponse(_))));
    }
}
