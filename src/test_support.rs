//! Shared test fixtures: a scripted transport with a recorded request log.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;

use crate::client::Client;
use crate::error::Error;
use crate::transport::{Request, Response, Transport};

/// Transport stub returning scripted responses in order and recording
/// every request it sees. Cloning shares the script and the log, so a test
/// can keep a handle while the client owns another.
///
/// Single-threaded by design, like the mapper itself.
#[derive(Clone, Default)]
pub(crate) struct StubTransport {
    inner: Rc<StubInner>,
}

#[derive(Default)]
struct StubInner {
    responses: RefCell<VecDeque<Response>>,
    requests: RefCell<Vec<Request>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.inner.responses.borrow_mut().push_back(Response {
            status,
            body: body.to_string().into_bytes(),
        });
    }

    /// Every request executed so far, in order.
    pub(crate) fn requests(&self) -> Vec<Request> {
        self.inner.requests.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &Request) -> Result<Response, Error> {
        self.inner.requests.borrow_mut().push(request.clone());
        Ok(self
            .inner
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Response {
                status: 200,
                body: b"{}".to_vec(),
            }))
    }
}

/// A client wired to a handle of the given stub.
pub(crate) fn client_with(stub: &StubTransport) -> Client {
    Client::with_transport(Box::new(stub.clone()))
}
