//! Shared test transport: records every issued request and serves queued
//! fixture responses, so tests can assert both on results and on which
//! writes were (or were not) issued.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::http::Transport;

#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

enum Queued {
    Json(Value),
    Http { status: u16, body: String },
}

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Queued>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON fixture for the next request.
    pub fn push(&self, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Queued::Json(value));
    }

    /// Queues a non-2xx response for the next request.
    pub fn push_http_error(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Queued::Http {
            status,
            body: body.to_string(),
        });
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(
        &self,
        method: &'static str,
        url: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            url: url.to_string(),
            query: query.to_vec(),
            body,
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Queued::Json(value)) => Ok(value),
            Some(Queued::Http { status, body }) => Err(ApiError::Http { status, body }),
            None => panic!("no queued response for {method} {url}"),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        self.respond("GET", url, query, None)
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value> {
        self.respond("POST", url, &[], Some(body))
    }

    async fn patch(&self, url: &str, body: Value) -> Result<Value> {
        self.respond("PATCH", url, &[], Some(body))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.respond("DELETE", url, &[], None).map(|_| ())
    }
}
