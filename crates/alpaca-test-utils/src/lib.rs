//! Scripted brokerage for tests.
//!
//! [`StubBrokerage`] answers every [`BrokerRequest`] from a table of canned
//! responses and records what it was asked, so tests can assert both on the
//! shaped tool output and on the exact payload that would have gone to Alpaca.
//!
//! Unscripted endpoints answer with the fallback value, an empty JSON object
//! unless [`StubBrokerage::respond_all`] sets another.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use alpaca_client::{BrokerError, BrokerRequest, Brokerage, Endpoint};
use async_trait::async_trait;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
enum Scripted {
    Value(Value),
    Failure { status: u16, message: String },
}

/// In-memory [`Brokerage`] with a call log.
#[derive(Debug, Default)]
pub struct StubBrokerage {
    responses: HashMap<Endpoint, Scripted>,
    fallback: Option<Value>,
    calls: Mutex<Vec<BrokerRequest>>,
}

impl StubBrokerage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` with `value`.
    pub fn respond(mut self, endpoint: Endpoint, value: Value) -> Self {
        self.responses.insert(endpoint, Scripted::Value(value));
        self
    }

    /// Answer every unscripted endpoint with `value`.
    pub fn respond_all(mut self, value: Value) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Answer `endpoint` with an API error carrying `message`.
    pub fn fail(mut self, endpoint: Endpoint, status: u16, message: impl Into<String>) -> Self {
        self.responses.insert(
            endpoint,
            Scripted::Failure {
                status,
                message: message.into(),
            },
        );
        self
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<BrokerRequest> {
        self.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_call(&self) -> Option<BrokerRequest> {
        self.lock().last().cloned()
    }

    /// Payload of the most recent request, or an empty map.
    pub fn last_payload(&self) -> Map<String, Value> {
        self.last_call().map(|call| call.payload).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BrokerRequest>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Brokerage for StubBrokerage {
    async fn execute(&self, request: BrokerRequest) -> alpaca_client::Result<Value> {
        let endpoint = request.endpoint;
        self.lock().push(request);

        match self.responses.get(&endpoint) {
            Some(Scripted::Value(value)) => Ok(value.clone()),
            Some(Scripted::Failure { status, message }) => Err(BrokerError::Api {
                status: *status,
                code: None,
                message: message.clone(),
            }),
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new()))),
        }
    }
}
