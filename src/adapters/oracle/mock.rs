//! Mock Decision Oracle for testing.
//!
//! Configurable to return queued replies or inject errors, with call
//! tracking so tests can assert whether (and with what) the oracle was
//! invoked.
//!
//! # Example
//!
//! ```ignore
//! let oracle = MockOracle::new()
//!     .with_reply(r#"{"accept": true, "reason": "good value"}"#);
//!
//! let text = oracle.decide(request).await?;
//! assert_eq!(oracle.call_count(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{DecisionOracle, OracleError, OracleRequest};

/// A configured mock outcome.
#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(String),
    Error(MockError),
}

/// Mock error kinds for testing failure handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for OracleError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                OracleError::rate_limited(retry_after_secs)
            }
            MockError::Unavailable { message } => OracleError::unavailable(message),
            MockError::AuthenticationFailed => OracleError::AuthenticationFailed,
            MockError::Network { message } => OracleError::network(message),
            MockError::Timeout { timeout_secs } => OracleError::Timeout { timeout_secs },
        }
    }
}

/// Mock oracle for testing. Outcomes are consumed in order; once the queue
/// is empty every call returns the last configured outcome again, which
/// keeps repeated-invocation tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    last: Arc<Mutex<Option<MockOutcome>>>,
    calls: Arc<Mutex<Vec<OracleRequest>>>,
}

impl MockOracle {
    /// Creates a new mock oracle with no configured outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply text.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Reply(reply.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockError) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Error(error));
        self
    }

    /// Number of `decide` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded requests, in call order.
    pub fn recorded_requests(&self) -> Vec<OracleRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> MockOutcome {
        let mut outcomes = self.outcomes.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = outcomes.pop_front() {
            *last = Some(outcome.clone());
            return outcome;
        }
        last.clone().unwrap_or_else(|| {
            MockOutcome::Error(MockError::Unavailable {
                message: "no mock outcome configured".to_string(),
            })
        })
    }
}

#[async_trait]
impl DecisionOracle for MockOracle {
    async fn decide(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.calls.lock().unwrap().push(request);
        match self.next_outcome() {
            MockOutcome::Reply(text) => Ok(text),
            MockOutcome::Error(err) => Err(err.into()),
        }
    }
}
