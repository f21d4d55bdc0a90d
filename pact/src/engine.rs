use crate::{
    config::{MessagePactOptions, PactOptions},
    contract::Contract,
    data::ResponseData,
    error::BoxError,
    mismatch::Mismatch,
    model::{Message, ResponseSpec},
};
use std::fmt::Debug;

pub type EngineError = BoxError;

/// The running mock service of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockServerHandle {
    pub port: u16,
    pub url: String,
    pub id: String,
}

impl MockServerHandle {
    pub fn new<S: Into<String>>(id: S, port: u16) -> Self {
        Self {
            port,
            url: format!("http://127.0.0.1:{}", port),
            id: id.into(),
        }
    }

    pub fn url_for<S: AsRef<str>>(&self, path: S) -> String {
        format!("{}{}", self.url, path.as_ref())
    }
}

/// What the engine observed during a session. Mismatches are JSON-encoded records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockServerResult {
    pub mock_server_error: Option<String>,
    pub mock_server_mismatches: Option<Vec<String>>,
}

/// The request matching and mock serving capability. Implementations must keep the state of
/// every session id separate.
pub trait MatchingEngine: Debug + Send + Sync {
    fn start_mock_server(
        &self,
        session_id: &str,
        contract: &Contract,
        options: &PactOptions,
    ) -> Result<MockServerHandle, EngineError>;

    fn test_result(&self, session_id: &str) -> MockServerResult;

    fn write_pact_file(&self, session_id: &str, options: &PactOptions) -> Result<(), EngineError>;

    /// Produces a concrete message (generators applied, matchers reduced) for a described message.
    fn create_message(&self, message: &Message) -> Result<Message, EngineError>;

    fn write_message_pact(
        &self,
        contract: &Contract,
        options: &MessagePactOptions,
    ) -> Result<(), EngineError>;

    /// Must be safe to call for a session that never started.
    fn shutdown_test(&self, session_id: &str);
}

/// Compares a provider's actual response with the recorded expectation.
pub trait ResponseMatcher: Debug + Send + Sync {
    fn match_response(
        &self,
        expected: &ResponseSpec,
        actual: &ResponseData,
    ) -> Result<Vec<Mismatch>, EngineError>;
}
