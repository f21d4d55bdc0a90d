use async_trait::async_trait;
use pact::{
    provider::HttpClient, Contract, EngineError, Error, MatchingEngine, Message,
    MessagePactOptions, Mismatch, MockServerHandle, MockServerResult, PactOptions, RequestData,
    ResponseData, ResponseMatcher, ResponseSpec,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct EngineCalls {
    pub started: Vec<String>,
    pub shut_down: Vec<String>,
    pub written: Vec<String>,
    pub served: Vec<Contract>,
    pub message_contracts: Vec<Contract>,
}

/// Records every call and answers with canned results.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub start_error: Option<String>,
    pub server_error: Option<String>,
    pub mismatches: Vec<String>,
    pub write_error: Option<String>,
    pub calls: Mutex<EngineCalls>,
}

impl FakeEngine {
    pub fn with_mismatches(mismatches: Vec<Value>) -> Self {
        Self {
            mismatches: mismatches.iter().map(Value::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn shutdown_count(&self) -> usize {
        self.calls.lock().unwrap().shut_down.len()
    }

    pub fn write_count(&self) -> usize {
        self.calls.lock().unwrap().written.len()
    }
}

impl MatchingEngine for FakeEngine {
    fn start_mock_server(
        &self,
        session_id: &str,
        contract: &Contract,
        _: &PactOptions,
    ) -> Result<MockServerHandle, EngineError> {
        let mut calls = self.calls.lock().unwrap();
        calls.started.push(session_id.into());

        match &self.start_error {
            Some(e) => Err(e.clone().into()),
            None => {
                calls.served.push(contract.clone());
                Ok(MockServerHandle::new(session_id, 4321))
            }
        }
    }

    fn test_result(&self, _: &str) -> MockServerResult {
        MockServerResult {
            mock_server_error: self.server_error.clone(),
            mock_server_mismatches: if self.mismatches.is_empty() {
                None
            } else {
                Some(self.mismatches.clone())
            },
        }
    }

    fn write_pact_file(&self, session_id: &str, _: &PactOptions) -> Result<(), EngineError> {
        if let Some(e) = &self.write_error {
            return Err(e.clone().into());
        }
        self.calls.lock().unwrap().written.push(session_id.into());
        Ok(())
    }

    fn create_message(&self, message: &Message) -> Result<Message, EngineError> {
        Ok(message.clone())
    }

    fn write_message_pact(
        &self,
        contract: &Contract,
        _: &MessagePactOptions,
    ) -> Result<(), EngineError> {
        self.calls
            .lock()
            .unwrap()
            .message_contracts
            .push(contract.clone());
        Ok(())
    }

    fn shutdown_test(&self, session_id: &str) {
        self.calls
            .lock()
            .unwrap()
            .shut_down
            .push(session_id.into());
    }
}

/// Answers every request with the same response and keeps what it was sent.
#[derive(Debug)]
pub struct FakeHttpClient {
    pub response: ResponseData,
    pub requests: Mutex<Vec<(String, RequestData)>>,
}

impl FakeHttpClient {
    pub fn new(status_code: u16, body: &str) -> Self {
        Self {
            response: ResponseData {
                status_code,
                body: body.into(),
                ..ResponseData::default()
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, RequestData)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn make_request(
        &self,
        base_url: &str,
        request_data: &RequestData,
    ) -> Result<ResponseData, Error> {
        self.requests
            .lock()
            .unwrap()
            .push((base_url.into(), request_data.clone()));
        Ok(self.response.clone())
    }
}

/// Compares only the status code.
#[derive(Debug)]
pub struct StatusMatcher;

impl ResponseMatcher for StatusMatcher {
    fn match_response(
        &self,
        expected: &ResponseSpec,
        actual: &ResponseData,
    ) -> Result<Vec<Mismatch>, EngineError> {
        if expected.status == actual.status_code {
            Ok(vec![])
        } else {
            Ok(vec![Mismatch::from(json!({
                "type": "status",
                "expected": expected.status,
                "actual": actual.status_code,
            }))])
        }
    }
}
