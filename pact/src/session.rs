//! One consumer test run against a mock server.
//!
//! The session starts the mock server, awaits the test function, asks the engine what it saw and
//! turns the three outcomes (test function, mock server, contract write) into one verdict. The
//! mock server is shut down on every path, including start failures and panicking tests.

use crate::{
    config::{FeatureFlags, PactOptions},
    contract::Contract,
    engine::{MatchingEngine, MockServerHandle, MockServerResult},
    error::{BoxError, Error},
    handler::panic_message,
    mismatch::Mismatch,
    report::generate_mock_server_error,
};
use futures::FutureExt;
use std::{
    any::Any,
    fmt::{self, Debug},
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Reconciling,
    Succeeded,
    Failed,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// How a test function failed.
pub enum TestFailure {
    Error(BoxError),
    Panic(Box<dyn Any + Send>),
}

impl TestFailure {
    fn describe(&self) -> String {
        match self {
            TestFailure::Error(e) => {
                let mut description = e.to_string();
                let mut source = e.source();
                while let Some(cause) = source {
                    description.push_str(&format!("\n    caused by: {}", cause));
                    source = cause.source();
                }
                description
            }
            TestFailure::Panic(payload) => {
                format!("test panicked: {}", panic_message(payload.as_ref()))
            }
        }
    }
}

impl Debug for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestFailure::Error(e) => f.debug_tuple("Error").field(e).finish(),
            TestFailure::Panic(_) => f.debug_tuple("Panic").field(&self.describe()).finish(),
        }
    }
}

#[derive(Debug)]
enum Failure {
    Session(Error),
    Test(TestFailure),
}

/// The verdict of a session, before it is turned into the caller's result.
#[derive(Debug)]
pub struct Reconciliation {
    pub outcome: Outcome,
    pub diagnostics: Option<String>,
    failure: Option<Failure>,
}

impl Reconciliation {
    fn succeeded() -> Self {
        Self {
            outcome: Outcome::Succeeded,
            diagnostics: None,
            failure: None,
        }
    }

    fn failed(error: Error, diagnostics: Option<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            diagnostics,
            failure: Some(Failure::Session(error)),
        }
    }

    /// The error the session fails with, unless the test function's own failure is passed on
    /// unchanged.
    pub fn error(&self) -> Option<&Error> {
        match &self.failure {
            Some(Failure::Session(error)) => Some(error),
            _ => None,
        }
    }

    pub fn test_failure(&self) -> Option<&TestFailure> {
        match &self.failure {
            Some(Failure::Test(failure)) => Some(failure),
            _ => None,
        }
    }

    /// Converts the verdict into the caller's result. A panic of the test function that is not
    /// folded into a session error is resumed here.
    pub fn into_result(self) -> Result<(), Error> {
        match self.failure {
            None => Ok(()),
            Some(Failure::Session(error)) => Err(error),
            Some(Failure::Test(TestFailure::Error(error))) => Err(Error::TestFunction(error)),
            Some(Failure::Test(TestFailure::Panic(payload))) => panic::resume_unwind(payload),
        }
    }
}

/// Decides the outcome of a session from the test function's result and the engine's report.
///
/// With `allow_missing_requests` set, `missing-request` mismatches are dropped before anything
/// else is looked at.
pub fn reconcile(
    test: Result<(), TestFailure>,
    result: &MockServerResult,
    feature_flags: FeatureFlags,
) -> Reconciliation {
    let mismatches = result
        .mock_server_mismatches
        .iter()
        .flatten()
        .map(Mismatch::from_json_str)
        .filter(|mismatch| !(feature_flags.allow_missing_requests && mismatch.is_missing_request()))
        .collect::<Vec<_>>();
    let server_error = result.mock_server_error.as_deref();

    let mismatch_report = if mismatches.is_empty() {
        None
    } else {
        Some(generate_mock_server_error(&mismatches, "  "))
    };
    let server_diagnostics = match (server_error, &mismatch_report) {
        (None, None) => None,
        (Some(server_error), None) => Some(format!("Mock server failed with error: {}", server_error)),
        (None, Some(report)) => Some(report.clone()),
        (Some(server_error), Some(report)) => Some(format!(
            "Mock server failed with error: {}\n\n  {}",
            server_error, report
        )),
    };

    match (test, server_diagnostics) {
        (Ok(()), None) => Reconciliation::succeeded(),
        (Ok(()), Some(diagnostics)) => {
            let error = match (server_error, mismatch_report) {
                (Some(server_error), _) => Error::MockServer(server_error.into()),
                (None, Some(report)) => Error::MockServerMismatch(report),
                (None, None) => Error::MockServer(diagnostics.clone()),
            };
            Reconciliation::failed(error, Some(diagnostics))
        }
        (Err(failure), None) => Reconciliation {
            outcome: Outcome::Failed,
            diagnostics: None,
            failure: Some(Failure::Test(failure)),
        },
        (Err(failure), Some(diagnostics)) => {
            let message = format!(
                "Test failed for the following reasons:\n\n  Test code failed with an error: {}\n\n  {}",
                failure.describe(),
                diagnostics
            );
            Reconciliation::failed(Error::CompositeTest(message), Some(diagnostics))
        }
    }
}

/// Shuts the mock server of a session down exactly once, when asked to or when dropped.
struct MockServerGuard {
    engine: Arc<dyn MatchingEngine>,
    session_id: Option<String>,
}

impl MockServerGuard {
    fn new(engine: Arc<dyn MatchingEngine>, session_id: String) -> Self {
        Self {
            engine,
            session_id: Some(session_id),
        }
    }

    fn rebind(&mut self, session_id: &str) {
        self.session_id = Some(session_id.into());
    }

    fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(session_id) = self.session_id.take() {
            debug!("Shutting down mock server {}", session_id);
            self.engine.shutdown_test(&session_id);
        }
    }
}

impl Drop for MockServerGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drives one contract through the matching engine.
#[derive(Debug)]
pub struct ContractSession {
    engine: Arc<dyn MatchingEngine>,
    options: PactOptions,
    feature_flags: FeatureFlags,
    state: SessionState,
}

impl ContractSession {
    pub fn new(
        engine: Arc<dyn MatchingEngine>,
        options: PactOptions,
        feature_flags: FeatureFlags,
    ) -> Self {
        Self {
            engine,
            options,
            feature_flags,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Contract session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub async fn execute<F, Fut, E>(&mut self, contract: &Contract, test: F) -> Result<(), Error>
    where
        F: FnOnce(MockServerHandle) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        self.transition(SessionState::Starting);

        let session_id = Uuid::new_v4().simple().to_string();
        let mut mock_server = MockServerGuard::new(self.engine.clone(), session_id.clone());

        let handle = match self
            .engine
            .start_mock_server(&session_id, contract, &self.options)
        {
            Ok(handle) => handle,
            Err(e) => {
                error!("Could not start the mock server: {}", e);
                self.transition(SessionState::Failed);
                mock_server.shutdown();
                self.transition(SessionState::Terminated);
                return Err(Error::MockServerStart(e.to_string()));
            }
        };
        let session_id = handle.id.clone();
        mock_server.rebind(&session_id);
        info!(
            "Mock server {} for {} -> {} listening on {}",
            session_id,
            self.options.consumer(),
            self.options.provider(),
            handle.url
        );

        self.transition(SessionState::Running);
        let test_outcome = AssertUnwindSafe(async move { test(handle).await })
            .catch_unwind()
            .await;
        let test_outcome = match test_outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TestFailure::Error(e.into())),
            Err(payload) => Err(TestFailure::Panic(payload)),
        };

        self.transition(SessionState::Reconciling);
        let result = self.engine.test_result(&session_id);
        let mut reconciliation = reconcile(test_outcome, &result, self.feature_flags);

        if reconciliation.outcome == Outcome::Succeeded {
            match self.engine.write_pact_file(&session_id, &self.options) {
                Ok(()) => info!(
                    "Wrote contract between {} and {} to {}",
                    self.options.consumer(),
                    self.options.provider(),
                    self.options.dir().display()
                ),
                Err(e) => {
                    error!("Could not write the contract file: {}", e);
                    reconciliation = Reconciliation::failed(Error::WriteContract(e.to_string()), None);
                }
            }
        } else if let Some(diagnostics) = &reconciliation.diagnostics {
            warn!("{}", diagnostics);
        }

        self.transition(match reconciliation.outcome {
            Outcome::Succeeded => SessionState::Succeeded,
            Outcome::Failed => SessionState::Failed,
        });
        mock_server.shutdown();
        self.transition(SessionState::Terminated);

        reconciliation.into_result()
    }
}
