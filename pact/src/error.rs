use hyper::http;
use std::io;
use thiserror::Error;

/// Boxed error returned by the pluggable collaborators (matching engine, response matcher,
/// test functions).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// A builder call violated its contract (empty description, empty contents, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The matching engine could not start a mock server for the session.
    #[error("Failed to start the mock server: {0}")]
    MockServerStart(String),

    /// The test function succeeded but the observed traffic did not match the expectations.
    #[error("{0}")]
    MockServerMismatch(String),

    /// The matching engine reported an internal fault.
    #[error("Mock server failed with error: {0}")]
    MockServer(String),

    /// The test function failed and the mock server reported problems as well.
    #[error("{0}")]
    CompositeTest(String),

    /// The test function failed on its own; the original error is kept as the source.
    #[error("{0}")]
    TestFunction(#[source] BoxError),

    #[error("Failed to write the contract file: {0}")]
    WriteContract(String),

    #[error("Message handler failed: {0}")]
    Handler(String),

    #[error("The matching engine could not create the message: {0}")]
    CreateMessage(String),

    #[error("The matching engine could not compare the response: {0}")]
    ResponseMatching(String),

    #[error("Provider verification failed:\n{0}")]
    VerificationFailed(String),

    #[error("IoError: {0}")]
    IoError(#[from] io::Error),

    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),

    #[error("Http Error: {0}")]
    HttpError(#[from] http::Error),

    #[error("Invalid header name")]
    InvalidHeaderName(#[from] hyper::header::InvalidHeaderName),

    #[error("Invalid header value")]
    InvalidHeaderValue(#[from] hyper::header::InvalidHeaderValue),

    #[error("Parse URL error: {0}")]
    ParseUrlError(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation(message.into())
    }
}
