mod builder;
mod config;
mod contract;
mod data;
mod engine;
mod error;
mod filter;
mod handler;
pub mod logging;
pub mod matchers;
mod message;
mod mismatch;
mod model;
pub mod provider;
pub mod report;
mod session;

pub use builder::PactV3;
pub use config::{
    is_truthy, FeatureFlags, MessagePactOptions, PactOptions, ALLOW_MISSING_REQUESTS_ENV,
    DESCRIPTION_ENV, PROVIDER_NO_STATE_ENV, PROVIDER_STATE_ENV,
};
pub use contract::{Contract, ContractMetadata, Pacticipant, VersionInfo, PACT_SPECIFICATION_VERSION};
pub use data::{RequestData, ResponseData};
pub use engine::{EngineError, MatchingEngine, MockServerHandle, MockServerResult, ResponseMatcher};
pub use error::{BoxError, Error};
pub use filter::{Described, InteractionFilter, Selector};
pub use handler::{
    asynchronous_body_handler, synchronous_body_handler, AsynchronousBodyHandler, MessageHandler,
    SynchronousBodyHandler,
};
pub use matchers::Matchable;
pub use message::MessagePact;
pub use mismatch::{Mismatch, MismatchKind, ObservedRequest};
pub use model::{
    Body, BodyReference, BodyReferenceKind, Interaction, Message, ProviderState, RequestSpec,
    ResponseSpec,
};
pub use session::{reconcile, ContractSession, Outcome, Reconciliation, SessionState, TestFailure};
