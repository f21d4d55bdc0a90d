use crate::{
    config::{FeatureFlags, PactOptions},
    contract::Contract,
    engine::{MatchingEngine, MockServerHandle},
    error::{BoxError, Error},
    model::{
        Body, BodyReference, BodyReferenceKind, Interaction, ProviderState, RequestSpec,
        ResponseSpec,
    },
    session::ContractSession,
};
use serde_json::Value;
use std::{future::Future, path::PathBuf, sync::Arc};
use tracing::{debug, warn};

/// Accumulates the HTTP interactions a consumer expects from its provider.
///
/// Provider states given with [`PactV3::given`] belong to the next interaction only.
#[derive(Debug)]
pub struct PactV3 {
    options: PactOptions,
    engine: Arc<dyn MatchingEngine>,
    feature_flags: FeatureFlags,
    pending_states: Vec<ProviderState>,
    current: Option<Interaction>,
    interactions: Vec<Interaction>,
}

impl PactV3 {
    pub fn new(options: PactOptions, engine: Arc<dyn MatchingEngine>) -> Self {
        Self {
            options,
            engine,
            feature_flags: FeatureFlags::default(),
            pending_states: Vec::new(),
            current: None,
            interactions: Vec::new(),
        }
    }

    pub fn set_feature_flags(&mut self, feature_flags: FeatureFlags) {
        self.feature_flags = feature_flags;
    }

    pub fn options(&self) -> &PactOptions {
        &self.options
    }

    pub fn given<S: Into<String>>(&mut self, state: S) -> &mut Self {
        self.pending_states.push(ProviderState::new(state));
        self
    }

    pub fn given_with_params<S: Into<String>>(&mut self, state: S, parameters: Value) -> &mut Self {
        self.pending_states
            .push(ProviderState::with_parameters(state, parameters));
        self
    }

    /// Starts a new interaction that takes over the pending provider states.
    pub fn upon_receiving<S: Into<String>>(&mut self, description: S) -> Result<&mut Self, Error> {
        let description = description.into();

        if description.is_empty() {
            return Err(Error::validation("interaction description must not be empty"));
        }
        // the buffer is consumed even when it is rejected
        let provider_states = std::mem::take(&mut self.pending_states);
        if provider_states
            .iter()
            .any(|state| state.description.is_empty())
        {
            return Err(Error::validation(
                "provider state description must not be empty",
            ));
        }
        if let Some(unfinished) = self.current.take() {
            warn!(
                "Discarding interaction '{}' which never got a response",
                unfinished.description
            );
        }

        self.current = Some(Interaction::new(description, provider_states));

        Ok(self)
    }

    pub fn with_request(&mut self, request: RequestSpec) -> Result<&mut Self, Error> {
        let interaction = self.current_interaction("with_request")?;
        interaction.request = RequestSpec {
            body: request.body.map(Body::canonicalize),
            ..request
        };

        Ok(self)
    }

    pub fn with_request_binary_file<S: Into<String>, P: Into<PathBuf>>(
        &mut self,
        request: RequestSpec,
        content_type: S,
        file: P,
    ) -> Result<&mut Self, Error> {
        let body = Body::Reference(BodyReference {
            kind: BodyReferenceKind::Binary,
            content_type: content_type.into(),
            file: file.into(),
            part_name: None,
        });

        self.with_request(request.with_body(body))
    }

    pub fn with_request_multipart_file_upload<S: Into<String>, P: Into<PathBuf>, N: Into<String>>(
        &mut self,
        request: RequestSpec,
        content_type: S,
        file: P,
        part_name: N,
    ) -> Result<&mut Self, Error> {
        let body = Body::Reference(BodyReference {
            kind: BodyReferenceKind::Multipart,
            content_type: content_type.into(),
            file: file.into(),
            part_name: Some(part_name.into()),
        });

        self.with_request(request.with_body(body))
    }

    /// Attaches the response and appends the finished interaction to the contract.
    pub fn will_respond_with(&mut self, response: ResponseSpec) -> Result<&mut Self, Error> {
        let mut interaction = self
            .current
            .take()
            .ok_or_else(|| Error::validation("will_respond_with called before upon_receiving"))?;
        interaction.response = ResponseSpec {
            body: response.body.map(Body::canonicalize),
            ..response
        };

        debug!("Recorded interaction '{}'", interaction.description);
        self.interactions.push(interaction);
        self.pending_states.clear();

        Ok(self)
    }

    pub fn with_response_binary_file<S: Into<String>, P: Into<PathBuf>>(
        &mut self,
        response: ResponseSpec,
        content_type: S,
        file: P,
    ) -> Result<&mut Self, Error> {
        let body = Body::Reference(BodyReference {
            kind: BodyReferenceKind::Binary,
            content_type: content_type.into(),
            file: file.into(),
            part_name: None,
        });

        self.will_respond_with(response.with_body(body))
    }

    pub fn with_response_multipart_file_upload<
        S: Into<String>,
        P: Into<PathBuf>,
        N: Into<String>,
    >(
        &mut self,
        response: ResponseSpec,
        content_type: S,
        file: P,
        part_name: N,
    ) -> Result<&mut Self, Error> {
        let body = Body::Reference(BodyReference {
            kind: BodyReferenceKind::Multipart,
            content_type: content_type.into(),
            file: file.into(),
            part_name: Some(part_name.into()),
        });

        self.will_respond_with(response.with_body(body))
    }

    /// Finished interactions, in the order they were recorded.
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn contract(&self) -> Contract {
        let mut contract = Contract::new(self.options.consumer(), self.options.provider());
        contract.interactions = self.interactions.clone();
        contract
    }

    /// Runs `test` against a mock server serving the recorded interactions, and writes the
    /// contract file when the test passes and every expectation was met.
    pub async fn execute_test<F, Fut, E>(&self, test: F) -> Result<(), Error>
    where
        F: FnOnce(MockServerHandle) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        let mut session = ContractSession::new(
            self.engine.clone(),
            self.options.clone(),
            self.feature_flags,
        );

        session.execute(&self.contract(), test).await
    }

    fn current_interaction(&mut self, call: &str) -> Result<&mut Interaction, Error> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::validation(format!("{} called before upon_receiving", call)))
    }
}
