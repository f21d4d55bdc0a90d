//! Provider-side replay of recorded interactions.
//!
//! Contracts are loaded, narrowed with an [`InteractionFilter`], and every selected interaction
//! is sent to the real provider. Comparing the actual response with the expectation is left to a
//! [`ResponseMatcher`].

mod http_client;
mod request_filter;

pub use http_client::{HttpClient, HyperHttpClient};
pub use request_filter::{RequestFilter, RequestFiltersBuilder};

use crate::{
    contract::Contract,
    data::{RequestData, ResponseData},
    engine::ResponseMatcher,
    error::Error,
    filter::InteractionFilter,
    matchers::reify,
    mismatch::Mismatch,
    model::{Body, Interaction},
    report::display_mismatch,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};
use url::{Position, Url};

#[derive(Debug)]
pub struct VerifyOptions {
    provider: String,
    provider_base_url: String,
    pact_urls: Vec<String>,
    state_change_url: Option<String>,
    filter: InteractionFilter,
    request_filters: Vec<RequestFilter>,
}

impl VerifyOptions {
    pub fn new<P: Into<String>, U: Into<String>>(provider: P, provider_base_url: U) -> Self {
        Self {
            provider: provider.into(),
            provider_base_url: provider_base_url.into(),
            pact_urls: Vec::new(),
            state_change_url: None,
            filter: InteractionFilter::default(),
            request_filters: Vec::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn provider_base_url(&self) -> &str {
        &self.provider_base_url
    }

    /// A local file path or an `http(s)://` URL.
    pub fn add_pact_url<S: Into<String>>(&mut self, pact_url: S) {
        self.pact_urls.push(pact_url.into());
    }

    pub fn pact_urls(&self) -> &[String] {
        &self.pact_urls
    }

    pub fn set_state_change_url<S: Into<String>>(&mut self, url: S) {
        self.state_change_url = Some(url.into());
    }

    pub fn state_change_url(&self) -> Option<&String> {
        self.state_change_url.as_ref()
    }

    pub fn set_filter(&mut self, filter: InteractionFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &InteractionFilter {
        &self.filter
    }

    pub fn add_request_filters<F: FnOnce(&mut RequestFiltersBuilder) -> &mut RequestFiltersBuilder>(
        &mut self,
        func: F,
    ) {
        let mut filters = RequestFiltersBuilder::new();
        let _ = func(&mut filters);
        self.request_filters.extend(filters.into_filters());
    }

    pub fn request_filters(&self) -> &[RequestFilter] {
        &self.request_filters
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Passed,
    Mismatched(Vec<Mismatch>),
    Errored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    pub consumer: String,
    pub description: String,
    pub outcome: InteractionOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub provider: String,
    pub results: Vec<InteractionResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.results
            .iter()
            .all(|result| result.outcome == InteractionOutcome::Passed)
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("Verifying provider {}\n", self.provider);
        let (mut passed, mut failed, mut errors) = (0, 0, 0);

        for result in &self.results {
            match &result.outcome {
                InteractionOutcome::Passed => {
                    passed += 1;
                    out.push_str(&format!(
                        "  {} (from {}): OK\n",
                        result.description, result.consumer
                    ));
                }
                InteractionOutcome::Mismatched(mismatches) => {
                    failed += 1;
                    out.push_str(&format!(
                        "  {} (from {}): FAILED\n",
                        result.description, result.consumer
                    ));
                    for (index, mismatch) in mismatches.iter().enumerate() {
                        out.push_str(&format!(
                            "      {}) {}\n",
                            index + 1,
                            display_mismatch(mismatch, "      ")
                        ));
                    }
                }
                InteractionOutcome::Errored(reason) => {
                    errors += 1;
                    out.push_str(&format!(
                        "  {} (from {}): ERROR - {}\n",
                        result.description, result.consumer, reason
                    ));
                }
            }
        }

        out.push_str(&format!(
            "\n{} interactions, {} passed, {} failed, {} errors\n",
            self.results.len(),
            passed,
            failed,
            errors
        ));
        out
    }
}

/// Builds the concrete request of an interaction, with matchers reduced to their examples.
pub fn build_request(interaction: &Interaction) -> Result<RequestData, Error> {
    let spec = &interaction.request;
    let mut url = Url::parse("http://localhost")?.join(&spec.path.example_text())?;

    if !spec.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &spec.query {
            match value.example() {
                Value::Array(values) => {
                    for value in values {
                        pairs.append_pair(name, &value_text(value));
                    }
                }
                value => {
                    pairs.append_pair(name, &value_text(value));
                }
            }
        }
    }

    let headers = spec
        .headers
        .iter()
        .map(|(name, value)| {
            let value = match value.example() {
                Value::Array(values) => values
                    .into_iter()
                    .map(value_text)
                    .collect::<Vec<_>>()
                    .join(", "),
                value => value_text(value),
            };
            (name.clone(), value)
        })
        .collect::<HashMap<_, _>>();

    let body = match &spec.body {
        None => String::new(),
        Some(Body::Text(text)) => match serde_json::from_str::<Value>(text) {
            Ok(json) => reify(&json).to_string(),
            Err(_) => text.clone(),
        },
        Some(Body::Json(value)) => reify(value).to_string(),
        Some(Body::Reference(reference)) => {
            return Err(Error::validation(format!(
                "file-backed body {} cannot be replayed",
                reference.file.display()
            )))
        }
    };

    Ok(RequestData {
        uri: url[Position::BeforePath..].to_string(),
        method: spec.method.clone(),
        headers,
        body,
    })
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn is_success(response: &ResponseData) -> bool {
    (200..300).contains(&response.status_code)
}

/// Replays contracts against a running provider.
#[derive(Debug)]
pub struct Verifier {
    options: VerifyOptions,
    http_client: Arc<dyn HttpClient>,
    response_matcher: Arc<dyn ResponseMatcher>,
}

impl Verifier {
    pub fn new(options: VerifyOptions, response_matcher: Arc<dyn ResponseMatcher>) -> Self {
        Self {
            options,
            http_client: Arc::new(HyperHttpClient::new()),
            response_matcher,
        }
    }

    pub fn set_http_client(&mut self, http_client: Arc<dyn HttpClient>) {
        self.http_client = http_client;
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Replays every selected interaction and fails unless all of them passed.
    pub async fn verify(&self) -> Result<VerificationReport, Error> {
        let report = self.run().await?;

        if report.passed() {
            info!("Provider {} satisfies all contracts", self.options.provider);
            Ok(report)
        } else {
            Err(Error::VerificationFailed(report.to_text()))
        }
    }

    /// Replays every selected interaction. Only failures to load a contract are errors.
    pub async fn run(&self) -> Result<VerificationReport, Error> {
        let mut results = Vec::new();

        for contract in self.load_contracts().await? {
            if contract.provider.name != self.options.provider {
                warn!(
                    "Contract is for provider '{}', verifying it against '{}'",
                    contract.provider.name, self.options.provider
                );
            }

            for interaction in self.options.filter.select(&contract.interactions) {
                let outcome = self.verify_interaction(interaction).await;
                results.push(InteractionResult {
                    consumer: contract.consumer.name.clone(),
                    description: interaction.description.clone(),
                    outcome,
                });
            }
        }

        Ok(VerificationReport {
            provider: self.options.provider.clone(),
            results,
        })
    }

    pub async fn load_contracts(&self) -> Result<Vec<Contract>, Error> {
        let mut contracts = Vec::new();

        for pact_url in &self.options.pact_urls {
            debug!("Loading contract from {}", pact_url);
            let json = if pact_url.starts_with("http://") || pact_url.starts_with("https://") {
                let request = RequestData {
                    method: String::from("GET"),
                    ..RequestData::default()
                };
                let response = self.http_client.make_request(pact_url, &request).await?;
                if !is_success(&response) {
                    return Err(Error::validation(format!(
                        "fetching {} returned status {}",
                        pact_url, response.status_code
                    )));
                }
                response.body
            } else {
                tokio::fs::read_to_string(pact_url).await?
            };

            contracts.push(Contract::from_json_str(json)?);
        }

        Ok(contracts)
    }

    async fn verify_interaction(&self, interaction: &Interaction) -> InteractionOutcome {
        info!("Verifying '{}'", interaction.description);

        if let Err(e) = self.change_states(interaction, "setup").await {
            return InteractionOutcome::Errored(format!("provider state setup failed: {}", e));
        }

        let outcome = match self.replay(interaction).await {
            Ok(mismatches) if mismatches.is_empty() => InteractionOutcome::Passed,
            Ok(mismatches) => InteractionOutcome::Mismatched(mismatches),
            Err(e) => InteractionOutcome::Errored(e.to_string()),
        };

        if let Err(e) = self.change_states(interaction, "teardown").await {
            warn!(
                "Provider state teardown for '{}' failed: {}",
                interaction.description, e
            );
        }

        outcome
    }

    async fn replay(&self, interaction: &Interaction) -> Result<Vec<Mismatch>, Error> {
        let mut request = build_request(interaction)?;
        for filter in &self.options.request_filters {
            filter.apply(&mut request);
        }

        debug!("Replaying {} {}", request.method, request.uri);
        let response = self
            .http_client
            .make_request(&self.options.provider_base_url, &request)
            .await?;

        self.response_matcher
            .match_response(&interaction.response, &response)
            .map_err(|e| Error::ResponseMatching(e.to_string()))
    }

    async fn change_states(&self, interaction: &Interaction, action: &str) -> Result<(), Error> {
        let state_change_url = match &self.options.state_change_url {
            Some(url) => url,
            None => return Ok(()),
        };

        for state in &interaction.provider_states {
            debug!("Provider state {} '{}'", action, state.description);
            let body = json!({
                "state": state.description,
                "params": state.parameters.clone().unwrap_or_else(|| json!({})),
                "action": action,
            });
            let mut headers = HashMap::new();
            headers.insert(
                String::from("Content-Type"),
                String::from("application/json"),
            );
            let request = RequestData {
                uri: String::new(),
                method: String::from("POST"),
                headers,
                body: body.to_string(),
            };

            let response = self
                .http_client
                .make_request(state_change_url, &request)
                .await?;
            if !is_success(&response) {
                return Err(Error::validation(format!(
                    "state change '{}' returned status {}",
                    state.description, response.status_code
                )));
            }
        }

        Ok(())
    }
}
