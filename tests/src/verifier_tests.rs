use crate::fakes::{FakeHttpClient, StatusMatcher};
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server,
};
use pact::{
    provider::{InteractionOutcome, Verifier, VerifyOptions},
    Contract, Error, Interaction, InteractionFilter, ProviderState, RequestSpec, ResponseSpec,
};
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
};
use tempfile::NamedTempFile;

fn contract_file() -> NamedTempFile {
    let mut contract = Contract::new("web", "dogs-api");

    let mut a = Interaction::new("A", vec![]);
    a.request = RequestSpec::new("GET", "/a");
    let mut b = Interaction::new("B", vec![ProviderState::new("S")]);
    b.request = RequestSpec::new("GET", "/b");
    b.response = ResponseSpec::new(200).with_json_body(json!({"name": "rex"}));
    contract.interactions = vec![a, b];

    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), contract.to_json_pretty().unwrap()).unwrap();
    file
}

fn options(file: &NamedTempFile, filter: InteractionFilter) -> VerifyOptions {
    let mut options = VerifyOptions::new("dogs-api", "http://provider");
    options.add_pact_url(file.path().to_string_lossy());
    options.set_filter(filter);
    options
}

fn verifier(options: VerifyOptions, client: Arc<FakeHttpClient>) -> Verifier {
    let mut verifier = Verifier::new(options, Arc::new(StatusMatcher));
    verifier.set_http_client(client);
    verifier
}

fn replayed_paths(client: &FakeHttpClient) -> Vec<String> {
    client
        .sent()
        .into_iter()
        .filter(|(base_url, _)| base_url == "http://provider")
        .map(|(_, request)| request.uri)
        .collect()
}

#[tokio::test]
async fn filters_select_the_replayed_interactions() {
    let file = contract_file();

    for (filter, expected) in vec![
        (InteractionFilter::by_description("A"), vec!["/a"]),
        (InteractionFilter::by_provider_state("S"), vec!["/b"]),
        (InteractionFilter::without_state(), vec!["/a"]),
        (InteractionFilter::default(), vec!["/a", "/b"]),
    ] {
        let client = Arc::new(FakeHttpClient::new(200, "{}"));
        let report = verifier(options(&file, filter), client.clone())
            .verify()
            .await
            .unwrap();

        assert!(report.passed());
        assert_eq!(replayed_paths(&client), expected);
    }
}

#[tokio::test]
async fn provider_states_are_set_up_and_torn_down() {
    let file = contract_file();
    let client = Arc::new(FakeHttpClient::new(200, "{}"));
    let mut options = options(&file, InteractionFilter::by_provider_state("S"));
    options.set_state_change_url("http://provider/_pact/state");
    let verifier = verifier(options, client.clone());

    verifier.verify().await.unwrap();

    let sent = client.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].0, "http://provider/_pact/state");
    assert_eq!(sent[1].1.uri, "/b");
    assert_eq!(sent[2].0, "http://provider/_pact/state");

    let setup: Value = serde_json::from_str(&sent[0].1.body).unwrap();
    let teardown: Value = serde_json::from_str(&sent[2].1.body).unwrap();
    assert_eq!(setup, json!({"state": "S", "params": {}, "action": "setup"}));
    assert_eq!(teardown["action"], "teardown");
    assert_eq!(sent[0].1.method, "POST");
}

#[tokio::test]
async fn request_filters_change_replayed_requests() {
    let file = contract_file();
    let client = Arc::new(FakeHttpClient::new(200, "{}"));
    let mut options = options(&file, InteractionFilter::default());
    options.add_request_filters(|filters| {
        filters
            .add_header("Authorization", "Bearer token")
            .custom(|request| request.uri.push_str("?trace=1"))
    });
    let verifier = verifier(options, client.clone());

    verifier.verify().await.unwrap();

    for (_, request) in client.sent() {
        assert_eq!(request.headers["Authorization"], "Bearer token");
        assert!(request.uri.ends_with("?trace=1"));
    }
}

#[tokio::test]
async fn mismatching_provider_fails_verification() {
    let file = contract_file();
    let client = Arc::new(FakeHttpClient::new(500, "oops"));
    let verifier = verifier(options(&file, InteractionFilter::by_description("B")), client);

    let report = verifier.run().await.unwrap();
    assert!(!report.passed());
    assert!(matches!(
        &report.results[0].outcome,
        InteractionOutcome::Mismatched(mismatches) if mismatches.len() == 1
    ));

    match verifier.verify().await {
        Err(Error::VerificationFailed(text)) => {
            assert!(text.contains("B (from web): FAILED"));
            assert!(text.contains("1 interactions, 0 passed, 1 failed, 0 errors"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn missing_contract_file_is_an_error() {
    let mut options = VerifyOptions::new("dogs-api", "http://provider");
    options.add_pact_url("/nonexistent/dogs-api.json");
    let verifier = Verifier::new(options, Arc::new(StatusMatcher));

    assert!(matches!(verifier.verify().await, Err(Error::IoError(_))));
}

async fn start_provider(seen: Arc<Mutex<Vec<String>>>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let make_service = make_service_fn(move |_| {
        let seen = seen.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                let seen = seen.clone();
                async move {
                    let authorization = request
                        .headers()
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(format!(
                        "{} {} {}",
                        request.method(),
                        request.uri(),
                        authorization
                    ));
                    Ok::<_, Infallible>(Response::new(Body::from("{\"name\":\"rex\"}")))
                }
            }))
        }
    });

    tokio::spawn(Server::from_tcp(listener).unwrap().serve(make_service));
    format!("http://{}", address)
}

#[tokio::test]
async fn replays_against_a_real_provider() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base_url = start_provider(seen.clone()).await;
    let file = contract_file();

    let mut options = VerifyOptions::new("dogs-api", base_url);
    options.add_pact_url(file.path().to_string_lossy());
    options.set_filter(InteractionFilter::by_description("B"));
    options.add_request_filters(|filters| filters.add_header("Authorization", "Bearer token"));

    let report = Verifier::new(options, Arc::new(StatusMatcher))
        .verify()
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(*seen.lock().unwrap(), vec![String::from("GET /b Bearer token")]);
}
