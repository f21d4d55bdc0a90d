use crate::fakes::FakeEngine;
use pact::{
    asynchronous_body_handler, synchronous_body_handler, Error, Message, MessageHandler,
    MessagePact, MessagePactOptions, ProviderState,
};
use serde_json::{json, Value};
use std::{collections::BTreeMap, sync::Arc};

fn message_pact(engine: Arc<FakeEngine>) -> MessagePact {
    MessagePact::new(MessagePactOptions::new("dog-listener", "dog-events"), engine)
}

fn metadata(key: &str, value: Value) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert(String::from(key), value);
    metadata
}

#[test]
fn empty_parts_are_rejected_immediately() {
    let mut pact = message_pact(Arc::new(FakeEngine::default()));

    assert!(matches!(pact.expects_to_receive(""), Err(Error::Validation(_))));
    assert!(matches!(pact.with_content(json!({})), Err(Error::Validation(_))));
    assert!(matches!(
        pact.with_metadata(BTreeMap::new()),
        Err(Error::Validation(_))
    ));

    assert!(pact.expects_to_receive("x").is_ok());
    assert!(pact.with_content(json!({"a": 1})).is_ok());
    assert!(pact.with_metadata(metadata("a", json!(1))).is_ok());
}

#[test]
fn rejected_states_do_not_block_the_next_message() {
    let mut pact = message_pact(Arc::new(FakeEngine::default()));

    assert!(matches!(
        pact.given("").expects_to_receive("x"),
        Err(Error::Validation(_))
    ));
    pact.expects_to_receive("y").unwrap();

    let message = pact.json();
    assert_eq!(message.description, "y");
    assert!(message.provider_states.is_empty());
}

#[test]
fn json_returns_what_was_described() {
    let mut pact = message_pact(Arc::new(FakeEngine::default()));
    let contents = json!({"zeta": [3, 1, 2], "alpha": {"name": "rex"}});

    pact.given("a dog was adopted")
        .given_with_params("the shelter is open", json!({"hours": "9-5"}))
        .expects_to_receive("an adoption event")
        .unwrap()
        .with_content(contents.clone())
        .unwrap()
        .with_metadata(metadata("queue", json!("adoptions")))
        .unwrap();

    let message = pact.json();
    assert_eq!(message.contents, contents);
    assert_eq!(
        message.provider_states,
        vec![
            ProviderState::new("a dog was adopted"),
            ProviderState::with_parameters("the shelter is open", json!({"hours": "9-5"})),
        ]
    );
    assert_eq!(message.metadata, Some(metadata("queue", json!("adoptions"))));
    assert!(pact.messages().is_empty());
}

#[tokio::test]
async fn verified_messages_are_written() {
    let engine = Arc::new(FakeEngine::default());
    let mut pact = message_pact(engine.clone());
    pact.expects_to_receive("an adoption event")
        .unwrap()
        .with_content(json!({"dog": "rex"}))
        .unwrap();

    let handler = synchronous_body_handler(|contents: Value| {
        if contents["dog"] == "rex" {
            Ok(())
        } else {
            Err("unexpected dog")
        }
    });
    pact.verify(&handler).await.unwrap();

    assert_eq!(pact.messages().len(), 1);
    assert_eq!(pact.messages()[0].description, "an adoption event");
    let calls = engine.calls.lock().unwrap();
    assert_eq!(calls.message_contracts.len(), 1);
    assert_eq!(calls.message_contracts[0].messages, pact.messages());
}

#[tokio::test]
async fn failing_handler_rejects_without_writing() {
    let engine = Arc::new(FakeEngine::default());
    let mut pact = message_pact(engine.clone());
    pact.expects_to_receive("an adoption event")
        .unwrap()
        .with_content(json!({"dog": "rex"}))
        .unwrap();

    let handler = asynchronous_body_handler(|_| async { Err::<(), _>("queue unavailable") });
    let result = pact.verify(&handler).await;

    assert!(matches!(result, Err(Error::Handler(e)) if e == "queue unavailable"));
    assert!(pact.messages().is_empty());
    assert!(engine.calls.lock().unwrap().message_contracts.is_empty());
}

#[tokio::test]
async fn verify_needs_a_described_message() {
    let mut pact = message_pact(Arc::new(FakeEngine::default()));
    let handler = synchronous_body_handler(|_| Ok::<(), Error>(()));

    assert!(matches!(pact.verify(&handler).await, Err(Error::Validation(_))));

    pact.expects_to_receive("an adoption event").unwrap();
    assert!(matches!(pact.verify(&handler).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn handlers_settle_once() {
    let message = Message {
        contents: json!({"dog": "rex"}),
        ..Message::default()
    };

    let async_ok = asynchronous_body_handler(|_| async { Ok::<(), Error>(()) });
    let async_err = asynchronous_body_handler(|_| async { Err::<(), _>("fail") });
    let sync_ok = synchronous_body_handler(|_| Ok::<(), Error>(()));
    let sync_err = synchronous_body_handler(|_| Err::<(), _>("fail"));

    assert!(async_ok.handle(message.clone()).await.is_ok());
    assert!(matches!(async_err.handle(message.clone()).await, Err(Error::Handler(e)) if e == "fail"));
    assert!(sync_ok.handle(message.clone()).await.is_ok());
    assert!(matches!(sync_err.handle(message).await, Err(Error::Handler(e)) if e == "fail"));
}
