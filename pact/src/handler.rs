use crate::{
    error::{BoxError, Error},
    model::Message,
};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
};

/// Consumer code under test for a message contract.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<(), Error>;
}

/// Wraps a handler that returns a future and receives the message contents.
pub struct AsynchronousBodyHandler<F> {
    handler: F,
}

/// Wraps a handler that runs to completion synchronously and receives the message contents.
pub struct SynchronousBodyHandler<F> {
    handler: F,
}

pub fn asynchronous_body_handler<F, Fut, E>(handler: F) -> AsynchronousBodyHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    AsynchronousBodyHandler { handler }
}

pub fn synchronous_body_handler<F, E>(handler: F) -> SynchronousBodyHandler<F>
where
    F: Fn(Value) -> Result<(), E> + Send + Sync,
    E: Into<BoxError> + 'static,
{
    SynchronousBodyHandler { handler }
}

#[async_trait]
impl<F, Fut, E> MessageHandler for AsynchronousBodyHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    async fn handle(&self, message: Message) -> Result<(), Error> {
        let contents = message.contents;
        let outcome = AssertUnwindSafe(async move { (self.handler)(contents).await })
            .catch_unwind()
            .await;

        settle(outcome)
    }
}

#[async_trait]
impl<F, E> MessageHandler for SynchronousBodyHandler<F>
where
    F: Fn(Value) -> Result<(), E> + Send + Sync,
    E: Into<BoxError> + 'static,
{
    async fn handle(&self, message: Message) -> Result<(), Error> {
        let contents = message.contents;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(contents)));

        settle(outcome)
    }
}

fn settle<E: Into<BoxError>>(
    outcome: Result<Result<(), E>, Box<dyn Any + Send>>,
) -> Result<(), Error> {
    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Handler(e.into().to_string())),
        Err(payload) => Err(Error::Handler(format!(
            "handler panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        String::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic")
    }
}
