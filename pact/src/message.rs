use crate::{
    config::MessagePactOptions,
    contract::Contract,
    engine::MatchingEngine,
    error::Error,
    handler::MessageHandler,
    model::{Message, ProviderState},
};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, info};

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Builds and verifies asynchronous message contracts.
#[derive(Debug)]
pub struct MessagePact {
    options: MessagePactOptions,
    engine: Arc<dyn MatchingEngine>,
    pending_states: Vec<ProviderState>,
    current: Message,
    messages: Vec<Message>,
}

impl MessagePact {
    pub fn new(options: MessagePactOptions, engine: Arc<dyn MatchingEngine>) -> Self {
        Self {
            options,
            engine,
            pending_states: Vec::new(),
            current: Message::default(),
            messages: Vec::new(),
        }
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

    /// Starts a new message that takes over the pending provider states.
    pub fn expects_to_receive<S: Into<String>>(&mut self, description: S) -> Result<&mut Self, Error> {
        let description = description.into();

        if description.is_empty() {
            return Err(Error::validation("message description must not be empty"));
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

        self.current = Message {
            description,
            provider_states,
            ..Message::default()
        };

        Ok(self)
    }

    pub fn with_content(&mut self, contents: Value) -> Result<&mut Self, Error> {
        if is_empty(&contents) {
            return Err(Error::validation("message contents must not be empty"));
        }

        self.current.contents = contents;
        Ok(self)
    }

    pub fn with_metadata(&mut self, metadata: BTreeMap<String, Value>) -> Result<&mut Self, Error> {
        if metadata.is_empty() {
            return Err(Error::validation("message metadata must not be empty"));
        }

        self.current.metadata = Some(metadata);
        Ok(self)
    }

    /// The message under construction, exactly as it was described.
    pub fn json(&self) -> Message {
        self.current.clone()
    }

    /// Messages that passed verification, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contract(&self) -> Contract {
        let mut contract = Contract::new(self.options.consumer(), self.options.provider());
        contract.messages = self.messages.clone();
        contract
    }

    /// Hands a concrete message built from the description to `handler`. When the handler
    /// succeeds the message is added to the contract and the contract file is written.
    pub async fn verify<H: MessageHandler + ?Sized>(&mut self, handler: &H) -> Result<(), Error> {
        if self.current.description.is_empty() {
            return Err(Error::validation("message has no description"));
        }
        if is_empty(&self.current.contents) {
            return Err(Error::validation("message has no contents"));
        }

        let message = self
            .engine
            .create_message(&self.current)
            .map_err(|e| Error::CreateMessage(e.to_string()))?;
        debug!("Verifying message '{}'", self.current.description);

        handler.handle(message).await?;

        self.messages.push(std::mem::take(&mut self.current));
        self.engine
            .write_message_pact(&self.contract(), &self.options)
            .map_err(|e| {
                error!("Could not write the message contract: {}", e);
                Error::WriteContract(e.to_string())
            })?;
        info!(
            "Wrote message contract between {} and {} to {}",
            self.options.consumer(),
            self.options.provider(),
            self.options.dir().display()
        );

        Ok(())
    }
}
