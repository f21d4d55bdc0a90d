//! Selection of the recorded interactions a provider verification replays.

use crate::{
    config::{env_flag, env_value, DESCRIPTION_ENV, PROVIDER_NO_STATE_ENV, PROVIDER_STATE_ENV},
    contract::Contract,
    model::{Interaction, Message, ProviderState},
};
use tracing::{debug, warn};

/// Anything recorded with a description and provider states.
pub trait Described {
    fn description(&self) -> &str;
    fn provider_states(&self) -> &[ProviderState];
}

impl Described for Interaction {
    fn description(&self) -> &str {
        &self.description
    }

    fn provider_states(&self) -> &[ProviderState] {
        &self.provider_states
    }
}

impl Described for Message {
    fn description(&self) -> &str {
        &self.description
    }

    fn provider_states(&self) -> &[ProviderState] {
        &self.provider_states
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Description(&'a str),
    ProviderState(&'a str),
    NoState,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionFilter {
    pub description: Option<String>,
    pub provider_state: Option<String>,
    pub no_state: bool,
}

impl InteractionFilter {
    pub fn from_env() -> Self {
        Self {
            description: env_value(DESCRIPTION_ENV),
            provider_state: env_value(PROVIDER_STATE_ENV),
            no_state: env_flag(PROVIDER_NO_STATE_ENV),
        }
    }

    pub fn by_description<S: Into<String>>(description: S) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn by_provider_state<S: Into<String>>(state: S) -> Self {
        Self {
            provider_state: Some(state.into()),
            ..Self::default()
        }
    }

    pub fn without_state() -> Self {
        Self {
            no_state: true,
            ..Self::default()
        }
    }

    /// The active selector. Description wins over provider state, which wins over "no state".
    pub fn selector(&self) -> Selector<'_> {
        if let Some(description) = &self.description {
            Selector::Description(description)
        } else if let Some(state) = &self.provider_state {
            Selector::ProviderState(state)
        } else if self.no_state {
            Selector::NoState
        } else {
            Selector::All
        }
    }

    fn active_selectors(&self) -> usize {
        [
            self.description.is_some(),
            self.provider_state.is_some(),
            self.no_state,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn matches<T: Described>(&self, item: &T) -> bool {
        Self::selector_matches(self.selector(), item)
    }

    fn selector_matches<T: Described>(selector: Selector<'_>, item: &T) -> bool {
        match selector {
            Selector::Description(description) => item.description() == description,
            Selector::ProviderState(state) => item
                .provider_states()
                .iter()
                .any(|provider_state| provider_state.description == state),
            Selector::NoState => item.provider_states().is_empty(),
            Selector::All => true,
        }
    }

    pub fn select<'a, T: Described>(&self, items: &'a [T]) -> Vec<&'a T> {
        let selector = self.selector();

        if self.active_selectors() > 1 {
            warn!(
                "More than one interaction selector is set, only {:?} is applied",
                selector
            );
        }

        let selected = items
            .iter()
            .filter(|item| Self::selector_matches(selector, *item))
            .collect::<Vec<_>>();
        debug!(
            "Selected {} of {} interactions with {:?}",
            selected.len(),
            items.len(),
            selector
        );

        selected
    }

    /// A copy of `contract` holding only the selected interactions and messages.
    pub fn apply(&self, contract: &Contract) -> Contract {
        Contract {
            interactions: self
                .select(&contract.interactions)
                .into_iter()
                .cloned()
                .collect(),
            messages: self.select(&contract.messages).into_iter().cloned().collect(),
            ..contract.clone()
        }
    }
}
