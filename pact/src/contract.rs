use crate::{
    error::Error,
    model::{Interaction, Message},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const PACT_SPECIFICATION_VERSION: &str = "3.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacticipant {
    pub name: String,
}

impl Pacticipant {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    pub pact_specification: VersionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pact_rust: Option<VersionInfo>,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            pact_specification: VersionInfo {
                version: PACT_SPECIFICATION_VERSION.into(),
            },
            pact_rust: Some(VersionInfo {
                version: env!("CARGO_PKG_VERSION").into(),
            }),
        }
    }
}

/// The contract file: who talks to whom, and the interactions or messages they agreed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub consumer: Pacticipant,
    pub provider: Pacticipant,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: ContractMetadata,
}

impl Contract {
    pub fn new<C: Into<String>, P: Into<String>>(consumer: C, provider: P) -> Self {
        Self {
            consumer: Pacticipant::new(consumer),
            provider: Pacticipant::new(provider),
            interactions: Vec::new(),
            messages: Vec::new(),
            metadata: ContractMetadata::default(),
        }
    }

    pub fn from_json_str<S: AsRef<str>>(json: S) -> Result<Self, Error> {
        Ok(serde_json::from_str(json.as_ref())?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file_contents = fs::read_to_string(path)?;

        Self::from_json_str(file_contents)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
