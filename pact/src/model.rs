use crate::matchers::Matchable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, path::PathBuf};

/// A named precondition the provider has to be put into before an interaction makes sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderState {
    #[serde(rename = "name")]
    pub description: String,
    #[serde(rename = "params", default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ProviderState {
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
            parameters: None,
        }
    }

    pub fn with_parameters<S: Into<String>>(description: S, parameters: Value) -> Self {
        Self {
            description: description.into(),
            parameters: Some(parameters),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyReferenceKind {
    Binary,
    Multipart,
}

/// Points at a file the matching engine loads when it needs the body. The bytes never pass
/// through the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyReference {
    pub kind: BodyReferenceKind,
    pub content_type: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_name: Option<String>,
}

/// Request or response body.
///
/// `Json` is only an input form: bodies attached to an interaction are canonicalized to `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Reference(BodyReference),
    Text(String),
    Json(Value),
}

impl Body {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Body::Text(text.into())
    }

    pub fn json(value: Value) -> Self {
        Body::Json(value)
    }

    /// Serializes structured bodies to their canonical text (compact JSON with sorted keys).
    pub fn canonicalize(self) -> Self {
        match self {
            Body::Json(Value::String(text)) => Body::Text(text),
            Body::Json(value) => Body::Text(value.to_string()),
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: String,
    pub path: Matchable,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Matchable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Matchable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl RequestSpec {
    pub fn new<M: AsRef<str>, P: Into<Matchable>>(method: M, path: P) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_query<S: Into<String>, V: Into<Matchable>>(mut self, name: S, value: V) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header<S: Into<String>, V: Into<Matchable>>(mut self, name: S, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json_body(self, body: Value) -> Self {
        self.with_body(Body::Json(body))
    }
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Matchable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl ResponseSpec {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header<S: Into<String>, V: Into<Matchable>>(mut self, name: S, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json_body(self, body: Value) -> Self {
        self.with_body(Body::Json(body))
    }
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self::new(200)
    }
}

/// One recorded request/response expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_states: Vec<ProviderState>,
    #[serde(default)]
    pub request: RequestSpec,
    #[serde(default)]
    pub response: ResponseSpec,
}

impl Interaction {
    pub fn new<S: Into<String>>(description: S, provider_states: Vec<ProviderState>) -> Self {
        Self {
            description: description.into(),
            provider_states,
            request: RequestSpec::default(),
            response: ResponseSpec::default(),
        }
    }
}

/// One asynchronous contract unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider_states: Vec<ProviderState>,
    #[serde(default)]
    pub contents: Value,
    #[serde(default, alias = "metaData", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}
