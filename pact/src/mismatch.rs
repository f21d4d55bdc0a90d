use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
    RequestNotFound,
    MissingRequest,
    Other(String),
}

impl MismatchKind {
    fn from_type(mismatch_type: &str) -> Self {
        match mismatch_type {
            "request-not-found" => MismatchKind::RequestNotFound,
            "missing-request" => MismatchKind::MissingRequest,
            other => MismatchKind::Other(other.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MismatchKind::RequestNotFound => "request-not-found",
            MismatchKind::MissingRequest => "missing-request",
            MismatchKind::Other(other) => other,
        }
    }
}

/// A request as the engine reports it inside a mismatch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObservedRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub query: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// One discrepancy between expected and observed traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub path: Option<String>,
    pub method: Option<String>,
    pub request: Option<ObservedRequest>,
    pub raw: Value,
}

impl Mismatch {
    /// Parses a JSON-encoded mismatch record. Text that is not JSON is kept as a raw string.
    pub fn from_json_str<S: AsRef<str>>(json: S) -> Self {
        let raw = serde_json::from_str(json.as_ref())
            .unwrap_or_else(|_| Value::String(json.as_ref().into()));

        Self::from(raw)
    }

    pub fn is_missing_request(&self) -> bool {
        self.kind == MismatchKind::MissingRequest
    }
}

impl From<Value> for Mismatch {
    fn from(raw: Value) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(String::from);
        let kind = MismatchKind::from_type(text("type").as_deref().unwrap_or("unknown"));
        let path = text("path");
        let method = text("method");
        let request = raw
            .get("request")
            .and_then(|request| serde_json::from_value(request.clone()).ok());

        Self {
            kind,
            path,
            method,
            request,
            raw,
        }
    }
}
