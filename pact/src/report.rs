//! Human-readable rendering of mismatch records.

use crate::mismatch::{Mismatch, MismatchKind, ObservedRequest};
use serde_json::Value;
use std::collections::BTreeMap;

const BODY_PREVIEW_CHARS: usize = 20;

/// Renders `mismatches` in the order the engine reported them, numbered from 1.
pub fn generate_mock_server_error(mismatches: &[Mismatch], indent: &str) -> String {
    let mut output = vec![String::from(
        "Mock server failed with the following mismatches:",
    )];

    for (index, mismatch) in mismatches.iter().enumerate() {
        output.push(format!(
            "\n{}{}) {}",
            indent,
            index + 1,
            display_mismatch(mismatch, indent)
        ));
    }

    output.join("\n")
}

pub fn display_mismatch(mismatch: &Mismatch, indent: &str) -> String {
    let request_indent = format!("{}    ", indent);

    match &mismatch.kind {
        MismatchKind::RequestNotFound => format!(
            "The following request was not expected: {}",
            display_request(&observed_request(mismatch), &request_indent)
        ),
        MismatchKind::MissingRequest => format!(
            "The following request was expected but not received: {}",
            display_request(&observed_request(mismatch), &request_indent)
        ),
        MismatchKind::Other(mismatch_type) => match &mismatch.path {
            Some(path) => format!("{} (at {}) {}", mismatch_type, path, mismatch.raw),
            None => format!("{} {}", mismatch_type, mismatch.raw),
        },
    }
}

fn observed_request(mismatch: &Mismatch) -> ObservedRequest {
    mismatch.request.clone().unwrap_or_else(|| ObservedRequest {
        method: mismatch.method.clone().unwrap_or_default(),
        path: mismatch.path.clone().unwrap_or_default(),
        ..ObservedRequest::default()
    })
}

pub fn display_request(request: &ObservedRequest, indent: &str) -> String {
    let mut output = vec![String::new()];

    output.push(format!(
        "{}Method: {}\n{}Path: {}",
        indent, request.method, indent, request.path
    ));

    if let Some(query) = &request.query {
        output.push(format!("{}Query String: {}", indent, display_query(query)));
    }

    if let Some(headers) = &request.headers {
        output.push(format!(
            "{}Headers:\n{}",
            indent,
            display_headers(headers, &format!("{}  ", indent))
        ));
    }

    match &request.body {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) if text.is_empty() => {}
        Some(body) => {
            let body = value_text(body);
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            output.push(format!(
                "{}Body: {}... ({} length)",
                indent,
                preview,
                body.chars().count()
            ));
        }
    }

    output.join("\n")
}

pub fn display_query(query: &BTreeMap<String, Value>) -> String {
    query
        .iter()
        .flat_map(|(key, values)| match values {
            Value::Array(values) => values
                .iter()
                .map(|value| format!("{}={}", key, value_text(value)))
                .collect::<Vec<_>>(),
            value => vec![format!("{}={}", key, value_text(value))],
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn display_headers(headers: &BTreeMap<String, Value>, indent: &str) -> String {
    headers
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Array(values) => values
                    .iter()
                    .map(value_text)
                    .collect::<Vec<_>>()
                    .join(", "),
                value => value_text(value),
            };
            format!("{}{}: {}", indent, key, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
