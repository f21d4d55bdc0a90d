use crate::data::RequestData;
use regex::Regex;
use std::fmt::{self, Debug};

/// A change applied to every replayed request before it reaches the provider, e.g. to inject
/// credentials the contract does not record.
pub enum RequestFilter {
    AddHeader { name: String, value: String },
    RemoveHeaders(Vec<String>),
    RemoveHeadersMatching(Vec<Regex>),
    ReplaceBody { text: String, replacement: String },
    ReplaceBodyMatching { pattern: Regex, replacement: String },
    Custom(Box<dyn Fn(&mut RequestData) + Send + Sync>),
}

impl RequestFilter {
    pub fn apply(&self, request: &mut RequestData) {
        match self {
            RequestFilter::AddHeader { name, value } => {
                request
                    .headers
                    .retain(|existing, _| !existing.eq_ignore_ascii_case(name));
                request.headers.insert(name.clone(), value.clone());
            }
            RequestFilter::RemoveHeaders(names) => request.headers.retain(|existing, _| {
                !names.iter().any(|name| existing.eq_ignore_ascii_case(name))
            }),
            RequestFilter::RemoveHeadersMatching(patterns) => request
                .headers
                .retain(|existing, _| !patterns.iter().any(|pattern| pattern.is_match(existing))),
            RequestFilter::ReplaceBody { text, replacement } => {
                request.body = request.body.replace(text.as_str(), replacement);
            }
            RequestFilter::ReplaceBodyMatching {
                pattern,
                replacement,
            } => {
                request.body = pattern
                    .replace_all(&request.body, replacement.as_str())
                    .into_owned();
            }
            RequestFilter::Custom(filter) => filter(request),
        }
    }
}

impl Debug for RequestFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFilter::AddHeader { name, value } => f
                .debug_struct("AddHeader")
                .field("name", name)
                .field("value", value)
                .finish(),
            RequestFilter::RemoveHeaders(names) => {
                f.debug_tuple("RemoveHeaders").field(names).finish()
            }
            RequestFilter::RemoveHeadersMatching(patterns) => f
                .debug_tuple("RemoveHeadersMatching")
                .field(patterns)
                .finish(),
            RequestFilter::ReplaceBody { text, replacement } => f
                .debug_struct("ReplaceBody")
                .field("text", text)
                .field("replacement", replacement)
                .finish(),
            RequestFilter::ReplaceBodyMatching {
                pattern,
                replacement,
            } => f
                .debug_struct("ReplaceBodyMatching")
                .field("pattern", pattern)
                .field("replacement", replacement)
                .finish(),
            RequestFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub struct RequestFiltersBuilder {
    filters: Vec<RequestFilter>,
}

impl RequestFiltersBuilder {
    pub(crate) fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn add_header<S1: Into<String>, S2: Into<String>>(
        &mut self,
        header_name: S1,
        header_value: S2,
    ) -> &mut Self {
        self.filter(RequestFilter::AddHeader {
            name: header_name.into(),
            value: header_value.into(),
        })
    }

    pub fn remove_headers<S: Into<String>, I: IntoIterator<Item = S>>(
        &mut self,
        headers: I,
    ) -> &mut Self {
        self.filter(RequestFilter::RemoveHeaders(
            headers.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn remove_headers_regex<I: IntoIterator<Item = Regex>>(
        &mut self,
        patterns: I,
    ) -> &mut Self {
        self.filter(RequestFilter::RemoveHeadersMatching(
            patterns.into_iter().collect(),
        ))
    }

    pub fn body_replace<S1: Into<String>, S2: Into<String>>(
        &mut self,
        text: S1,
        replacement: S2,
    ) -> &mut Self {
        self.filter(RequestFilter::ReplaceBody {
            text: text.into(),
            replacement: replacement.into(),
        })
    }

    pub fn body_replace_regex<S: Into<String>>(
        &mut self,
        pattern: Regex,
        replacement: S,
    ) -> &mut Self {
        self.filter(RequestFilter::ReplaceBodyMatching {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn custom<F: Fn(&mut RequestData) + Send + Sync + 'static>(
        &mut self,
        filter: F,
    ) -> &mut Self {
        self.filter(RequestFilter::Custom(Box::new(filter)))
    }

    pub fn filter(&mut self, filter: RequestFilter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn into_filters(self) -> Vec<RequestFilter> {
        self.filters
    }
}

impl Default for RequestFiltersBuilder {
    fn default() -> Self {
        Self::new()
    }
}
