use std::collections::HashMap;

/// A concrete request sent to a provider during verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestData {
    pub uri: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// A concrete response received from a provider during verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}
