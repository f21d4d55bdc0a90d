use lazy_static::lazy_static;
use regex::Regex;
use std::{
    env,
    path::{Path, PathBuf},
};

pub const ALLOW_MISSING_REQUESTS_ENV: &str = "PACT_EXPERIMENTAL_FEATURE_ALLOW_MISSING_REQUESTS";
pub const DESCRIPTION_ENV: &str = "PACT_DESCRIPTION";
pub const PROVIDER_STATE_ENV: &str = "PACT_PROVIDER_STATE";
pub const PROVIDER_NO_STATE_ENV: &str = "PACT_PROVIDER_NO_STATE";

const DEFAULT_PACT_DIR: &str = "pacts";

lazy_static! {
    static ref TRUTHY_REGEX: Regex = Regex::new(r"(?i)^\s*(true|1|yes|y|on)\s*$").unwrap();
}

/// Whether an environment-style value reads as "true".
pub fn is_truthy<S: AsRef<str>>(value: S) -> bool {
    TRUTHY_REGEX.is_match(value.as_ref())
}

pub(crate) fn env_flag(name: &str) -> bool {
    env::var(name).map(is_truthy).unwrap_or(false)
}

pub(crate) fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Settings of a consumer-side HTTP contract.
#[derive(Debug, Clone, PartialEq)]
pub struct PactOptions {
    consumer: String,
    provider: String,
    dir: PathBuf,
    cors: bool,
    port: Option<u16>,
}

impl PactOptions {
    pub fn new<C: Into<String>, P: Into<String>>(consumer: C, provider: P) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            dir: PathBuf::from(DEFAULT_PACT_DIR),
            cors: false,
            port: None,
        }
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn set_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        self.dir = dir.into();
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn set_cors(&mut self, value: bool) {
        self.cors = value;
    }

    pub fn cors(&self) -> bool {
        self.cors
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// `None` lets the engine pick a free port.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Settings of a consumer-side message contract.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePactOptions {
    consumer: String,
    provider: String,
    dir: PathBuf,
}

impl MessagePactOptions {
    pub fn new<C: Into<String>, P: Into<String>>(consumer: C, provider: P) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            dir: PathBuf::from(DEFAULT_PACT_DIR),
        }
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn set_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        self.dir = dir.into();
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Expected requests that were never made do not fail the session.
    pub allow_missing_requests: bool,
}

impl FeatureFlags {
    pub fn from_env() -> Self {
        Self {
            allow_missing_requests: env_flag(ALLOW_MISSING_REQUESTS_ENV),
        }
    }
}
