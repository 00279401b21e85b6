use crate::constants::{DEFAULT_TIMEOUT, HNAP_PATH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use strum_macros::Display;

/// URL scheme used to reach the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[strum(to_string = "http")]
    Http,
    #[default]
    #[strum(to_string = "https")]
    Https,
}

/// Everything needed to reach and log into one device
#[derive(Clone)]
pub struct RetrieverConfig {
    /// Host name or IP address of the cable modem
    pub host: String,
    pub scheme: Scheme,
    /// Accept the device's self-signed certificate
    pub skip_verify_cert: bool,
    pub username: String,
    pub password: String,
    /// Per-call network timeout
    pub timeout: Duration,
}

impl RetrieverConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: Scheme::default(),
            skip_verify_cert: false,
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_skip_verify_cert(mut self, skip: bool) -> Self {
        self.skip_verify_cert = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// HNAP endpoint URL, e.g. `https://192.168.100.1/HNAP1/`
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, HNAP_PATH)
    }
}

impl fmt::Debug for RetrieverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieverConfig")
            .field("host", &self.host)
            .field("scheme", &self.scheme)
            .field("skip_verify_cert", &self.skip_verify_cert)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
