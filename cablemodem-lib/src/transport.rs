//! Transport adapter
//!
//! The core only needs "POST these bytes with these headers and cookies, give
//! me the status and body back". [`HttpTransport`] does that over reqwest; tests
//! plug in scripted implementations of [`Transport`].

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::COOKIE;
use std::time::Duration;
use tracing::trace;

/// A fully built request for one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PostRequest {
    /// Value of the first header named `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the cookie named `name`
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// `Cookie` header rendering of the attached cookies
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self.cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Some(pairs.join("; "))
    }
}

/// Raw answer of the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResponse {
    pub status: u16,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-call timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// `skip_verify_cert` accepts the self-signed certificates these devices ship with
    pub fn new(skip_verify_cert: bool, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_verify_cert)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, TransportError> {
        let mut builder = self.client.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = request.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }

        trace!(
            url = %request.url,
            headers = ?request.headers,
            cookies = ?request.cookies,
            body = %String::from_utf8_lossy(&request.body),
            "HTTP request"
        );

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        trace!(status, body = %String::from_utf8_lossy(&body), "HTTP response");
        Ok(PostResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_rendering() {
        let mut request = PostRequest {
            url: "http://192.168.100.1/HNAP1/".to_string(),
            headers: vec![("SOAPAction".to_string(), "\"x\"".to_string())],
            cookies: Vec::new(),
            body: Vec::new(),
        };
        assert_eq!(request.cookie_header(), None);

        request.cookies.push(("uid".to_string(), "abc".to_string()));
        request.cookies.push(("PrivateKey".to_string(), "DEF".to_string()));
        assert_eq!(request.cookie_header().as_deref(), Some("uid=abc; PrivateKey=DEF"));
        assert_eq!(request.cookie("PrivateKey"), Some("DEF"));
        assert_eq!(request.header("soapaction"), Some("\"x\""));
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(true, Duration::from_secs(1)).is_ok());
    }
}
