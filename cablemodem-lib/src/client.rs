use crate::auth::derive_request_auth;
use crate::constants::*;
use crate::error::{HnapError, Result, TransportError};
use crate::message::{ActionRequest, ActionResult, action_uri, decode};
use crate::session::SessionToken;
use crate::transport::{PostRequest, Transport};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends HNAP actions to one device endpoint
#[derive(Clone)]
pub struct HnapClient {
    url: String,
    transport: Arc<dyn Transport>,
}

impl HnapClient {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the POST for `request` under `token`.
    ///
    /// Auth header and session cookies are only attached once the token has a uid;
    /// the login challenge goes out without them.
    pub fn build_request(&self, request: &ActionRequest, token: &SessionToken) -> Result<PostRequest> {
        let action = request.action();
        let mut headers = vec![
            (CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string()),
            (SOAP_ACTION_HEADER.to_string(), action_uri(action)),
        ];
        let mut cookies = Vec::new();

        if token.has_uid() {
            headers.push((
                HNAP_AUTH_HEADER.to_string(),
                derive_request_auth(token.private_key(), action)?,
            ));
            cookies.push((UID_COOKIE.to_string(), token.uid().to_string()));
            cookies.push((PRIVATE_KEY_COOKIE.to_string(), token.private_key().to_string()));
        }

        Ok(PostRequest {
            url: self.url.clone(),
            headers,
            cookies,
            body: request.encode()?,
        })
    }

    /// Send `request` and return its validated result
    pub async fn send(&self, request: &ActionRequest, token: &SessionToken) -> Result<ActionResult> {
        let action = request.action();
        let post = self.build_request(request, token)?;

        debug!(action, "Sending HNAP action");
        let response = self
            .transport
            .post(post)
            .await
            .map_err(|source| HnapError::Transport {
                action: action.to_string(),
                source,
            })?;

        if response.status != 200 {
            if response.status == 404 && action == QUERY_ACTION {
                warn!(action, "Status query answered 404, the session has likely expired");
            }
            return Err(HnapError::Transport {
                action: action.to_string(),
                source: TransportError::Status {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                },
            });
        }

        decode(action, &response.body)
    }
}

impl fmt::Debug for HnapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HnapClient").field("url", &self.url).finish()
    }
}
