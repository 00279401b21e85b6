use crate::client::HnapClient;
use crate::config::RetrieverConfig;
use crate::constants::{QUERY_ACTION, STATUS_SUB_ACTIONS, TOKEN_VALIDITY};
use crate::decode::parse_raw_status;
use crate::error::{HnapError, Result};
use crate::message::{ActionRequest, result_key};
use crate::session::{SessionManager, SessionToken};
use crate::status::{CableModemStatus, RawStatus};
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Retrieves the status of one cable modem.
///
/// Safe to share between concurrent callers; they share one cached session.
#[derive(Debug)]
pub struct StatusRetriever {
    client: HnapClient,
    session: SessionManager,
}

/// The multiplexed query: every sub-action listed with an empty value
pub fn status_query() -> ActionRequest {
    STATUS_SUB_ACTIONS
        .iter()
        .fold(ActionRequest::new(QUERY_ACTION), |request, action| request.param(*action, ""))
}

impl StatusRetriever {
    /// Retriever talking HTTP(S) to the configured host
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let transport =
            HttpTransport::new(config.skip_verify_cert, config.timeout).map_err(HnapError::ClientSetup)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Retriever over any transport adapter
    pub fn with_transport(config: RetrieverConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            client: HnapClient::new(config.url(), transport),
            session: SessionManager::new(config.username, config.password),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Drop the cached session so the next retrieval logs in again
    pub fn reset_session(&self) {
        self.session.reset();
    }

    /// Fetch the undecoded status.
    ///
    /// Tries the cached (or freshly logged-in) token first. If the device rejects
    /// the query and the token was not issued by this call, the session is
    /// discarded, a new login is forced and the query is retried exactly once.
    pub async fn retrieve_raw_status(&self) -> Result<RawStatus> {
        let request = status_query();
        let acquired = self.session.valid_token(&self.client).await?;

        let err = match self.query(&request, acquired.token).await {
            Ok(raw) => return Ok(raw),
            Err(err) => err,
        };
        if acquired.fresh_login || !err.is_session_rejection() {
            return Err(err);
        }

        warn!(error = %err, "Status query rejected, logging in again and retrying once");
        self.session.reset();
        let token = self.session.refresh(&self.client).await?;
        self.query(&request, token).await
    }

    /// Fetch and decode the status
    pub async fn retrieve_status(&self) -> Result<CableModemStatus> {
        let raw = self.retrieve_raw_status().await?;
        parse_raw_status(&raw)
    }

    async fn query(&self, request: &ActionRequest, mut token: SessionToken) -> Result<RawStatus> {
        // Any successful authenticated call extends the session on the device,
        // counted from when the request went out.
        let expiry = Instant::now() + TOKEN_VALIDITY;
        let result = self.client.send(request, &token).await?;
        token.set_expiry(expiry);
        self.session.persist(&token);
        debug!("Status query succeeded, session extended");

        let mut sub_responses = result.into_inner();
        sub_responses.remove(&result_key(QUERY_ACTION));
        Ok(RawStatus::from(sub_responses))
    }
}
