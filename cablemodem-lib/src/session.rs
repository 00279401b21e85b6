//! Session manager
//!
//! Owns the login handshake and the cached [`SessionToken`].
//!
//! ```text
//!   Unauthenticated ──login()──► Authenticated ──expiry passes──► Expired
//!         ▲                          │                               │
//!         └───────── reset() ────────┘◄────────── login() ───────────┘
//! ```
//!
//! The token sits behind a mutex and only ever leaves it as a copy, so an
//! in-flight request keeps the token it started with even if another caller
//! replaces the cached one. The lock is never held across network I/O.

use crate::auth::{derive_hashed_password, derive_private_key};
use crate::client::HnapClient;
use crate::constants::{LOGIN_ACTION, PRE_LOGIN_PRIVATE_KEY, TOKEN_VALIDITY};
use crate::error::{HnapError, Result};
use crate::message::ActionRequest;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Cached session credential
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    uid: String,
    private_key: String,
    expiry: Option<Instant>,
}

impl SessionToken {
    /// Token used before any login: empty uid, sentinel private key, no expiry
    pub fn unauthenticated() -> Self {
        Self {
            uid: String::new(),
            private_key: PRE_LOGIN_PRIVATE_KEY.to_string(),
            expiry: None,
        }
    }

    pub(crate) fn authenticated(uid: String, private_key: String, expiry: Instant) -> Self {
        Self {
            uid,
            private_key,
            expiry: Some(expiry),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn expiry(&self) -> Option<Instant> {
        self.expiry
    }

    pub fn has_uid(&self) -> bool {
        !self.uid.is_empty()
    }

    /// A token without expiry counts as expired
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiry.is_none_or(|expiry| now >= expiry)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn set_expiry(&mut self, expiry: Instant) {
        self.expiry = Some(expiry);
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = self
            .expiry
            .map(|expiry| expiry.saturating_duration_since(Instant::now()));
        f.debug_struct("SessionToken")
            .field("uid", &self.uid)
            .field("private_key", &"<redacted>")
            .field("expires_in", &remaining)
            .finish()
    }
}

/// First step of the handshake, consumed immediately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    pub uid: String,
    pub public_key: String,
    pub challenge: String,
}

/// A token handed out by [`SessionManager::valid_token`]
#[derive(Debug, Clone)]
pub struct AcquiredToken {
    pub token: SessionToken,
    /// The token came from a login performed by this call
    pub fresh_login: bool,
}

pub struct SessionManager {
    username: String,
    password: String,
    token: Mutex<SessionToken>,
    logins: AtomicU64,
}

impl SessionManager {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            token: Mutex::new(SessionToken::unauthenticated()),
            logins: AtomicU64::new(0),
        }
    }

    /// Copy of the cached token
    pub fn token(&self) -> SessionToken {
        self.token.lock().clone()
    }

    /// Replace the cached token with a copy of `token`
    pub fn persist(&self, token: &SessionToken) {
        debug!(?token, "Persisting session token");
        *self.token.lock() = token.clone();
    }

    /// Drop the cached session
    pub fn reset(&self) {
        debug!("Resetting session token");
        *self.token.lock() = SessionToken::unauthenticated();
    }

    /// Keep the cached session but treat it as expired
    pub fn mark_expired(&self) {
        let mut token = self.token.lock();
        token.expiry = Some(Instant::now());
    }

    /// Number of successful logins performed so far
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    fn login_request(&self, mode: &str, password: &str) -> ActionRequest {
        ActionRequest::new(LOGIN_ACTION)
            .param("Action", mode)
            .param("Captcha", "")
            .param("LoginPassword", password)
            .param("PrivateLogin", "LoginPassword")
            .param("Username", self.username.as_str())
    }

    /// Fetch uid, public key and challenge for a new session
    pub async fn request_challenge(&self, client: &HnapClient) -> Result<LoginChallenge> {
        let request = self.login_request("request", "");
        let result = client.send(&request, &SessionToken::unauthenticated()).await?;
        Ok(LoginChallenge {
            uid: result.string_field(LOGIN_ACTION, "Cookie")?.to_string(),
            public_key: result.string_field(LOGIN_ACTION, "PublicKey")?.to_string(),
            challenge: result.string_field(LOGIN_ACTION, "Challenge")?.to_string(),
        })
    }

    /// Run the full handshake and return the new token without caching it
    pub async fn login(&self, client: &HnapClient) -> Result<SessionToken> {
        info!(username = %self.username, "Logging in");
        let challenge = self
            .request_challenge(client)
            .await
            .map_err(|e| HnapError::authentication("failed to retrieve login challenge", e))?;

        // Taken before confirmation so the window also covers the handshake
        let expiry = Instant::now() + TOKEN_VALIDITY;

        let private_key = derive_private_key(&challenge.public_key, &challenge.challenge, &self.password)
            .map_err(|e| HnapError::authentication("failed to derive private key", e))?;
        let hashed_password = derive_hashed_password(&private_key, &challenge.challenge)
            .map_err(|e| HnapError::authentication("failed to derive hashed password", e))?;

        let token = SessionToken::authenticated(challenge.uid, private_key, expiry);
        client
            .send(&self.login_request("login", &hashed_password), &token)
            .await
            .map_err(|e| HnapError::authentication("login confirmation rejected", e))?;

        self.logins.fetch_add(1, Ordering::Relaxed);
        info!("Login succeeded");
        Ok(token)
    }

    /// Log in and cache the resulting token
    pub async fn refresh(&self, client: &HnapClient) -> Result<SessionToken> {
        let token = self.login(client).await?;
        self.persist(&token);
        Ok(token)
    }

    /// Cached token if still valid, otherwise a freshly logged-in one.
    ///
    /// Concurrent callers racing past an expired token may each log in.
    pub async fn valid_token(&self, client: &HnapClient) -> Result<AcquiredToken> {
        let token = self.token();
        if !token.is_expired() {
            return Ok(AcquiredToken {
                token,
                fresh_login: false,
            });
        }

        debug!(?token, "Token expired, logging in");
        Ok(AcquiredToken {
            token: self.refresh(client).await?,
            fresh_login: true,
        })
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("username", &self.username)
            .field("token", &self.token())
            .field("logins", &self.login_count())
            .finish_non_exhaustive()
    }
}
