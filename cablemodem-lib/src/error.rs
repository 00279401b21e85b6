use thiserror::Error;

/// The primary error type for the `cablemodem-lib` library.
#[derive(Error, Debug)]
pub enum HnapError {
    #[error("HTTP POST for action {action} failed: {source}")]
    Transport {
        action: String,
        #[source]
        source: TransportError,
    },

    #[error("JSON encoding error for action {action}: {source}")]
    Codec {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("action: {action}, {failure}\npayload: {payload}")]
    Validation {
        action: String,
        failure: ValidationFailure,
        payload: String,
    },

    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<Box<HnapError>>,
    },

    #[error("unable to set up the HTTP client: {0}")]
    ClientSetup(#[source] TransportError),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl HnapError {
    pub(crate) fn authentication(message: impl Into<String>, source: HnapError) -> Self {
        HnapError::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status code of a transport failure, if the device answered at all
    pub fn http_status(&self) -> Option<u16> {
        match self {
            HnapError::Transport {
                source: TransportError::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure looks like the device no longer accepting the session.
    ///
    /// The device drops sessions without notice and then answers authenticated
    /// actions with 404 or a non-OK result, so those are worth one fresh login.
    /// Network-level failures are not.
    pub fn is_session_rejection(&self) -> bool {
        match self {
            HnapError::Transport { .. } => matches!(self.http_status(), Some(401 | 403 | 404)),
            HnapError::Validation { .. } => true,
            _ => false,
        }
    }
}

/// Failure of the transport adapter itself.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("non-success status code {status}, body: {body}")]
    Status { status: u16, body: String },

    #[error("connection error: {0}")]
    Connection(String),
}

/// Reasons an action response envelope is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("invalid number of keys ({0}) in response, expected 1")]
    KeyCount(usize),

    #[error("unable to find the response key {0}")]
    MissingResponseKey(String),

    #[error("unable to find the result key {0}")]
    MissingResultKey(String),

    #[error("result is {0:?}, expected \"OK\"")]
    NotOk(String),

    #[error("value under {0} is not an object")]
    NotAnObject(String),
}

/// A status field that could not be turned into its typed value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unable to decode {action}[{field}]: {reason}")]
pub struct DecodeError {
    pub action: String,
    pub field: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(action: impl Into<String>, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = HnapError> = std::result::Result<T, E>;
