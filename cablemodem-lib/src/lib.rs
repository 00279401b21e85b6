pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod message;
pub mod parse;
pub mod retriever;
pub mod session;
pub mod status;
pub mod transport;

// Re-export the retriever and its inputs/outputs for easy access
pub use config::{RetrieverConfig, Scheme};
pub use error::HnapError;
pub use retriever::StatusRetriever;
pub use status::{CableModemStatus, RawStatus};
