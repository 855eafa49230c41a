use cnft_client::{RpcError, UploadError};
use thiserror::Error;

/// Validation failures caught before any network call is attempted.
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("No wallet session, connect a wallet first")]
    MissingSession,

    #[error("Another transaction is already in flight")]
    OperationInFlight,

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid numeric value for {field}: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[derive(Error, Debug)]
pub enum MinterError {
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Account {0} does not exist")]
    AccountNotFound(String),

    #[error("Failed to decode account {address}: {error}")]
    AccountDeserialization { address: String, error: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, MinterError>;
