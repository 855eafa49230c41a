use std::io;

use solana_client::client_error::ClientError;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("ClientError: {0}")]
    ClientError(#[from] ClientError),

    /// A submitted transaction was confirmed but its status carries an
    /// embedded execution error.
    #[error("TransactionError: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("IoError: {0}")]
    IoError(#[from] io::Error),

    #[error("Transaction {0} was not confirmed before its blockhash expired")]
    ConfirmationTimeout(String),

    #[error("Error: `{0}`")]
    CustomError(String),
}
