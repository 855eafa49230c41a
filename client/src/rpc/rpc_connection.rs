use std::fmt::Debug;

use async_trait::async_trait;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};

use crate::rpc::errors::RpcError;

/// Send-level retry policy. The retry count is forwarded to the RPC node
/// with the send request; confirmation failures are never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u8,
    pub retry_wait_time_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_wait_time_ms: 500,
        }
    }
}

/// Connection surface shared by every operation of the minting console.
/// Implementations are replaced wholesale when the wallet or endpoint
/// changes; they are never mutated in place.
#[async_trait]
pub trait RpcConnection: Send + Sync + Debug + 'static {
    fn new<U: ToString>(url: U, commitment_config: Option<CommitmentConfig>) -> Self
    where
        Self: Sized;

    fn get_url(&self) -> String;

    fn commitment(&self) -> CommitmentConfig;

    async fn health(&self) -> Result<(), RpcError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;

    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError>;

    async fn get_minimum_balance_for_rent_exemption(&self, size: usize)
        -> Result<u64, RpcError>;

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, RpcError>;

    /// Waits until the signature reaches the connection's commitment or the
    /// blockhash/height pair fetched on entry expires. An error embedded in
    /// the confirmed status is surfaced as [`RpcError::TransactionError`].
    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), RpcError>;

    /// Submits a signed transaction with the connection's retry policy and
    /// waits for confirmation at the connection's commitment.
    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, RpcError>;
}
