use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use tokio::time::sleep;
use tracing::warn;

use crate::rpc::{
    errors::RpcError,
    rpc_connection::{RetryConfig, RpcConnection},
};

pub enum SolanaRpcUrl {
    MainnetBeta,
    Devnet,
    Testnet,
    Localnet,
    Custom(String),
}

impl std::fmt::Display for SolanaRpcUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            SolanaRpcUrl::MainnetBeta => "https://api.mainnet-beta.solana.com".to_string(),
            SolanaRpcUrl::Devnet => "https://api.devnet.solana.com".to_string(),
            SolanaRpcUrl::Testnet => "https://api.testnet.solana.com".to_string(),
            SolanaRpcUrl::Localnet => "http://localhost:8899".to_string(),
            SolanaRpcUrl::Custom(url) => url.clone(),
        };
        write!(f, "{}", str)
    }
}

pub struct SolanaRpcConnection {
    pub client: RpcClient,
    pub retry_config: RetryConfig,
}

impl Debug for SolanaRpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolanaRpcConnection {{ url: {} }}", self.client.url())
    }
}

impl SolanaRpcConnection {
    pub fn new_with_retry<U: ToString>(
        url: U,
        commitment_config: Option<CommitmentConfig>,
        retry_config: Option<RetryConfig>,
    ) -> Self {
        let commitment_config = commitment_config.unwrap_or_else(CommitmentConfig::confirmed);
        let client = RpcClient::new_with_commitment(url.to_string(), commitment_config);
        Self {
            client,
            retry_config: retry_config.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RpcConnection for SolanaRpcConnection {
    fn new<U: ToString>(url: U, commitment_config: Option<CommitmentConfig>) -> Self {
        Self::new_with_retry(url, commitment_config, None)
    }

    fn get_url(&self) -> String {
        self.client.url()
    }

    fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    async fn health(&self) -> Result<(), RpcError> {
        self.client.get_health().await?;
        Ok(())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        let blockhash = self.client.get_latest_blockhash().await?;
        Ok(blockhash)
    }

    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError> {
        let account = self
            .client
            .get_account_with_commitment(&address, self.client.commitment())
            .await?;
        Ok(account.value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        let balance = self.client.get_balance(address).await?;
        Ok(balance)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, RpcError> {
        let lamports = self
            .client
            .get_minimum_balance_for_rent_exemption(size)
            .await?;
        Ok(lamports)
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        let signature = self.client.request_airdrop(to, lamports).await?;
        Ok(signature)
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), RpcError> {
        let commitment = self.client.commitment();
        // The blockhash/height pair is fetched immediately before the wait;
        // the transaction is abandoned once that blockhash expires.
        let (_, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment)
            .await?;

        loop {
            let statuses = self
                .client
                .get_signature_statuses(&[*signature])
                .await?
                .value;
            if let Some(status) = statuses.into_iter().next().flatten() {
                if let Some(err) = status.err {
                    return Err(RpcError::TransactionError(err));
                }
                if status.satisfies_commitment(commitment) {
                    return Ok(());
                }
            }

            let block_height = self.client.get_block_height().await?;
            if block_height > last_valid_block_height {
                warn!("confirmation window expired for {}", signature);
                return Err(RpcError::ConfirmationTimeout(signature.to_string()));
            }

            sleep(Duration::from_millis(self.retry_config.retry_wait_time_ms)).await;
        }
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, RpcError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.client.commitment().commitment),
            max_retries: Some(self.retry_config.max_retries as usize),
            ..Default::default()
        };
        let signature = self
            .client
            .send_transaction_with_config(transaction, config)
            .await?;
        self.confirm_transaction(&signature).await?;
        Ok(signature)
    }
}
