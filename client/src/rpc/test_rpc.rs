use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::{Transaction, TransactionError},
};
use tokio::time::sleep;

use super::{RpcConnection, RpcError};

/// In-memory connection for exercising the orchestrator without a cluster.
/// Records every network call so tests can assert that validation failures
/// never reach the network layer.
#[derive(Default)]
pub struct TestRpcConnection {
    url: String,
    commitment: CommitmentConfig,
    network_calls: AtomicUsize,
    sent_transactions: Mutex<Vec<Transaction>>,
    airdrops: Mutex<Vec<(Pubkey, u64)>>,
    accounts: Mutex<HashMap<Pubkey, Account>>,
    fail_sends: AtomicBool,
    fail_confirmations: AtomicBool,
    send_delay: Mutex<Option<Duration>>,
}

impl Debug for TestRpcConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestRpcConnection {{ url: {} }}", self.url)
    }
}

impl TestRpcConnection {
    pub fn network_calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.sent_transactions.lock().unwrap().clone()
    }

    pub fn airdrops(&self) -> Vec<(Pubkey, u64)> {
        self.airdrops.lock().unwrap().clone()
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_confirmations(&self, fail: bool) {
        self.fail_confirmations.store(fail, Ordering::SeqCst);
    }

    pub fn set_send_delay(&self, delay: Option<Duration>) {
        *self.send_delay.lock().unwrap() = delay;
    }

    fn record_call(&self) {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RpcConnection for TestRpcConnection {
    fn new<U: ToString>(url: U, commitment_config: Option<CommitmentConfig>) -> Self {
        Self {
            url: url.to_string(),
            commitment: commitment_config.unwrap_or_else(CommitmentConfig::confirmed),
            ..Self::default()
        }
    }

    fn get_url(&self) -> String {
        self.url.clone()
    }

    fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    async fn health(&self) -> Result<(), RpcError> {
        self.record_call();
        Ok(())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.record_call();
        Ok(Hash::new_unique())
    }

    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError> {
        self.record_call();
        Ok(self.accounts.lock().unwrap().get(&address).cloned())
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        self.record_call();
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(address)
            .map(|a| a.lamports)
            .unwrap_or(0))
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, RpcError> {
        self.record_call();
        Ok(1_000_000 + size as u64)
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        self.record_call();
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RpcError::CustomError("airdrop request failed".to_string()));
        }
        self.airdrops.lock().unwrap().push((*to, lamports));
        Ok(Signature::new_unique())
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), RpcError> {
        self.record_call();
        if self.fail_confirmations.load(Ordering::SeqCst) {
            return Err(RpcError::TransactionError(
                TransactionError::InsufficientFundsForFee,
            ));
        }
        let _ = signature;
        Ok(())
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, RpcError> {
        self.record_call();
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RpcError::CustomError("transaction send failed".to_string()));
        }
        self.sent_transactions.lock().unwrap().push(transaction.clone());
        if self.fail_confirmations.load(Ordering::SeqCst) {
            return Err(RpcError::TransactionError(
                TransactionError::InsufficientFundsForFee,
            ));
        }
        Ok(transaction
            .signatures
            .first()
            .copied()
            .unwrap_or_default())
    }
}
