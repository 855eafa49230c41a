use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use cnft_client::{AssetUploader, RpcConnection};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::info;

/// SDK session bound to a wallet identity and an RPC endpoint. Shared
/// read-only by all operations and replaced wholesale, never mutated.
pub struct MinterSession<R: RpcConnection, U: AssetUploader> {
    pub rpc: R,
    pub payer: Keypair,
    pub uploader: U,
}

impl<R: RpcConnection, U: AssetUploader> MinterSession<R, U> {
    pub fn identity(&self) -> Pubkey {
        self.payer.pubkey()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SessionInputs {
    endpoint: String,
    identity: Pubkey,
}

/// Rebuild-on-change cell for the session. The handle is recomputed only
/// when its declared inputs (endpoint, identity) change and the shared
/// reference is swapped atomically; consumers must tolerate a momentarily
/// absent handle.
pub struct SessionCell<R: RpcConnection, U: AssetUploader> {
    session: ArcSwapOption<MinterSession<R, U>>,
    inputs: Mutex<Option<SessionInputs>>,
}

impl<R: RpcConnection, U: AssetUploader> Default for SessionCell<R, U> {
    fn default() -> Self {
        Self {
            session: ArcSwapOption::const_empty(),
            inputs: Mutex::new(None),
        }
    }
}

impl<R: RpcConnection, U: AssetUploader> SessionCell<R, U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a session for the given endpoint and wallet, unless one
    /// already exists for the same inputs.
    pub fn rebuild(&self, endpoint: &str, payer: Keypair, uploader: U) {
        let inputs = SessionInputs {
            endpoint: endpoint.to_string(),
            identity: payer.pubkey(),
        };
        let mut current = self.inputs.lock().expect("session lock poisoned");
        if current.as_ref() == Some(&inputs) {
            return;
        }

        info!(
            "installing session for {} at {}",
            inputs.identity, inputs.endpoint
        );
        let rpc = R::new(endpoint, Some(CommitmentConfig::confirmed()));
        self.session.store(Some(Arc::new(MinterSession {
            rpc,
            payer,
            uploader,
        })));
        *current = Some(inputs);
    }

    /// Installs an already-built session, replacing any existing one.
    pub fn install(&self, session: MinterSession<R, U>) {
        let inputs = SessionInputs {
            endpoint: session.rpc.get_url(),
            identity: session.identity(),
        };
        *self.inputs.lock().expect("session lock poisoned") = Some(inputs);
        self.session.store(Some(Arc::new(session)));
    }

    /// Tears the session down, e.g. on wallet disconnect.
    pub fn clear(&self) {
        *self.inputs.lock().expect("session lock poisoned") = None;
        self.session.store(None);
    }

    pub fn load(&self) -> Option<Arc<MinterSession<R, U>>> {
        self.session.load_full()
    }
}
