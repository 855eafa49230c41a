use std::sync::{
    atomic::{AtomicBool, Ordering},
    RwLock,
};

use solana_sdk::pubkey::Pubkey;

use crate::errors::PreconditionError;

/// Whether an asset belongs to the collection workflow or the cNFT
/// workflow. Each context tracks its image and metadata independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetContext {
    Collection,
    Nft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Metadata,
}

/// Reference to an uploaded asset. Overwritten on re-upload, cleared only
/// by an explicit clear action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub url: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeAccountSummary {
    pub lamports: u64,
    pub data_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfigSummary {
    pub tree_creator: Pubkey,
    pub total_mint_capacity: u64,
    pub num_minted: u64,
    pub is_public: bool,
}

/// Session-scoped state: last-known addresses and uploaded-asset
/// references. Every cell is last-write-wins with no history; nothing is
/// persisted across process restarts.
#[derive(Debug, Default)]
pub struct MinterState {
    tree_address: RwLock<Option<Pubkey>>,
    collection_address: RwLock<Option<Pubkey>>,
    tree_account: RwLock<Option<TreeAccountSummary>>,
    tree_config: RwLock<Option<TreeConfigSummary>>,
    collection_image: RwLock<Option<AssetReference>>,
    collection_metadata: RwLock<Option<AssetReference>>,
    nft_image: RwLock<Option<AssetReference>>,
    nft_metadata: RwLock<Option<AssetReference>>,
}

impl MinterState {
    pub fn tree_address(&self) -> Option<Pubkey> {
        *self.tree_address.read().expect("state lock poisoned")
    }

    pub fn set_tree_address(&self, address: Option<Pubkey>) {
        *self.tree_address.write().expect("state lock poisoned") = address;
    }

    pub fn collection_address(&self) -> Option<Pubkey> {
        *self.collection_address.read().expect("state lock poisoned")
    }

    pub fn set_collection_address(&self, address: Option<Pubkey>) {
        *self.collection_address.write().expect("state lock poisoned") = address;
    }

    pub fn tree_account(&self) -> Option<TreeAccountSummary> {
        self.tree_account.read().expect("state lock poisoned").clone()
    }

    pub fn set_tree_account(&self, summary: Option<TreeAccountSummary>) {
        *self.tree_account.write().expect("state lock poisoned") = summary;
    }

    pub fn tree_config(&self) -> Option<TreeConfigSummary> {
        self.tree_config.read().expect("state lock poisoned").clone()
    }

    pub fn set_tree_config(&self, summary: Option<TreeConfigSummary>) {
        *self.tree_config.write().expect("state lock poisoned") = summary;
    }

    pub fn asset(&self, context: AssetContext, kind: AssetKind) -> Option<AssetReference> {
        self.asset_cell(context, kind)
            .read()
            .expect("state lock poisoned")
            .clone()
    }

    pub fn set_asset(&self, context: AssetContext, kind: AssetKind, asset: AssetReference) {
        *self
            .asset_cell(context, kind)
            .write()
            .expect("state lock poisoned") = Some(asset);
    }

    pub fn clear_asset(&self, context: AssetContext, kind: AssetKind) {
        *self
            .asset_cell(context, kind)
            .write()
            .expect("state lock poisoned") = None;
    }

    fn asset_cell(&self, context: AssetContext, kind: AssetKind) -> &RwLock<Option<AssetReference>> {
        match (context, kind) {
            (AssetContext::Collection, AssetKind::Image) => &self.collection_image,
            (AssetContext::Collection, AssetKind::Metadata) => &self.collection_metadata,
            (AssetContext::Nft, AssetKind::Image) => &self.nft_image,
            (AssetContext::Nft, AssetKind::Metadata) => &self.nft_metadata,
        }
    }
}

/// Advisory flag guarding "one network-mutating operation in flight at a
/// time". Not a queueing mutex: a second acquire fails instead of waiting,
/// since a single logical user drives this process.
#[derive(Debug, Default)]
pub struct TransactionGate {
    in_flight: AtomicBool,
}

impl TransactionGate {
    pub fn try_acquire(&self) -> std::result::Result<GateGuard<'_>, PreconditionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(GateGuard { gate: self })
        } else {
            Err(PreconditionError::OperationInFlight)
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped, so every exit path of an operation,
/// including panics, leaves the UI unblocked.
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a TransactionGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}
