use std::{str::FromStr, sync::Arc};

use cnft_client::{AssetUploader, RpcConnection};
use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use tracing::warn;

use crate::{
    errors::{MinterError, PreconditionError, Result},
    instructions::{
        build_signed_transaction, create_collection_instruction, create_tree_instructions,
        merkle_tree_account_size, mint_to_collection_instruction, tree_config_pda,
        tree_config_summary,
    },
    metadata::NftMetadata,
    notify::Notifier,
    session::{MinterSession, SessionCell},
    state::{
        AssetContext, AssetKind, AssetReference, MinterState, TransactionGate,
        TreeAccountSummary, TreeConfigSummary,
    },
};

/// Raw tree-creation parameters as they arrive from the form. Parsed and
/// validated before any network call; not retained after a successful
/// create.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: String,
    pub max_buffer_size: String,
    pub canopy_depth: String,
}

impl TreeParams {
    fn parse(&self) -> std::result::Result<(u32, u32, u32), PreconditionError> {
        Ok((
            parse_u32("max_depth", &self.max_depth)?,
            parse_u32("max_buffer_size", &self.max_buffer_size)?,
            parse_u32("canopy_depth", &self.canopy_depth)?,
        ))
    }
}

fn parse_u32(
    field: &'static str,
    value: &str,
) -> std::result::Result<u32, PreconditionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PreconditionError::MissingField { field });
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| PreconditionError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_amount(
    field: &'static str,
    value: &str,
) -> std::result::Result<f64, PreconditionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PreconditionError::MissingField { field });
    }
    let amount = trimmed
        .parse::<f64>()
        .map_err(|_| PreconditionError::InvalidNumber {
            field,
            value: value.to_string(),
        })?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PreconditionError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(amount)
}

fn require_field(
    field: &'static str,
    value: &str,
) -> std::result::Result<(), PreconditionError> {
    if value.trim().is_empty() {
        return Err(PreconditionError::MissingField { field });
    }
    Ok(())
}

/// Orchestrates the console's blockchain-mutating operations. Each one
/// acquires the transaction gate, validates its inputs, builds a request,
/// submits it through the session at "confirmed" commitment and reports the
/// outcome to the notification sink. Public operations never return errors;
/// failures become notifications and a `None` result.
pub struct Minter<R: RpcConnection, U: AssetUploader> {
    session: Arc<SessionCell<R, U>>,
    state: Arc<MinterState>,
    gate: TransactionGate,
    notifier: Arc<dyn Notifier>,
}

impl<R: RpcConnection, U: AssetUploader> Minter<R, U> {
    pub fn new(
        session: Arc<SessionCell<R, U>>,
        state: Arc<MinterState>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            state,
            gate: TransactionGate::default(),
            notifier,
        }
    }

    pub fn state(&self) -> &MinterState {
        &self.state
    }

    /// While true, the UI must keep mutating triggers disabled.
    pub fn transaction_in_flight(&self) -> bool {
        self.gate.is_in_flight()
    }

    fn current_session(
        &self,
    ) -> std::result::Result<Arc<MinterSession<R, U>>, PreconditionError> {
        self.session.load().ok_or(PreconditionError::MissingSession)
    }

    /// Requests a devnet airdrop of `amount` SOL for the wallet identity,
    /// then waits for confirmation separately.
    pub async fn request_airdrop(&self, amount: &str) -> Option<Signature> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self.try_request_airdrop(amount).await {
            Ok(signature) => {
                self.notifier
                    .success(&format!("Airdrop successful! Transaction hash: {signature}"));
                Some(signature)
            }
            Err(err) => {
                warn!("airdrop failed: {err}");
                self.notifier.error(&format!("Airdrop failed: {err}"));
                None
            }
        }
    }

    async fn try_request_airdrop(&self, amount: &str) -> Result<Signature> {
        let session = self.current_session()?;
        let amount = parse_amount("amount", amount)?;
        let lamports = (amount * LAMPORTS_PER_SOL as f64) as u64;

        let signature = session
            .rpc
            .request_airdrop(&session.identity(), lamports)
            .await?;
        session.rpc.confirm_transaction(&signature).await?;
        Ok(signature)
    }

    /// Creates a new merkle tree sized for the given parameters and stores
    /// its address on success.
    pub async fn create_tree(&self, params: &TreeParams) -> Option<Signature> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self.try_create_tree(params).await {
            Ok(signature) => {
                self.notifier
                    .success(&format!("Transaction hash: {signature}"));
                Some(signature)
            }
            Err(err) => {
                warn!("merkle tree creation failed: {err}");
                self.notifier
                    .error(&format!("An error occurred while creating merkle tree: {err}"));
                None
            }
        }
    }

    async fn try_create_tree(&self, params: &TreeParams) -> Result<Signature> {
        let session = self.current_session()?;
        let (max_depth, max_buffer_size, canopy_depth) = params.parse()?;

        let tree = Keypair::new();
        let account_size = merkle_tree_account_size(max_depth, max_buffer_size, canopy_depth);
        let rent_lamports = session
            .rpc
            .get_minimum_balance_for_rent_exemption(account_size)
            .await?;
        let instructions = create_tree_instructions(
            &session.identity(),
            &tree.pubkey(),
            max_depth,
            max_buffer_size,
            account_size,
            rent_lamports,
        );

        let blockhash = session.rpc.get_latest_blockhash().await?;
        let transaction =
            build_signed_transaction(&instructions, &session.payer, &[&tree], blockhash);
        let signature = session.rpc.send_and_confirm_transaction(&transaction).await?;

        self.state.set_tree_address(Some(tree.pubkey()));
        Ok(signature)
    }

    /// Creates the collection NFT and stores its mint address on success.
    pub async fn create_collection(
        &self,
        name: &str,
        symbol: &str,
        metadata_uri: &str,
    ) -> Option<Signature> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self.try_create_collection(name, symbol, metadata_uri).await {
            Ok(signature) => {
                self.notifier
                    .success(&format!("Transaction hash: {signature}"));
                Some(signature)
            }
            Err(err) => {
                warn!("collection creation failed: {err}");
                self.notifier
                    .error(&format!("An error occurred when creating collection: {err}"));
                None
            }
        }
    }

    async fn try_create_collection(
        &self,
        name: &str,
        symbol: &str,
        metadata_uri: &str,
    ) -> Result<Signature> {
        let session = self.current_session()?;
        require_field("name", name)?;
        require_field("metadata_uri", metadata_uri)?;

        let collection_mint = Keypair::new();
        let instruction = create_collection_instruction(
            &session.identity(),
            &collection_mint.pubkey(),
            name,
            symbol,
            metadata_uri,
        );

        let blockhash = session.rpc.get_latest_blockhash().await?;
        let transaction = build_signed_transaction(
            &[instruction],
            &session.payer,
            &[&collection_mint],
            blockhash,
        );
        let signature = session.rpc.send_and_confirm_transaction(&transaction).await?;

        self.state
            .set_collection_address(Some(collection_mint.pubkey()));
        Ok(signature)
    }

    /// Mints one cNFT per recipient into the stored collection: a single
    /// composite transaction with one mint instruction per address. Aborts
    /// silently when the tree or collection address is unset.
    pub async fn mint_batch(
        &self,
        name: &str,
        symbol: &str,
        metadata_uri: &str,
        recipients: &[Pubkey],
    ) -> Option<Signature> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self
            .try_mint_batch(name, symbol, metadata_uri, recipients)
            .await
        {
            Ok(Some(signature)) => {
                self.notifier
                    .success(&format!("Transaction hash: {signature}"));
                Some(signature)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("mint failed: {err}");
                self.notifier
                    .error(&format!("An error occurred when minting cNFTs: {err}"));
                None
            }
        }
    }

    async fn try_mint_batch(
        &self,
        name: &str,
        symbol: &str,
        metadata_uri: &str,
        recipients: &[Pubkey],
    ) -> Result<Option<Signature>> {
        let session = self.current_session()?;

        let (tree, collection) = match (self.state.tree_address(), self.state.collection_address())
        {
            (Some(tree), Some(collection)) => (tree, collection),
            // Validation-only short circuit: no submission, no notification.
            _ => return Ok(None),
        };

        require_field("metadata_uri", metadata_uri)?;
        if recipients.is_empty() {
            return Err(PreconditionError::MissingField {
                field: "recipients",
            }
            .into());
        }

        let payer = session.identity();
        let instructions: Vec<_> = recipients
            .iter()
            .map(|recipient| {
                mint_to_collection_instruction(
                    &payer,
                    &tree,
                    &collection,
                    recipient,
                    name,
                    symbol,
                    metadata_uri,
                )
            })
            .collect();

        let blockhash = session.rpc.get_latest_blockhash().await?;
        let transaction = build_signed_transaction(&instructions, &session.payer, &[], blockhash);
        let signature = session.rpc.send_and_confirm_transaction(&transaction).await?;
        Ok(Some(signature))
    }

    /// Fetches the raw tree account for the stored tree address and caches
    /// a summary of it.
    pub async fn fetch_tree(&self) -> Option<TreeAccountSummary> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self.try_fetch_tree().await {
            Ok(summary) => {
                self.notifier.success(&format!(
                    "Merkle tree account: {} bytes, {} lamports",
                    summary.data_len, summary.lamports
                ));
                Some(summary)
            }
            Err(err) => {
                warn!("tree fetch failed: {err}");
                self.notifier
                    .error(&format!("An error occurred while fetching merkle tree: {err}"));
                None
            }
        }
    }

    async fn try_fetch_tree(&self) -> Result<TreeAccountSummary> {
        let session = self.current_session()?;
        let tree = self
            .state
            .tree_address()
            .ok_or(PreconditionError::MissingField {
                field: "tree_address",
            })?;

        let account = session
            .rpc
            .get_account(tree)
            .await?
            .ok_or_else(|| MinterError::AccountNotFound(tree.to_string()))?;
        let summary = TreeAccountSummary {
            lamports: account.lamports,
            data_len: account.data.len(),
        };
        self.state.set_tree_account(Some(summary.clone()));
        Ok(summary)
    }

    /// Fetches and decodes the tree's config PDA and caches a summary.
    pub async fn fetch_tree_config(&self) -> Option<TreeConfigSummary> {
        let _gate = match self.gate.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match self.try_fetch_tree_config().await {
            Ok(summary) => {
                self.notifier.success(&format!(
                    "Tree config: {}/{} minted",
                    summary.num_minted, summary.total_mint_capacity
                ));
                Some(summary)
            }
            Err(err) => {
                warn!("tree config fetch failed: {err}");
                self.notifier.error(&format!(
                    "An error occurred while fetching merkle tree config: {err}"
                ));
                None
            }
        }
    }

    async fn try_fetch_tree_config(&self) -> Result<TreeConfigSummary> {
        let session = self.current_session()?;
        let tree = self
            .state
            .tree_address()
            .ok_or(PreconditionError::MissingField {
                field: "tree_address",
            })?;

        let config_address = tree_config_pda(&tree);
        let account = session
            .rpc
            .get_account(config_address)
            .await?
            .ok_or_else(|| MinterError::AccountNotFound(config_address.to_string()))?;
        let summary = tree_config_summary(&config_address, &account.data)?;
        self.state.set_tree_config(Some(summary.clone()));
        Ok(summary)
    }

    /// Uploads image bytes and stores the resulting asset reference for the
    /// given context. Returns `None` on any failure instead of propagating.
    pub async fn upload_image(
        &self,
        context: AssetContext,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Option<String> {
        let session = match self.current_session() {
            Ok(session) => session,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        match session.uploader.upload(bytes, file_name, mime_type).await {
            Ok(url) => {
                self.state.set_asset(
                    context,
                    AssetKind::Image,
                    AssetReference {
                        url: url.clone(),
                        mime_type: Some(mime_type.to_string()),
                    },
                );
                self.notifier.success(&format!("Image uploaded: {url}"));
                Some(url)
            }
            Err(err) => {
                self.notifier
                    .error(&format!("An error occurred while uploading image: {err}"));
                None
            }
        }
    }

    /// Uploads a metadata document and stores the resulting reference for
    /// the given context.
    pub async fn upload_metadata(
        &self,
        context: AssetContext,
        metadata: &NftMetadata,
    ) -> Option<String> {
        let session = match self.current_session() {
            Ok(session) => session,
            Err(err) => {
                self.notifier.error(&err.to_string());
                return None;
            }
        };
        let value = match serde_json::to_value(metadata) {
            Ok(value) => value,
            Err(err) => {
                self.notifier
                    .error(&format!("An error occurred while uploading metadata: {err}"));
                return None;
            }
        };
        match session.uploader.upload_json(&value).await {
            Ok(url) => {
                self.state.set_asset(
                    context,
                    AssetKind::Metadata,
                    AssetReference {
                        url: url.clone(),
                        mime_type: None,
                    },
                );
                self.notifier.success(&format!("Metadata uploaded: {url}"));
                Some(url)
            }
            Err(err) => {
                self.notifier
                    .error(&format!("An error occurred while uploading metadata: {err}"));
                None
            }
        }
    }

    /// Stores a user-provided tree address; parse-only validation.
    pub fn set_tree_address(&self, address: &str) -> bool {
        match Pubkey::from_str(address.trim()) {
            Ok(address) => {
                self.state.set_tree_address(Some(address));
                self.notifier.success("Merkle tree address set");
                true
            }
            Err(_) => {
                self.notifier
                    .error(&PreconditionError::InvalidAddress(address.to_string()).to_string());
                false
            }
        }
    }

    /// Stores a user-provided collection address; parse-only validation.
    pub fn set_collection_address(&self, address: &str) -> bool {
        match Pubkey::from_str(address.trim()) {
            Ok(address) => {
                self.state.set_collection_address(Some(address));
                self.notifier.success("Collection address set");
                true
            }
            Err(_) => {
                self.notifier
                    .error(&PreconditionError::InvalidAddress(address.to_string()).to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_params_parse_integers() {
        let params = TreeParams {
            max_depth: "14".to_string(),
            max_buffer_size: "64".to_string(),
            canopy_depth: "0".to_string(),
        };
        assert_eq!(params.parse().unwrap(), (14, 64, 0));
    }

    #[test]
    fn tree_params_reject_non_numeric_input() {
        let params = TreeParams {
            max_depth: "abc".to_string(),
            max_buffer_size: "64".to_string(),
            canopy_depth: "0".to_string(),
        };
        assert!(matches!(
            params.parse(),
            Err(PreconditionError::InvalidNumber { field: "max_depth", .. })
        ));

        let params = TreeParams {
            max_depth: "14".to_string(),
            max_buffer_size: "-1".to_string(),
            canopy_depth: "0".to_string(),
        };
        assert!(matches!(
            params.parse(),
            Err(PreconditionError::InvalidNumber { field: "max_buffer_size", .. })
        ));
    }

    #[test]
    fn amounts_must_be_finite_and_positive() {
        assert_eq!(parse_amount("amount", "1.5").unwrap(), 1.5);
        assert!(parse_amount("amount", "0").is_err());
        assert!(parse_amount("amount", "-1").is_err());
        assert!(parse_amount("amount", "inf").is_err());
        assert!(parse_amount("amount", "sol").is_err());
        assert!(matches!(
            parse_amount("amount", ""),
            Err(PreconditionError::MissingField { field: "amount" })
        ));
    }
}
