use mpl_bubblegum::{
    accounts::TreeConfig,
    instructions::{CreateTreeConfigBuilder, MintToCollectionV1Builder},
    programs::{SPL_ACCOUNT_COMPRESSION_ID, SPL_NOOP_ID},
    types::{Collection, Creator, MetadataArgs, TokenProgramVersion, TokenStandard},
};
use mpl_token_metadata::{
    accounts::{MasterEdition, Metadata},
    instructions::CreateV1Builder,
    types::{PrintSupply, TokenStandard as MetadataTokenStandard},
};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction, system_program,
    transaction::Transaction,
};

use crate::{errors::MinterError, state::TreeConfigSummary};

/// Size of a tree account: version/type prefix plus the v1 header.
const TREE_ACCOUNT_HEADER_BYTES: usize = 56;
const NODE_BYTES: usize = 32;

/// Byte size of the on-chain concurrent merkle tree account for the given
/// parameters, computed client-side (as the original SDK does) so the
/// account can be allocated before `CreateTreeConfig` initializes it.
pub fn merkle_tree_account_size(max_depth: u32, max_buffer_size: u32, canopy_depth: u32) -> usize {
    let depth = max_depth as usize;
    let change_log = NODE_BYTES + depth * NODE_BYTES + 8;
    let rightmost_path = depth * NODE_BYTES + NODE_BYTES + 8;
    let tree = 24 + max_buffer_size as usize * change_log + rightmost_path;
    let canopy = if canopy_depth == 0 {
        0
    } else {
        ((1usize << (canopy_depth + 1)) - 2) * NODE_BYTES
    };
    TREE_ACCOUNT_HEADER_BYTES + tree + canopy
}

/// Allocates the tree account and initializes its config. The tree keypair
/// is the ephemeral signer for the new on-chain object.
pub fn create_tree_instructions(
    payer: &Pubkey,
    merkle_tree: &Pubkey,
    max_depth: u32,
    max_buffer_size: u32,
    account_size: usize,
    rent_lamports: u64,
) -> Vec<Instruction> {
    let (tree_config, _) = TreeConfig::find_pda(merkle_tree);

    let allocate = system_instruction::create_account(
        payer,
        merkle_tree,
        rent_lamports,
        account_size as u64,
        &SPL_ACCOUNT_COMPRESSION_ID,
    );

    let create_config = CreateTreeConfigBuilder::new()
        .tree_config(tree_config)
        .merkle_tree(*merkle_tree)
        .payer(*payer)
        .tree_creator(*payer)
        .log_wrapper(SPL_NOOP_ID)
        .compression_program(SPL_ACCOUNT_COMPRESSION_ID)
        .system_program(system_program::ID)
        .max_depth(max_depth)
        .max_buffer_size(max_buffer_size)
        .public(false)
        .instruction();

    vec![allocate, create_config]
}

/// Creates the collection NFT (mutable, 100% seller fee, as the console
/// always configured it). The mint keypair is the ephemeral signer.
pub fn create_collection_instruction(
    payer: &Pubkey,
    collection_mint: &Pubkey,
    name: &str,
    symbol: &str,
    metadata_uri: &str,
) -> Instruction {
    let (metadata, _) = Metadata::find_pda(collection_mint);
    let (master_edition, _) = MasterEdition::find_pda(collection_mint);

    CreateV1Builder::new()
        .metadata(metadata)
        .master_edition(Some(master_edition))
        .mint(*collection_mint, true)
        .authority(*payer)
        .payer(*payer)
        .update_authority(*payer, true)
        .is_mutable(true)
        .primary_sale_happened(false)
        .name(name.to_string())
        .symbol(symbol.to_string())
        .uri(metadata_uri.to_string())
        .seller_fee_basis_points(10_000)
        .token_standard(MetadataTokenStandard::NonFungible)
        .print_supply(PrintSupply::Zero)
        .instruction()
}

/// One mint instruction per leaf owner; the caller accumulates these into a
/// single composite transaction.
pub fn mint_to_collection_instruction(
    payer: &Pubkey,
    merkle_tree: &Pubkey,
    collection_mint: &Pubkey,
    leaf_owner: &Pubkey,
    name: &str,
    symbol: &str,
    metadata_uri: &str,
) -> Instruction {
    let (tree_config, _) = TreeConfig::find_pda(merkle_tree);
    let (collection_metadata, _) = Metadata::find_pda(collection_mint);
    let (collection_edition, _) = MasterEdition::find_pda(collection_mint);
    let (bubblegum_signer, _) =
        Pubkey::find_program_address(&[b"collection_cpi"], &mpl_bubblegum::ID);

    MintToCollectionV1Builder::new()
        .tree_config(tree_config)
        .leaf_owner(*leaf_owner)
        .leaf_delegate(*leaf_owner)
        .merkle_tree(*merkle_tree)
        .payer(*payer)
        .tree_creator_or_delegate(*payer)
        .collection_authority(*payer)
        .collection_mint(*collection_mint)
        .collection_metadata(collection_metadata)
        .collection_edition(collection_edition)
        .bubblegum_signer(bubblegum_signer)
        .log_wrapper(SPL_NOOP_ID)
        .compression_program(SPL_ACCOUNT_COMPRESSION_ID)
        .token_metadata_program(mpl_token_metadata::ID)
        .system_program(system_program::ID)
        .metadata(MetadataArgs {
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: metadata_uri.to_string(),
            seller_fee_basis_points: 10_000,
            primary_sale_happened: false,
            is_mutable: true,
            edition_nonce: None,
            token_standard: Some(TokenStandard::NonFungible),
            collection: Some(Collection {
                key: *collection_mint,
                verified: true,
            }),
            uses: None,
            token_program_version: TokenProgramVersion::Original,
            creators: vec![Creator {
                address: *payer,
                verified: true,
                share: 100,
            }],
        })
        .instruction()
}

/// Address of the tree's config PDA.
pub fn tree_config_pda(merkle_tree: &Pubkey) -> Pubkey {
    TreeConfig::find_pda(merkle_tree).0
}

/// Decodes a fetched tree-config account into its summary view.
pub fn tree_config_summary(
    address: &Pubkey,
    data: &[u8],
) -> Result<TreeConfigSummary, MinterError> {
    let config =
        TreeConfig::from_bytes(data).map_err(|err| MinterError::AccountDeserialization {
            address: address.to_string(),
            error: err.to_string(),
        })?;
    Ok(TreeConfigSummary {
        tree_creator: config.tree_creator,
        total_mint_capacity: config.total_mint_capacity,
        num_minted: config.num_minted,
        is_public: config.is_public,
    })
}

/// Signs a composite request over a freshly fetched blockhash.
pub fn build_signed_transaction(
    instructions: &[Instruction],
    payer: &Keypair,
    extra_signers: &[&Keypair],
    recent_blockhash: Hash,
) -> Transaction {
    let mut signers: Vec<&Keypair> = vec![payer];
    signers.extend_from_slice(extra_signers);
    Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &signers,
        recent_blockhash,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_account_size_matches_known_values() {
        // depth 14, buffer 64, no canopy: the well-known 31800-byte account.
        assert_eq!(merkle_tree_account_size(14, 64, 0), 31_800);
        // A canopy of depth 3 adds (2^4 - 2) * 32 bytes.
        assert_eq!(
            merkle_tree_account_size(14, 64, 3),
            31_800 + 14 * NODE_BYTES
        );
    }

    #[test]
    fn create_tree_allocates_then_initializes() {
        let payer = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let size = merkle_tree_account_size(14, 64, 0);
        let instructions = create_tree_instructions(&payer, &tree, 14, 64, size, 1_000_000);

        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].program_id, system_program::ID);
        assert_eq!(instructions[1].program_id, mpl_bubblegum::ID);
    }

    #[test]
    fn mint_instruction_targets_the_bubblegum_program() {
        let payer = Pubkey::new_unique();
        let ix = mint_to_collection_instruction(
            &payer,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            "NFT",
            "SYM",
            "https://example.com/meta.json",
        );
        assert_eq!(ix.program_id, mpl_bubblegum::ID);
    }

    #[test]
    fn composite_transaction_carries_every_instruction() {
        let payer = Keypair::new();
        let tree = Pubkey::new_unique();
        let collection = Pubkey::new_unique();
        let instructions: Vec<_> = (0..3)
            .map(|_| {
                mint_to_collection_instruction(
                    &payer.pubkey(),
                    &tree,
                    &collection,
                    &Pubkey::new_unique(),
                    "NFT",
                    "SYM",
                    "https://example.com/meta.json",
                )
            })
            .collect();
        let tx = build_signed_transaction(&instructions, &payer, &[], Hash::new_unique());
        assert_eq!(tx.message.instructions.len(), 3);
    }
}
