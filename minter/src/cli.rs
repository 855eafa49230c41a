use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::{MinterConfig, RpcConfig, StorageConfig},
    state::AssetContext,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "MINTER_RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    #[arg(long, env = "MINTER_CLUSTER", default_value = "devnet", global = true)]
    pub cluster: String,

    /// Path to the payer keypair file.
    #[arg(long, env = "MINTER_PAYER", default_value = "id.json", global = true)]
    pub payer: PathBuf,

    #[arg(
        long,
        env = "MINTER_STORAGE_URL",
        default_value = "https://node1.irys.xyz",
        global = true
    )]
    pub storage_url: String,

    #[arg(long, env = "MINTER_STORAGE_TOKEN", global = true)]
    pub storage_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a devnet airdrop for the wallet identity.
    Airdrop(AirdropArgs),
    /// Create a new merkle tree for compressed NFTs.
    CreateTree(CreateTreeArgs),
    /// Create the collection NFT.
    CreateCollection(CreateCollectionArgs),
    /// Mint one cNFT per recipient into the stored collection.
    Mint(MintArgs),
    /// Upload an image file and print its gateway URL.
    UploadImage(UploadImageArgs),
    /// Upload a metadata document and print its gateway URL.
    UploadMetadata(UploadMetadataArgs),
    /// Fetch the raw merkle tree account.
    FetchTree(TreeAddressArgs),
    /// Fetch and decode the tree's config account.
    FetchTreeConfig(TreeAddressArgs),
    /// Print the wallet's balance in lamports.
    Balance,
}

#[derive(Parser, Clone, Debug)]
pub struct AirdropArgs {
    /// Amount in SOL. Kept as text so validation happens in one place.
    #[arg(long)]
    pub amount: String,
}

#[derive(Parser, Clone, Debug)]
pub struct CreateTreeArgs {
    #[arg(long, default_value = "14")]
    pub max_depth: String,

    #[arg(long, default_value = "64")]
    pub max_buffer_size: String,

    #[arg(long, default_value = "0")]
    pub canopy_depth: String,
}

#[derive(Parser, Clone, Debug)]
pub struct CreateCollectionArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub symbol: String,

    #[arg(long)]
    pub metadata_uri: String,
}

#[derive(Parser, Clone, Debug)]
pub struct MintArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub symbol: String,

    #[arg(long)]
    pub metadata_uri: String,

    /// Repeatable; one cNFT is minted per recipient.
    #[arg(long = "recipient", required = true)]
    pub recipients: Vec<String>,

    #[arg(long)]
    pub tree: String,

    #[arg(long)]
    pub collection: String,
}

#[derive(Parser, Clone, Debug)]
pub struct UploadImageArgs {
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long, default_value = "image/png")]
    pub mime_type: String,

    #[arg(long, value_enum, default_value = "nft")]
    pub context: ContextArg,
}

#[derive(Parser, Clone, Debug)]
pub struct UploadMetadataArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub image_url: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum, default_value = "nft")]
    pub context: ContextArg,
}

#[derive(Parser, Clone, Debug)]
pub struct TreeAddressArgs {
    #[arg(long)]
    pub tree: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ContextArg {
    Collection,
    Nft,
}

impl From<ContextArg> for AssetContext {
    fn from(value: ContextArg) -> Self {
        match value {
            ContextArg::Collection => AssetContext::Collection,
            ContextArg::Nft => AssetContext::Nft,
        }
    }
}

impl Cli {
    pub fn config(&self) -> MinterConfig {
        MinterConfig {
            rpc: RpcConfig {
                cluster: self.cluster.clone(),
                url_override: self.rpc_url.clone(),
            },
            storage: StorageConfig {
                endpoint: self.storage_url.clone(),
                api_token: self.storage_token.clone(),
            },
            keypair_path: self.payer.clone(),
        }
    }
}
