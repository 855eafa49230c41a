use std::{fs, process::ExitCode, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context};
use clap::Parser;
use cnft_client::{HttpStorageUploader, RpcConnection, SolanaRpcConnection};
use cnft_minter::{
    cli::{Cli, Commands},
    telemetry::setup_telemetry,
    Minter, MinterState, NftMetadata, SessionCell, TracingNotifier, TreeParams,
};
use solana_sdk::{pubkey::Pubkey, signature::read_keypair_file};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    setup_telemetry();
    let cli = Cli::parse();
    let config = cli.config();

    let payer = read_keypair_file(&config.keypair_path).map_err(|err| {
        anyhow!(
            "failed to read keypair {}: {err}",
            config.keypair_path.display()
        )
    })?;
    let endpoint = config.rpc.endpoint()?;
    let uploader = HttpStorageUploader::new(
        config.storage.endpoint.clone(),
        config.storage.api_token.clone(),
    );

    let session: Arc<SessionCell<SolanaRpcConnection, HttpStorageUploader>> =
        Arc::new(SessionCell::new());
    session.rebuild(&endpoint, payer, uploader);

    let state = Arc::new(MinterState::default());
    let minter = Minter::new(session.clone(), state, Arc::new(TracingNotifier));

    let ok = match cli.command {
        Commands::Airdrop(args) => minter.request_airdrop(&args.amount).await.is_some(),
        Commands::CreateTree(args) => {
            let params = TreeParams {
                max_depth: args.max_depth,
                max_buffer_size: args.max_buffer_size,
                canopy_depth: args.canopy_depth,
            };
            match minter.create_tree(&params).await {
                Some(_) => {
                    if let Some(tree) = minter.state().tree_address() {
                        info!("merkle tree: {tree}");
                    }
                    true
                }
                None => false,
            }
        }
        Commands::CreateCollection(args) => {
            match minter
                .create_collection(&args.name, &args.symbol, &args.metadata_uri)
                .await
            {
                Some(_) => {
                    if let Some(collection) = minter.state().collection_address() {
                        info!("collection: {collection}");
                    }
                    true
                }
                None => false,
            }
        }
        Commands::Mint(args) => {
            let recipients = args
                .recipients
                .iter()
                .map(|address| {
                    Pubkey::from_str(address)
                        .map_err(|_| anyhow!("invalid recipient address: {address}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            minter.set_tree_address(&args.tree)
                && minter.set_collection_address(&args.collection)
                && minter
                    .mint_batch(&args.name, &args.symbol, &args.metadata_uri, &recipients)
                    .await
                    .is_some()
        }
        Commands::UploadImage(args) => {
            let bytes = fs::read(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let file_name = args
                .file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("image")
                .to_string();
            minter
                .upload_image(args.context.into(), bytes, &file_name, &args.mime_type)
                .await
                .is_some()
        }
        Commands::UploadMetadata(args) => {
            let mut metadata = NftMetadata::new(&args.name, &args.image_url)
                .with_file(&args.image_url, "image/png");
            if let Some(description) = &args.description {
                metadata = metadata.with_description(description);
            }
            minter
                .upload_metadata(args.context.into(), &metadata)
                .await
                .is_some()
        }
        Commands::FetchTree(args) => {
            minter.set_tree_address(&args.tree) && minter.fetch_tree().await.is_some()
        }
        Commands::FetchTreeConfig(args) => {
            minter.set_tree_address(&args.tree) && minter.fetch_tree_config().await.is_some()
        }
        Commands::Balance => match session.load() {
            Some(session) => {
                let balance = session.rpc.get_balance(&session.identity()).await?;
                info!("balance: {balance} lamports");
                true
            }
            None => false,
        },
    };

    if ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
