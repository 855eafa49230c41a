use std::{sync::Arc, time::Duration};

use cnft_client::{RpcConnection, TestRpcConnection, TestUploader};
use cnft_minter::{
    AssetContext, AssetKind, AssetReference, Minter, MinterSession, MinterState, NftMetadata,
    RecordingNotifier, SessionCell, TreeParams,
};
use solana_sdk::{account::Account, pubkey::Pubkey, signature::Keypair};

struct Harness {
    minter: Minter<TestRpcConnection, TestUploader>,
    session: Arc<SessionCell<TestRpcConnection, TestUploader>>,
    state: Arc<MinterState>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new() -> Self {
        Self::with_uploader(TestUploader::default())
    }

    fn with_uploader(uploader: TestUploader) -> Self {
        let session = Arc::new(SessionCell::new());
        session.install(MinterSession {
            rpc: TestRpcConnection::new("http://localhost:8899", None),
            payer: Keypair::new(),
            uploader,
        });
        Self::around(session)
    }

    fn without_session() -> Self {
        Self::around(Arc::new(SessionCell::new()))
    }

    fn around(session: Arc<SessionCell<TestRpcConnection, TestUploader>>) -> Self {
        let state = Arc::new(MinterState::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let minter = Minter::new(session.clone(), state.clone(), notifier.clone());
        Self {
            minter,
            session,
            state,
            notifier,
        }
    }

    fn rpc(&self) -> Arc<MinterSession<TestRpcConnection, TestUploader>> {
        self.session.load().expect("session installed")
    }

    fn default_tree_params() -> TreeParams {
        TreeParams {
            max_depth: "14".to_string(),
            max_buffer_size: "64".to_string(),
            canopy_depth: "0".to_string(),
        }
    }
}

#[tokio::test]
async fn airdrop_converts_sol_to_lamports() {
    let h = Harness::new();

    let signature = h.minter.request_airdrop("1.5").await;
    assert!(signature.is_some());

    let session = h.rpc();
    let airdrops = session.rpc.airdrops();
    assert_eq!(airdrops.len(), 1);
    assert_eq!(airdrops[0], (session.identity(), 1_500_000_000));

    let successes = h.notifier.successes();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].contains("Transaction hash:"));
}

#[tokio::test]
async fn airdrop_rejects_bad_amounts_before_the_network() {
    let h = Harness::new();

    for amount in ["sol", "0", "-2", ""] {
        assert!(h.minter.request_airdrop(amount).await.is_none());
    }

    assert_eq!(h.rpc().rpc.network_calls(), 0);
    assert_eq!(h.notifier.errors().len(), 4);
    assert!(h.notifier.successes().is_empty());
}

#[tokio::test]
async fn operations_without_a_session_touch_nothing() {
    let h = Harness::without_session();

    assert!(h.minter.request_airdrop("1").await.is_none());
    assert!(h.minter.create_tree(&Harness::default_tree_params()).await.is_none());
    assert!(h
        .minter
        .create_collection("Col", "SYM", "https://storage.test/col.json")
        .await
        .is_none());
    assert!(h
        .minter
        .mint_batch(
            "NFT",
            "SYM",
            "https://storage.test/meta.json",
            &[Pubkey::new_unique()],
        )
        .await
        .is_none());
    assert!(h
        .minter
        .upload_image(AssetContext::Nft, vec![1, 2, 3], "a.png", "image/png")
        .await
        .is_none());

    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 5);
    assert!(errors.iter().all(|e| e.contains("connect a wallet")));
    assert_eq!(h.state.tree_address(), None);
    assert_eq!(h.state.collection_address(), None);
}

#[tokio::test]
async fn create_tree_allocates_and_initializes_in_one_transaction() {
    let h = Harness::new();

    let signature = h.minter.create_tree(&Harness::default_tree_params()).await;
    assert!(signature.is_some());
    assert!(h.state.tree_address().is_some());

    let sent = h.rpc().rpc.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.instructions.len(), 2);
}

#[tokio::test]
async fn create_tree_rejects_non_numeric_params_before_the_network() {
    let h = Harness::new();

    let params = TreeParams {
        max_depth: "abc".to_string(),
        max_buffer_size: "64".to_string(),
        canopy_depth: "0".to_string(),
    };
    assert!(h.minter.create_tree(&params).await.is_none());

    assert_eq!(h.rpc().rpc.network_calls(), 0);
    assert_eq!(h.state.tree_address(), None);
    assert!(h.notifier.errors()[0].contains("max_depth"));
}

#[tokio::test]
async fn failed_send_leaves_the_store_untouched() {
    let h = Harness::new();
    h.rpc().rpc.fail_sends(true);

    assert!(h.minter.create_tree(&Harness::default_tree_params()).await.is_none());
    assert_eq!(h.state.tree_address(), None);

    assert!(h
        .minter
        .create_collection("Col", "SYM", "https://storage.test/col.json")
        .await
        .is_none());
    assert_eq!(h.state.collection_address(), None);

    assert_eq!(h.notifier.errors().len(), 2);
    assert!(h.notifier.successes().is_empty());
}

#[tokio::test]
async fn create_collection_stores_the_mint_address() {
    let h = Harness::new();

    let signature = h
        .minter
        .create_collection("Col", "SYM", "https://storage.test/col.json")
        .await;
    assert!(signature.is_some());
    assert!(h.state.collection_address().is_some());

    let sent = h.rpc().rpc.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.instructions.len(), 1);
}

#[tokio::test]
async fn create_collection_requires_a_metadata_uri() {
    let h = Harness::new();

    assert!(h.minter.create_collection("Col", "SYM", "  ").await.is_none());
    assert_eq!(h.rpc().rpc.network_calls(), 0);
    assert!(h.notifier.errors()[0].contains("metadata_uri"));
}

#[tokio::test]
async fn mint_batch_builds_one_composite_transaction() {
    let h = Harness::new();
    h.state.set_tree_address(Some(Pubkey::new_unique()));
    h.state.set_collection_address(Some(Pubkey::new_unique()));

    let recipients = [
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    ];
    let signature = h
        .minter
        .mint_batch("NFT", "SYM", "https://storage.test/meta.json", &recipients)
        .await;
    assert!(signature.is_some());

    // One instruction per recipient, all in a single submission.
    let sent = h.rpc().rpc.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.instructions.len(), 3);
}

#[tokio::test]
async fn mint_batch_aborts_silently_when_addresses_are_unset() {
    let h = Harness::new();
    h.state.set_collection_address(Some(Pubkey::new_unique()));

    let signature = h
        .minter
        .mint_batch(
            "NFT",
            "SYM",
            "https://storage.test/meta.json",
            &[Pubkey::new_unique()],
        )
        .await;
    assert!(signature.is_none());

    // No submission and no notification of either kind.
    assert_eq!(h.rpc().rpc.network_calls(), 0);
    assert!(h.notifier.successes().is_empty());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn gate_blocks_a_second_operation_mid_flight() {
    let h = Harness::new();
    h.rpc().rpc.set_send_delay(Some(Duration::from_millis(50)));

    let params = Harness::default_tree_params();
    let (first, second) = tokio::join!(h.minter.create_tree(&params), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.minter.transaction_in_flight());
        h.minter.request_airdrop("1").await
    });

    assert!(first.is_some());
    assert!(second.is_none());
    assert!(h
        .notifier
        .errors()
        .iter()
        .any(|e| e.contains("already in flight")));

    // Released after completion; the next operation goes through.
    assert!(!h.minter.transaction_in_flight());
    assert!(h.minter.request_airdrop("1").await.is_some());
}

#[tokio::test]
async fn uploads_bypass_the_gate() {
    let h = Harness::new();
    h.rpc().rpc.set_send_delay(Some(Duration::from_millis(50)));

    let params = Harness::default_tree_params();
    let (tree, url) = tokio::join!(h.minter.create_tree(&params), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.minter
            .upload_image(AssetContext::Nft, vec![1, 2, 3], "pfp.png", "image/png")
            .await
    });

    assert!(tree.is_some());
    assert!(url.is_some());
}

#[tokio::test]
async fn upload_image_stores_the_reference() {
    let h = Harness::new();

    let url = h
        .minter
        .upload_image(AssetContext::Nft, vec![1, 2, 3], "pfp.png", "image/png")
        .await;
    assert_eq!(url.as_deref(), Some("https://storage.test/pfp.png"));
    assert_eq!(
        h.state.asset(AssetContext::Nft, AssetKind::Image),
        Some(AssetReference {
            url: "https://storage.test/pfp.png".to_string(),
            mime_type: Some("image/png".to_string()),
        })
    );
    assert_eq!(h.state.asset(AssetContext::Collection, AssetKind::Image), None);
}

#[tokio::test]
async fn upload_failure_leaves_the_store_untouched() {
    let h = Harness::with_uploader(TestUploader::failing());

    let url = h
        .minter
        .upload_image(AssetContext::Collection, vec![1], "logo.png", "image/png")
        .await;
    assert!(url.is_none());
    assert_eq!(h.state.asset(AssetContext::Collection, AssetKind::Image), None);

    let metadata = NftMetadata::new("Col", "https://storage.test/logo.png");
    let url = h.minter.upload_metadata(AssetContext::Collection, &metadata).await;
    assert!(url.is_none());
    assert_eq!(
        h.state.asset(AssetContext::Collection, AssetKind::Metadata),
        None
    );

    assert_eq!(h.notifier.errors().len(), 2);
    assert!(h.notifier.successes().is_empty());
}

#[tokio::test]
async fn upload_metadata_stores_the_reference() {
    let h = Harness::new();

    let metadata = NftMetadata::new("Cool", "https://storage.test/pfp.png")
        .with_description("A cool cNFT");
    let url = h.minter.upload_metadata(AssetContext::Nft, &metadata).await;
    assert_eq!(url.as_deref(), Some("https://storage.test/Cool.json"));
    assert_eq!(
        h.state
            .asset(AssetContext::Nft, AssetKind::Metadata)
            .map(|a| a.url),
        Some("https://storage.test/Cool.json".to_string())
    );
}

#[tokio::test]
async fn manual_addresses_round_trip_through_validation() {
    let h = Harness::new();

    let tree = Pubkey::new_unique();
    assert!(h.minter.set_tree_address(&tree.to_string()));
    assert_eq!(h.state.tree_address(), Some(tree));

    assert!(!h.minter.set_collection_address("not-a-pubkey"));
    assert_eq!(h.state.collection_address(), None);
    assert!(h.notifier.errors()[0].contains("Invalid address"));
}

#[tokio::test]
async fn fetch_tree_caches_the_account_summary() {
    let h = Harness::new();

    let tree = Pubkey::new_unique();
    h.rpc().rpc.set_account(
        tree,
        Account {
            lamports: 31_800_000,
            data: vec![0; 31_800],
            owner: Pubkey::new_unique(),
            executable: false,
            rent_epoch: 0,
        },
    );
    h.state.set_tree_address(Some(tree));

    let summary = h.minter.fetch_tree().await.expect("account exists");
    assert_eq!(summary.lamports, 31_800_000);
    assert_eq!(summary.data_len, 31_800);
    assert_eq!(h.state.tree_account(), Some(summary));
}

#[tokio::test]
async fn fetch_tree_reports_missing_accounts() {
    let h = Harness::new();
    h.state.set_tree_address(Some(Pubkey::new_unique()));

    assert!(h.minter.fetch_tree().await.is_none());
    assert_eq!(h.state.tree_account(), None);
    assert!(h.notifier.errors()[0].contains("does not exist"));
}

#[tokio::test]
async fn fetch_tree_requires_a_stored_address() {
    let h = Harness::new();

    assert!(h.minter.fetch_tree().await.is_none());
    assert!(h.minter.fetch_tree_config().await.is_none());
    assert_eq!(h.rpc().rpc.network_calls(), 0);
    assert!(h
        .notifier
        .errors()
        .iter()
        .all(|e| e.contains("tree_address")));
}
