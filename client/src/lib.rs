pub mod rpc;
pub mod uploader;

pub use rpc::{
    RetryConfig, RpcConnection, RpcError, SolanaRpcConnection, SolanaRpcUrl, TestRpcConnection,
};
pub use uploader::{AssetUploader, HttpStorageUploader, TestUploader, UploadError};
