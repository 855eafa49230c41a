pub mod errors;
pub mod rpc_connection;
pub mod solana_rpc;
pub mod test_rpc;

pub use errors::RpcError;
pub use rpc_connection::{RetryConfig, RpcConnection};
pub use solana_rpc::{SolanaRpcConnection, SolanaRpcUrl};
pub use test_rpc::TestRpcConnection;
