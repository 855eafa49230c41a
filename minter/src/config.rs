use std::path::PathBuf;

use cnft_client::SolanaRpcUrl;

use crate::errors::MinterError;

/// RPC endpoint selection. An explicit URL override wins over the named
/// cluster.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub cluster: String,
    pub url_override: Option<String>,
}

impl RpcConfig {
    pub fn endpoint(&self) -> Result<String, MinterError> {
        if let Some(url) = &self.url_override {
            return Ok(url.clone());
        }
        let url = match self.cluster.to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => SolanaRpcUrl::MainnetBeta,
            "devnet" => SolanaRpcUrl::Devnet,
            "testnet" => SolanaRpcUrl::Testnet,
            "localnet" | "localhost" => SolanaRpcUrl::Localnet,
            other => {
                return Err(MinterError::Configuration(format!(
                    "unknown cluster: {other}"
                )))
            }
        };
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MinterConfig {
    pub rpc: RpcConfig,
    pub storage: StorageConfig,
    pub keypair_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_cluster() {
        let config = RpcConfig {
            cluster: "devnet".to_string(),
            url_override: Some("http://localhost:8899".to_string()),
        };
        assert_eq!(config.endpoint().unwrap(), "http://localhost:8899");
    }

    #[test]
    fn named_clusters_resolve_to_public_endpoints() {
        let config = RpcConfig {
            cluster: "devnet".to_string(),
            url_override: None,
        };
        assert_eq!(config.endpoint().unwrap(), "https://api.devnet.solana.com");

        let config = RpcConfig {
            cluster: "Mainnet-Beta".to_string(),
            url_override: None,
        };
        assert_eq!(
            config.endpoint().unwrap(),
            "https://api.mainnet-beta.solana.com"
        );
    }

    #[test]
    fn unknown_cluster_is_a_configuration_error() {
        let config = RpcConfig {
            cluster: "moonnet".to_string(),
            url_override: None,
        };
        assert!(matches!(
            config.endpoint(),
            Err(MinterError::Configuration(_))
        ));
    }
}
