//! Target networks for deploy and invoke requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Connection details for a Stellar network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Display name
    pub name: &'static str,
    /// Soroban RPC endpoint
    pub rpc_url: &'static str,
    /// Network passphrase used for signing
    pub passphrase: &'static str,
    /// Friendbot endpoint for funding test accounts (test networks only)
    pub friendbot_url: Option<&'static str>,
    /// Horizon endpoint used for balance lookups
    pub horizon_url: &'static str,
}

/// Networks the backend can deploy to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Soroban preview network, reset periodically.
    #[default]
    Futurenet,
    /// Public test network.
    Testnet,
    /// Production network.
    Mainnet,
}

impl Network {
    /// Every network, in selection order.
    pub const ALL: [Network; 3] = [Network::Futurenet, Network::Testnet, Network::Mainnet];

    /// Identifier sent to the backend (`futurenet`, `testnet`, `mainnet`).
    pub fn id(&self) -> &'static str {
        match self {
            Network::Futurenet => "futurenet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Endpoints and passphrase of this network.
    pub fn config(&self) -> NetworkConfig {
        match self {
            Network::Futurenet => NetworkConfig {
                name: "Futurenet",
                rpc_url: "https://rpc-futurenet.stellar.org:443",
                passphrase: "Test SDF Future Network ; October 2022",
                friendbot_url: Some("https://friendbot-futurenet.stellar.org"),
                horizon_url: "https://horizon-futurenet.stellar.org",
            },
            Network::Testnet => NetworkConfig {
                name: "Testnet",
                rpc_url: "https://soroban-testnet.stellar.org:443",
                passphrase: "Test SDF Network ; September 2015",
                friendbot_url: Some("https://friendbot.stellar.org"),
                horizon_url: "https://horizon-testnet.stellar.org",
            },
            Network::Mainnet => NetworkConfig {
                name: "Mainnet",
                rpc_url: "https://mainnet.stellar.org:443",
                passphrase: "Public Global Stellar Network ; September 2015",
                friendbot_url: None,
                horizon_url: "https://horizon.stellar.org",
            },
        }
    }

    /// True if accounts on this network can be funded by friendbot.
    pub fn is_test_network(&self) -> bool {
        self.config().friendbot_url.is_some()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown network '{s}' (expected futurenet, testnet or mainnet)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network() {
        assert_eq!("futurenet".parse::<Network>(), Ok(Network::Futurenet));
        assert_eq!(" Testnet ".parse::<Network>(), Ok(Network::Testnet));
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_mainnet_has_no_friendbot() {
        assert!(!Network::Mainnet.is_test_network());
        assert!(Network::Futurenet.is_test_network());
        assert_eq!(Network::default(), Network::Futurenet);
    }

    #[test]
    fn test_serde_uses_backend_ids() {
        assert_eq!(
            serde_json::to_string(&Network::Testnet).unwrap(),
            "\"testnet\""
        );
    }
}
