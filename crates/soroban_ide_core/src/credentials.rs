//! Account credentials: keypair generation, friendbot funding and balances.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::BoxFuture;
use crate::error::Result;
use crate::network::Network;

/// A Stellar keypair as issued by `/generate-keypair`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// Public account id (`G...`).
    pub public_key: String,
    /// Signing seed (`S...`).
    pub secret_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Source of account credentials and balances.
pub trait CredentialProvider: Send + Sync {
    /// Ask the backend for a fresh keypair.
    fn generate_keypair(&self) -> BoxFuture<'_, Result<KeyPair>>;

    /// Ask friendbot to fund `public_key` on a test network.
    fn fund_account<'a>(&'a self, public_key: &'a str, network: Network)
    -> BoxFuture<'a, Result<()>>;

    /// Native balance formatted with 7 decimals, `"0"` for unknown accounts.
    fn balance<'a>(&'a self, public_key: &'a str, network: Network) -> BoxFuture<'a, Result<String>>;
}
