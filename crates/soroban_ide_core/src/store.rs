//! Session store for accounts and recent deployments.
//!
//! The store is an explicit object with a defined lifecycle: it is loaded (or
//! started empty) when a session begins and written back to disk after every
//! mutation. Callers pass it to whatever needs it; there is no global.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::DeployReceipt;
use crate::credentials::KeyPair;
use crate::error::{IdeError, Result};
use crate::network::Network;

/// Number of deployments kept, newest first.
pub const MAX_DEPLOYMENTS: usize = 10;

/// A funded (or fundable) account the IDE can sign with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Display name, e.g. `Account 1`.
    pub name: String,
    /// Public account id.
    pub public_key: String,
    /// Signing seed.
    pub secret_key: String,
    /// Last known native balance, as reported by the ledger.
    pub balance: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("balance", &self.balance)
            .finish()
    }
}

/// A deployment remembered for quick invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// Backend receipt of the deployment.
    #[serde(flatten)]
    pub receipt: DeployReceipt,
    /// When the deployment was recorded.
    pub timestamp: DateTime<Utc>,
    /// Account that signed it.
    pub account_public_key: String,
    /// Network it was deployed to.
    #[serde(default)]
    pub network: Network,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    deployments: Vec<DeploymentRecord>,
}

/// Accounts and deployments for one IDE session.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// `None` for a store that is never written to disk.
    path: Option<PathBuf>,
    data: SessionData,
}

impl SessionStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the store at `path`, or start empty if the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error, so a later flush
    /// never overwrites saved keys.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            log::debug!("[SessionStore] no store at {}, starting empty", path.display());
            SessionData::default()
        };
        Ok(Self {
            path: Some(path),
            data,
        })
    }

    /// Backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Accounts in creation order.
    pub fn accounts(&self) -> &[Account] {
        &self.data.accounts
    }

    /// Account with the given public key.
    pub fn account(&self, public_key: &str) -> Option<&Account> {
        self.data
            .accounts
            .iter()
            .find(|a| a.public_key == public_key)
    }

    /// The default account for signing.
    pub fn first_account(&self) -> Option<&Account> {
        self.data.accounts.first()
    }

    /// Resolve `public_key`, or the first account when `None`.
    pub fn resolve_account(&self, public_key: Option<&str>) -> Result<&Account> {
        match public_key {
            Some(key) => self.account(key),
            None => self.first_account(),
        }
        .ok_or(IdeError::NoAccount)
    }

    /// Add a keypair as `"Account N"` with a zero balance.
    pub fn add_account(&mut self, keypair: KeyPair) -> Result<&Account> {
        if self.account(&keypair.public_key).is_some() {
            return Err(IdeError::Conflict(keypair.public_key));
        }
        let account = Account {
            name: format!("Account {}", self.data.accounts.len() + 1),
            public_key: keypair.public_key,
            secret_key: keypair.secret_key,
            balance: "0".to_string(),
        };
        log::info!("[SessionStore] added {} ({})", account.name, account.public_key);
        self.data.accounts.push(account);
        self.flush()?;
        Ok(&self.data.accounts[self.data.accounts.len() - 1])
    }

    /// Update the cached balance of an account and persist.
    pub fn set_balance(&mut self, public_key: &str, balance: impl Into<String>) -> Result<()> {
        let account = self
            .data
            .accounts
            .iter_mut()
            .find(|a| a.public_key == public_key)
            .ok_or_else(|| IdeError::NotFound(public_key.to_string()))?;
        account.balance = balance.into();
        self.flush()
    }

    /// Remove an account and persist, returning it.
    pub fn remove_account(&mut self, public_key: &str) -> Result<Account> {
        let index = self
            .data
            .accounts
            .iter()
            .position(|a| a.public_key == public_key)
            .ok_or_else(|| IdeError::NotFound(public_key.to_string()))?;
        let removed = self.data.accounts.remove(index);
        self.flush()?;
        Ok(removed)
    }

    /// Deployments, newest first.
    pub fn deployments(&self) -> &[DeploymentRecord] {
        &self.data.deployments
    }

    /// Most recent deployment, if any.
    pub fn latest_deployment(&self) -> Option<&DeploymentRecord> {
        self.data.deployments.first()
    }

    /// Remember a deployment, keeping only the [`MAX_DEPLOYMENTS`] newest.
    pub fn record_deployment(
        &mut self,
        receipt: DeployReceipt,
        account_public_key: &str,
        network: Network,
    ) -> Result<&DeploymentRecord> {
        self.data.deployments.insert(
            0,
            DeploymentRecord {
                receipt,
                timestamp: Utc::now(),
                account_public_key: account_public_key.to_string(),
                network,
            },
        );
        self.data.deployments.truncate(MAX_DEPLOYMENTS);
        self.flush()?;
        Ok(&self.data.deployments[0])
    }

    /// Write the store to disk. No-op for in-memory stores.
    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, contents).map_err(|source| IdeError::FileWrite {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(n: u32) -> KeyPair {
        KeyPair {
            public_key: format!("GPUB{n}"),
            secret_key: format!("SSEC{n}"),
        }
    }

    fn receipt(n: u32) -> DeployReceipt {
        DeployReceipt {
            contract_id: format!("C{n}"),
            transaction_hash: format!("tx{n}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_accounts_are_numbered() {
        let mut store = SessionStore::in_memory();
        assert_eq!(store.add_account(keypair(1)).unwrap().name, "Account 1");
        let second = store.add_account(keypair(2)).unwrap();
        assert_eq!(second.name, "Account 2");
        assert_eq!(second.balance, "0");
        assert_eq!(store.first_account().unwrap().public_key, "GPUB1");
    }

    #[test]
    fn test_duplicate_account_is_conflict() {
        let mut store = SessionStore::in_memory();
        store.add_account(keypair(1)).unwrap();
        assert!(matches!(
            store.add_account(keypair(1)),
            Err(IdeError::Conflict(_))
        ));
    }

    #[test]
    fn test_resolve_account() {
        let mut store = SessionStore::in_memory();
        assert!(matches!(store.resolve_account(None), Err(IdeError::NoAccount)));
        store.add_account(keypair(1)).unwrap();
        store.add_account(keypair(2)).unwrap();
        assert_eq!(store.resolve_account(None).unwrap().public_key, "GPUB1");
        assert_eq!(store.resolve_account(Some("GPUB2")).unwrap().name, "Account 2");
        assert!(store.resolve_account(Some("GNOPE")).is_err());
    }

    #[test]
    fn test_deployments_capped_newest_first() {
        let mut store = SessionStore::in_memory();
        for n in 1..=12 {
            store
                .record_deployment(receipt(n), "GPUB1", Network::Futurenet)
                .unwrap();
        }
        assert_eq!(store.deployments().len(), MAX_DEPLOYMENTS);
        assert_eq!(store.latest_deployment().unwrap().receipt.contract_id, "C12");
        assert_eq!(store.deployments().last().unwrap().receipt.contract_id, "C3");
    }

    #[test]
    fn test_every_mutation_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let mut store = SessionStore::load_or_empty(&path).unwrap();
        assert!(store.accounts().is_empty());
        store.add_account(keypair(1)).unwrap();
        store.set_balance("GPUB1", "10000.0000000").unwrap();
        store
            .record_deployment(receipt(1), "GPUB1", Network::Testnet)
            .unwrap();

        let reloaded = SessionStore::load_or_empty(&path).unwrap();
        assert_eq!(reloaded.accounts()[0].balance, "10000.0000000");
        assert_eq!(reloaded.deployments()[0].network, Network::Testnet);
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SessionStore::load_or_empty(&path),
            Err(IdeError::Json(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut store = SessionStore::in_memory();
        store.add_account(keypair(7)).unwrap();
        let debug = format!("{:?}", store);
        assert!(debug.contains("GPUB7"));
        assert!(!debug.contains("SSEC7"));
    }

    #[test]
    fn test_deployment_record_wire_format() {
        let mut store = SessionStore::in_memory();
        let record = store
            .record_deployment(receipt(1), "GPUB1", Network::Futurenet)
            .unwrap();
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["contractId"], "C1");
        assert_eq!(json["accountPublicKey"], "GPUB1");
    }
}
