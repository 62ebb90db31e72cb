//! In-memory backend for tests and offline sessions.
//!
//! Mirrors tree mutations into its own [`Workspace`], fakes a compiler that
//! returns a minimal wasm module, and lets tests script results or inject
//! one-shot failures per operation.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::{Value, json};

use super::types::{
    BuildInfo, CompileOutput, DeployReceipt, DeployRequest, InvokeOutcome, InvokeRequest, NodeAck,
};
use super::{BoxFuture, IdeBackend};
use crate::credentials::{CredentialProvider, KeyPair};
use crate::error::{IdeError, Result};
use crate::network::Network;
use crate::workspace::{Node, NodeKind, Workspace, path};

/// Smallest valid wasm module: magic number plus version 1.
const EMPTY_WASM: &[u8] = b"\0asm\x01\0\0\0";

const FUNDED_BALANCE: &str = "10000.0000000";

type Scripted<T> = RwLock<VecDeque<std::result::Result<T, String>>>;

/// Backend that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tree: RwLock<Workspace>,
    failures: RwLock<Vec<(String, String)>>,
    compile_results: Scripted<CompileOutput>,
    deploy_results: Scripted<DeployReceipt>,
    invoke_results: Scripted<InvokeOutcome>,
    balances: RwLock<IndexMap<String, String>>,
    calls: RwLock<Vec<String>>,
    counter: AtomicU64,
}

impl InMemoryBackend {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the backend already holding `tree`.
    pub fn with_tree(tree: Workspace) -> Self {
        Self {
            tree: RwLock::new(tree),
            ..Self::default()
        }
    }

    /// Snapshot of the mirrored tree.
    pub fn tree(&self) -> Workspace {
        self.tree.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Operations received so far, e.g. `"Create hello_world/src2"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make the next call of `operation` fail with `reason`.
    ///
    /// Operation names: `Create`, `Delete`, `Rename`, `Compilation`,
    /// `Deployment`, `Invocation`, `Funding`.
    pub fn fail_next(&self, operation: &str, reason: impl Into<String>) {
        self.failures
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((operation.to_string(), reason.into()));
    }

    /// Queue the result of the next compile.
    pub fn push_compile_result(&self, result: std::result::Result<CompileOutput, String>) {
        push(&self.compile_results, result);
    }

    /// Queue the result of the next deploy.
    pub fn push_deploy_result(&self, result: std::result::Result<DeployReceipt, String>) {
        push(&self.deploy_results, result);
    }

    /// Queue the result of the next invoke.
    pub fn push_invoke_result(&self, result: std::result::Result<InvokeOutcome, String>) {
        push(&self.invoke_results, result);
    }

    fn record(&self, operation: &str, detail: &str) -> Result<()> {
        self.calls
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("{operation} {detail}").trim_end().to_string());
        let mut failures = self.failures.write().unwrap_or_else(|e| e.into_inner());
        if let Some(index) = failures.iter().position(|(op, _)| op == operation) {
            let (_, reason) = failures.remove(index);
            log::debug!("[InMemoryBackend] injected failure for {}", operation);
            return Err(IdeError::remote(operation, reason));
        }
        Ok(())
    }

    fn mirror(
        &self,
        operation: &str,
        change: impl FnOnce(&Workspace) -> Result<Workspace>,
    ) -> Result<()> {
        let mut tree = self.tree.write().unwrap_or_else(|e| e.into_inner());
        let next = change(&tree).map_err(|e| IdeError::remote(operation, e.to_string()))?;
        *tree = next;
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn push<T>(queue: &Scripted<T>, result: std::result::Result<T, String>) {
    queue
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .push_back(result);
}

fn pop<T>(queue: &Scripted<T>, operation: &str) -> Option<Result<T>> {
    queue
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .pop_front()
        .map(|r| r.map_err(|reason| IdeError::remote(operation, reason)))
}

impl IdeBackend for InMemoryBackend {
    fn create_node<'a>(
        &'a self,
        parent_path: &'a str,
        name: &'a str,
        kind: NodeKind,
    ) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            let target = path::join(parent_path, name);
            self.record("Create", &target)?;
            self.mirror("Create", |tree| tree.create(parent_path, name, kind))?;
            Ok(NodeAck { path: target })
        })
    }

    fn delete_node<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            self.record("Delete", target)?;
            self.mirror("Delete", |tree| tree.delete(target))?;
            Ok(NodeAck {
                path: target.to_string(),
            })
        })
    }

    fn rename_node<'a>(
        &'a self,
        old_path: &'a str,
        new_name: &'a str,
    ) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            self.record("Rename", old_path)?;
            self.mirror("Rename", |tree| tree.rename(old_path, new_name))?;
            Ok(NodeAck {
                path: path::join(path::parent(old_path), new_name),
            })
        })
    }

    fn fetch_tree(&self) -> BoxFuture<'_, Result<Vec<Node>>> {
        Box::pin(async move {
            let tree = self.tree.read().unwrap_or_else(|e| e.into_inner());
            Ok(tree.roots().iter().map(|n| n.as_ref().clone()).collect())
        })
    }

    fn compile<'a>(
        &'a self,
        files: &'a IndexMap<String, String>,
    ) -> BoxFuture<'a, Result<CompileOutput>> {
        Box::pin(async move {
            self.record("Compilation", &format!("{} files", files.len()))?;
            if let Some(scripted) = pop(&self.compile_results, "Compilation") {
                return scripted;
            }
            Ok(CompileOutput {
                wasm_base64: Some(STANDARD.encode(EMPTY_WASM)),
                wasm_size: Some(EMPTY_WASM.len() as u64),
                xdr_base64: None,
                build_info: BuildInfo::default(),
            })
        })
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BoxFuture<'a, Result<DeployReceipt>> {
        Box::pin(async move {
            self.record("Deployment", request.network.id())?;
            if let Some(scripted) = pop(&self.deploy_results, "Deployment") {
                return scripted;
            }
            if request.wasm_base64.is_empty() {
                return Err(IdeError::remote("Deployment", "no wasm provided"));
            }
            let id = self.next_id();
            Ok(DeployReceipt {
                contract_id: format!("C{:055}", id),
                transaction_hash: format!("{:064x}", id),
                wasm_hash: format!("{:064x}", request.wasm_base64.len()),
                cost: IndexMap::from([
                    ("cpuInsns".to_string(), json!("0")),
                    ("memBytes".to_string(), json!("0")),
                ]),
            })
        })
    }

    fn invoke<'a>(&'a self, request: &'a InvokeRequest) -> BoxFuture<'a, Result<InvokeOutcome>> {
        Box::pin(async move {
            self.record("Invocation", &request.function_name)?;
            if let Some(scripted) = pop(&self.invoke_results, "Invocation") {
                return scripted;
            }
            Ok(InvokeOutcome {
                result: Value::Array(request.args.clone()),
                transaction_hash: format!("{:064x}", self.next_id()),
                cost: None,
                logs: Vec::new(),
            })
        })
    }
}

impl CredentialProvider for InMemoryBackend {
    fn generate_keypair(&self) -> BoxFuture<'_, Result<KeyPair>> {
        Box::pin(async move {
            let id = self.next_id();
            Ok(KeyPair {
                public_key: format!("G{:055}", id),
                secret_key: format!("S{:055}", id),
            })
        })
    }

    fn fund_account<'a>(
        &'a self,
        public_key: &'a str,
        network: Network,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record("Funding", public_key)?;
            if !network.is_test_network() {
                return Err(IdeError::remote(
                    "Funding",
                    format!("friendbot is not available on {network}"),
                ));
            }
            self.balances
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(public_key.to_string(), FUNDED_BALANCE.to_string());
            Ok(())
        })
    }

    fn balance<'a>(&'a self, public_key: &'a str, _network: Network) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            Ok(self
                .balances
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(public_key)
                .cloned()
                .unwrap_or_else(|| "0".to_string()))
        })
    }
}
