//! Compile, deploy and invoke flows.
//!
//! Each flow validates what it can locally, then calls the backend. Deploys
//! are remembered in the [`SessionStore`] so the contract can be invoked
//! later without copying its id around.

use serde_json::Value;

use crate::backend::{
    CompileOutput, DeployReceipt, DeployRequest, IdeBackend, InvokeOutcome, InvokeRequest,
};
use crate::error::{IdeError, Result};
use crate::network::Network;
use crate::store::SessionStore;
use crate::workspace::Workspace;

/// Parse the argument text typed for a contract call.
///
/// Empty input yields no arguments. Otherwise the text is read as the body
/// of a JSON array (`"world", 42` → `["world", 42]`); if that fails it is
/// split on commas into trimmed strings.
pub fn parse_invoke_args(text: &str) -> Vec<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Value>>(&format!("[{text}]")) {
        Ok(args) => args,
        Err(_) => text
            .split(',')
            .map(|arg| Value::String(arg.trim().to_string()))
            .collect(),
    }
}

/// Compile every file of `workspace`.
pub async fn compile<B: IdeBackend + ?Sized>(
    backend: &B,
    workspace: &Workspace,
) -> Result<CompileOutput> {
    let files = workspace.file_map();
    if files.is_empty() {
        return Err(IdeError::EmptyProject);
    }
    log::info!("[Pipeline] compiling {} files", files.len());
    let output = backend.compile(&files).await?;
    if output.has_errors() {
        log::warn!(
            "[Pipeline] build reported {} errors",
            output.build_info.errors.len()
        );
    }
    Ok(output)
}

/// Result of [`deploy`].
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Compilation that produced the deployed artifact.
    pub build: CompileOutput,
    /// Receipt returned by the backend.
    pub receipt: DeployReceipt,
    /// Account that signed the deployment.
    pub account_public_key: String,
}

/// Compile `workspace` and deploy the artifact, signing with `account` (or
/// the first stored account).
pub async fn deploy<B: IdeBackend + ?Sized>(
    backend: &B,
    store: &mut SessionStore,
    workspace: &Workspace,
    account: Option<&str>,
    network: Network,
) -> Result<DeployOutcome> {
    let signer = store.resolve_account(account)?;
    let account_public_key = signer.public_key.clone();
    let secret_key = signer.secret_key.clone();

    let build = compile(backend, workspace).await?;
    let wasm_base64 = build
        .wasm_base64
        .clone()
        .filter(|wasm| !wasm.is_empty())
        .ok_or(IdeError::MissingArtifact)?;

    log::info!("[Pipeline] deploying to {} as {}", network, account_public_key);
    let request = DeployRequest {
        wasm_base64,
        secret_key,
        network,
    };
    let receipt = backend.deploy(&request).await?;
    log::info!("[Pipeline] deployed contract {}", receipt.contract_id);

    store.record_deployment(receipt.clone(), &account_public_key, network)?;
    Ok(DeployOutcome {
        build,
        receipt,
        account_public_key,
    })
}

/// Call `function` on a deployed contract.
pub async fn invoke<B: IdeBackend + ?Sized>(
    backend: &B,
    store: &SessionStore,
    contract_id: &str,
    function: &str,
    raw_args: &str,
    account: Option<&str>,
    network: Network,
) -> Result<InvokeOutcome> {
    if contract_id.trim().is_empty() {
        return Err(IdeError::MissingField("contract id"));
    }
    if function.trim().is_empty() {
        return Err(IdeError::MissingField("function name"));
    }
    let signer = store.resolve_account(account)?;
    let request = InvokeRequest {
        contract_id: contract_id.trim().to_string(),
        function_name: function.trim().to_string(),
        args: parse_invoke_args(raw_args),
        secret_key: signer.secret_key.clone(),
        network,
    };
    log::info!(
        "[Pipeline] invoking {}::{} with {} args",
        request.contract_id,
        request.function_name,
        request.args.len()
    );
    backend.invoke(&request).await
}
