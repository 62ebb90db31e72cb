//! Request and response types exchanged with the build/deploy backend.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{IdeError, Result};
use crate::network::Network;
use crate::workspace::{NodeKind, path};

/// Node kind as named by the file endpoints (`file` / `folder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    /// A file.
    File,
    /// A directory.
    Folder,
}

impl From<NodeKind> for WireKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::File => WireKind::File,
            NodeKind::Directory => WireKind::Folder,
        }
    }
}

/// A tree mutation to mirror on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMutation {
    /// Create a node under `parent_path`.
    Create {
        /// Parent directory, `""` for the root level.
        parent_path: String,
        /// Name of the new node.
        name: String,
        /// File or directory.
        kind: NodeKind,
    },
    /// Delete the node at `path` and its subtree.
    Delete {
        /// Node to remove.
        path: String,
    },
    /// Rename the node at `old_path` in place.
    Rename {
        /// Current path of the node.
        old_path: String,
        /// New final segment.
        new_name: String,
    },
}

impl TreeMutation {
    /// Name of the operation for logs and error messages.
    pub fn operation(&self) -> &'static str {
        match self {
            TreeMutation::Create { .. } => "Create",
            TreeMutation::Delete { .. } => "Delete",
            TreeMutation::Rename { .. } => "Rename",
        }
    }

    /// Path the mutation produces locally (the removed path for deletes).
    pub fn target_path(&self) -> String {
        match self {
            TreeMutation::Create {
                parent_path, name, ..
            } => path::join(parent_path, name),
            TreeMutation::Delete { path } => path.clone(),
            TreeMutation::Rename { old_path, new_name } => {
                path::join(path::parent(old_path), new_name)
            }
        }
    }
}

/// Body of `POST /files/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeBody<'a> {
    /// Parent directory, `""` for the root level.
    pub parent_path: &'a str,
    /// Name of the new node.
    pub name: &'a str,
    /// Node kind as the backend spells it.
    #[serde(rename = "type")]
    pub kind: WireKind,
    /// Initial content for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
}

/// Backend acknowledgement of a tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAck {
    /// Canonical path assigned by the backend.
    #[serde(default)]
    pub path: String,
}

/// Build metadata returned by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildInfo {
    /// Compile time in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Compiler warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Compiler errors. Non-empty means the build failed.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Result of `POST /compile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOutput {
    /// Compiled contract, base64 encoded.
    #[serde(default)]
    pub wasm_base64: Option<String>,
    /// Size of the artifact in bytes.
    #[serde(default)]
    pub wasm_size: Option<u64>,
    #[serde(default)]
    pub xdr_base64: Option<String>,
    /// Timing and diagnostics.
    #[serde(default)]
    pub build_info: BuildInfo,
}

impl CompileOutput {
    /// Decoded artifact bytes, if the build produced one.
    pub fn wasm_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.wasm_base64
            .as_deref()
            .map(|encoded| {
                STANDARD
                    .decode(encoded)
                    .map_err(|e| IdeError::Parse(format!("invalid wasm_base64: {e}")))
            })
            .transpose()
    }

    /// True if the compiler reported errors.
    pub fn has_errors(&self) -> bool {
        !self.build_info.errors.is_empty()
    }
}

/// Body of `POST /deploy`.
#[derive(Clone, Serialize)]
pub struct DeployRequest {
    pub wasm_base64: String,
    /// Signing seed of the deploying account.
    pub secret_key: String,
    /// Target network.
    pub network: Network,
}

impl fmt::Debug for DeployRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployRequest")
            .field("wasm_len", &self.wasm_base64.len())
            .field("secret_key", &"<redacted>")
            .field("network", &self.network)
            .finish()
    }
}

/// Receipt returned by `POST /deploy`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReceipt {
    /// Address of the deployed contract.
    pub contract_id: String,
    /// Hash of the deploy transaction.
    pub transaction_hash: String,
    /// Hash of the uploaded wasm.
    #[serde(default)]
    pub wasm_hash: String,
    /// Resource cost as reported by the backend (e.g. `cpuInsns`, `memBytes`).
    #[serde(default)]
    pub cost: IndexMap<String, Value>,
}

/// Body of `POST /invoke`.
#[derive(Clone, Serialize)]
pub struct InvokeRequest {
    /// Contract to call.
    pub contract_id: String,
    /// Function to call.
    pub function_name: String,
    /// Call arguments as JSON values.
    pub args: Vec<Value>,
    /// Signing seed of the calling account.
    pub secret_key: String,
    /// Target network.
    pub network: Network,
}

impl fmt::Debug for InvokeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokeRequest")
            .field("contract_id", &self.contract_id)
            .field("function_name", &self.function_name)
            .field("args", &self.args)
            .field("secret_key", &"<redacted>")
            .field("network", &self.network)
            .finish()
    }
}

/// Result of `POST /invoke`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeOutcome {
    /// Return value of the call.
    #[serde(default)]
    pub result: Value,
    /// Hash of the invoke transaction.
    #[serde(default)]
    pub transaction_hash: String,
    /// Fee summary, when reported.
    #[serde(default)]
    pub cost: Option<String>,
    /// Contract log lines.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status, `ok` when healthy.
    pub status: String,
    /// Status of each backend service.
    #[serde(default)]
    pub services: IndexMap<String, String>,
}

/// Decode a backend JSON response, mapping `error` fields and
/// `success: false` to [`IdeError::RemoteOperation`].
pub fn decode_response<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(IdeError::remote(operation, message));
    }
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(IdeError::remote(operation, "backend reported failure"));
    }
    serde_json::from_value(value)
        .map_err(|e| IdeError::remote(operation, format!("unexpected response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_error_field() {
        let result: Result<CompileOutput> =
            decode_response("Compile", json!({ "error": "cargo exited with 101" }));
        match result {
            Err(IdeError::RemoteOperation { operation, message }) => {
                assert_eq!(operation, "Compile");
                assert_eq!(message, "cargo exited with 101");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_success_false() {
        let result: Result<NodeAck> = decode_response("Delete", json!({ "success": false }));
        assert!(matches!(result, Err(IdeError::RemoteOperation { .. })));
    }

    #[test]
    fn test_decode_null_error_is_ignored() {
        let ack: NodeAck = decode_response(
            "Create",
            json!({ "path": "hello_world/src2", "success": true, "error": null }),
        )
        .unwrap();
        assert_eq!(ack.path, "hello_world/src2");
    }

    #[test]
    fn test_compile_output_decodes_wasm() {
        let output: CompileOutput = decode_response(
            "Compile",
            json!({
                "wasm_base64": "AGFzbQ==",
                "wasm_size": 4,
                "build_info": { "duration_ms": 1200, "warnings": ["unused"], "errors": [] }
            }),
        )
        .unwrap();
        assert_eq!(output.wasm_bytes().unwrap(), Some(b"\0asm".to_vec()));
        assert_eq!(output.build_info.warnings, ["unused"]);
        assert!(!output.has_errors());
    }

    #[test]
    fn test_deploy_receipt_camel_case() {
        let receipt: DeployReceipt = decode_response(
            "Deploy",
            json!({
                "contractId": "CABC",
                "transactionHash": "deadbeef",
                "wasmHash": "cafe",
                "cost": { "cpuInsns": "1000", "memBytes": "2048" }
            }),
        )
        .unwrap();
        assert_eq!(receipt.contract_id, "CABC");
        assert_eq!(receipt.cost["memBytes"], "2048");
    }

    #[test]
    fn test_create_body_uses_folder_kind() {
        let body = CreateNodeBody {
            parent_path: "hello_world",
            name: "src2",
            kind: NodeKind::Directory.into(),
            content: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({ "parentPath": "hello_world", "name": "src2", "type": "folder" })
        );
    }

    #[test]
    fn test_requests_redact_secret_key() {
        let request = DeployRequest {
            wasm_base64: "AGFzbQ==".into(),
            secret_key: "SSECRET".into(),
            network: Network::Futurenet,
        };
        assert!(!format!("{:?}", request).contains("SSECRET"));
    }
}
