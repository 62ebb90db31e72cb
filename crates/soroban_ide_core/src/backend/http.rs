//! reqwest-based client for the build server.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::types::{
    CompileOutput, CreateNodeBody, DeployReceipt, DeployRequest, HealthStatus, InvokeOutcome,
    InvokeRequest, NodeAck, decode_response,
};
use super::{BoxFuture, DEFAULT_API_BASE_URL, IdeBackend};
use crate::credentials::{CredentialProvider, KeyPair};
use crate::error::{IdeError, Result};
use crate::network::Network;
use crate::workspace::{Node, NodeKind};

/// HTTP client for the build/deploy server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl HttpBackend {
    /// Client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Server address without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post<B, T>(&self, operation: &str, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        log::debug!("[HttpBackend] POST {}", endpoint);
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        Self::read_response(operation, response).await
    }

    async fn get<T: DeserializeOwned>(&self, operation: &str, endpoint: &str) -> Result<T> {
        log::debug!("[HttpBackend] GET {}", endpoint);
        let response = self.client.get(self.url(endpoint)).send().await?;
        Self::read_response(operation, response).await
    }

    async fn read_response<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            log::warn!("[HttpBackend] {} returned {}", operation, status);
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| format!("API Error: {} - {}", status.as_u16(), text));
            return Err(IdeError::remote(operation, message));
        }
        let value: Value = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text)
                .map_err(|e| IdeError::remote(operation, format!("invalid JSON: {e}")))?
        };
        decode_response(operation, value)
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("Health check", "/health").await
    }
}

/// Pull the tree out of a `get-tree` response, which is either a bare array
/// or an object wrapping it under `files` or `tree`.
fn tree_from_response(value: Value) -> Result<Vec<Node>> {
    let nodes = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("files")
            .or_else(|| map.remove("tree"))
            .unwrap_or(Value::Array(Vec::new())),
        _ => return Err(IdeError::Parse("file tree is not an array".into())),
    };
    serde_json::from_value(nodes).map_err(|e| IdeError::Parse(format!("invalid file tree: {e}")))
}

impl IdeBackend for HttpBackend {
    fn create_node<'a>(
        &'a self,
        parent_path: &'a str,
        name: &'a str,
        kind: NodeKind,
    ) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            let body = CreateNodeBody {
                parent_path,
                name,
                kind: kind.into(),
                content: (kind == NodeKind::File).then_some(""),
            };
            self.post("Create", "/files/create", &body).await
        })
    }

    fn delete_node<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            let mut ack: NodeAck = self
                .post("Delete", "/files/delete", &json!({ "path": path }))
                .await?;
            if ack.path.is_empty() {
                ack.path = path.to_string();
            }
            Ok(ack)
        })
    }

    fn rename_node<'a>(
        &'a self,
        old_path: &'a str,
        new_name: &'a str,
    ) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            self.post(
                "Rename",
                "/files/rename",
                &json!({ "oldPath": old_path, "newName": new_name }),
            )
            .await
        })
    }

    fn fetch_tree(&self) -> BoxFuture<'_, Result<Vec<Node>>> {
        Box::pin(async move {
            let value: Value = self.get("Get tree", "/files/get-tree").await?;
            tree_from_response(value)
        })
    }

    fn compile<'a>(
        &'a self,
        files: &'a IndexMap<String, String>,
    ) -> BoxFuture<'a, Result<CompileOutput>> {
        Box::pin(async move {
            self.post("Compilation", "/compile", &json!({ "files": files }))
                .await
        })
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BoxFuture<'a, Result<DeployReceipt>> {
        Box::pin(async move { self.post("Deployment", "/deploy", request).await })
    }

    fn invoke<'a>(&'a self, request: &'a InvokeRequest) -> BoxFuture<'a, Result<InvokeOutcome>> {
        Box::pin(async move { self.post("Invocation", "/invoke", request).await })
    }
}

/// Native balance from a Horizon account record, with 7 decimal places.
///
/// Accounts without a native balance line report `"0"`.
pub fn format_native_balance(account: &Value) -> String {
    account
        .get("balances")
        .and_then(Value::as_array)
        .and_then(|balances| {
            balances
                .iter()
                .find(|b| b.get("asset_type").and_then(Value::as_str) == Some("native"))
        })
        .and_then(|b| b.get("balance").and_then(Value::as_str))
        .and_then(|raw| raw.parse::<f64>().ok())
        .map(|amount| format!("{:.7}", amount))
        .unwrap_or_else(|| "0".to_string())
}

impl CredentialProvider for HttpBackend {
    fn generate_keypair(&self) -> BoxFuture<'_, Result<KeyPair>> {
        Box::pin(async move {
            self.post("Keypair generation", "/generate-keypair", &json!({}))
                .await
        })
    }

    fn fund_account<'a>(
        &'a self,
        public_key: &'a str,
        network: Network,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let _: Value = self
                .post(
                    "Funding",
                    "/fund-account",
                    &json!({ "publicKey": public_key, "network": network }),
                )
                .await?;
            log::info!("[HttpBackend] funded {} on {}", public_key, network);
            Ok(())
        })
    }

    fn balance<'a>(&'a self, public_key: &'a str, network: Network) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let url = format!("{}/accounts/{}", network.config().horizon_url, public_key);
            let response = self.client.get(url).send().await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok("0".to_string());
            }
            if !response.status().is_success() {
                return Err(IdeError::remote(
                    "Balance lookup",
                    format!("Horizon returned {}", response.status()),
                ));
            }
            let account: Value = response.json().await?;
            Ok(format_native_balance(&account))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_balance_formatting() {
        let account = json!({
            "balances": [
                { "asset_type": "credit_alphanum4", "balance": "5.0" },
                { "asset_type": "native", "balance": "9999.99" }
            ]
        });
        assert_eq!(format_native_balance(&account), "9999.9900000");
    }

    #[test]
    fn test_missing_native_balance_is_zero() {
        assert_eq!(format_native_balance(&json!({ "balances": [] })), "0");
        assert_eq!(format_native_balance(&json!({})), "0");
    }

    #[test]
    fn test_tree_from_bare_array() {
        let nodes = tree_from_response(json!([
            { "name": "hello_world", "type": "directory", "children": [
                { "name": "Cargo.toml", "type": "file", "content": "" }
            ]}
        ]))
        .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name(), "hello_world");
    }

    #[test]
    fn test_tree_from_wrapped_object() {
        let nodes =
            tree_from_response(json!({ "files": [{ "name": "a.rs", "type": "file" }] })).unwrap();
        assert_eq!(nodes[0].content(), Some(""));
        assert!(tree_from_response(json!({})).unwrap().is_empty());
        assert!(tree_from_response(json!("nope")).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.url("/compile"), "http://localhost:8000/compile");
    }
}
