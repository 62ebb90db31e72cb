//! Backend boundary.
//!
//! The IDE talks to a build/deploy server for four things: mirroring tree
//! mutations, compiling the project, deploying the artifact and invoking
//! contract functions. [`IdeBackend`] is the object-safe seam for all of them,
//! with an HTTP implementation ([`HttpBackend`], behind `http-backend`) and an
//! in-memory one ([`InMemoryBackend`]) used by tests and offline sessions.

use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;

use crate::error::Result;
use crate::workspace::{Node, NodeKind};

#[cfg(feature = "http-backend")]
mod http;
mod memory;
mod types;

#[cfg(feature = "http-backend")]
pub use http::{HttpBackend, format_native_balance};
pub use memory::InMemoryBackend;
pub use types::{
    BuildInfo, CompileOutput, CreateNodeBody, DeployReceipt, DeployRequest, HealthStatus,
    InvokeOutcome, InvokeRequest, NodeAck, TreeMutation, WireKind, decode_response,
};

/// Default address of the build server.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// A boxed future for object-safe async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[cfg(test)]
pub(crate) fn block_on_test<F: Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}

/// Operations the IDE delegates to the build server.
///
/// # Example
///
/// ```ignore
/// use soroban_ide_core::backend::IdeBackend;
///
/// async fn build(backend: &dyn IdeBackend, ws: &Workspace) {
///     let output = backend.compile(&ws.file_map()).await.unwrap();
///     println!("{} bytes", output.wasm_size.unwrap_or(0));
/// }
/// ```
pub trait IdeBackend: Send + Sync {
    /// Create a file or folder under `parent_path`.
    fn create_node<'a>(
        &'a self,
        parent_path: &'a str,
        name: &'a str,
        kind: NodeKind,
    ) -> BoxFuture<'a, Result<NodeAck>>;

    /// Delete the node at `path` and its subtree.
    fn delete_node<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<NodeAck>>;

    /// Rename the node at `old_path`.
    fn rename_node<'a>(&'a self, old_path: &'a str, new_name: &'a str)
    -> BoxFuture<'a, Result<NodeAck>>;

    /// Fetch the backend's copy of the project tree.
    fn fetch_tree(&self) -> BoxFuture<'_, Result<Vec<Node>>>;

    /// Compile a flat path → content map.
    fn compile<'a>(&'a self, files: &'a IndexMap<String, String>)
    -> BoxFuture<'a, Result<CompileOutput>>;

    /// Deploy a compiled contract.
    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BoxFuture<'a, Result<DeployReceipt>>;

    /// Call a function on a deployed contract.
    fn invoke<'a>(&'a self, request: &'a InvokeRequest) -> BoxFuture<'a, Result<InvokeOutcome>>;

    /// Dispatch a [`TreeMutation`] to the matching mutation endpoint.
    fn execute<'a>(&'a self, request: &'a TreeMutation) -> BoxFuture<'a, Result<NodeAck>> {
        Box::pin(async move {
            match request {
                TreeMutation::Create {
                    parent_path,
                    name,
                    kind,
                } => self.create_node(parent_path, name, *kind).await,
                TreeMutation::Delete { path } => self.delete_node(path).await,
                TreeMutation::Rename { old_path, new_name } => {
                    self.rename_node(old_path, new_name).await
                }
            }
        })
    }
}
