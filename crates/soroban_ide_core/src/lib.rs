#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Backend boundary (tree mirroring, compile, deploy, invoke)
pub mod backend;

/// Subscriber registry for workspace events
pub mod callback_registry;

/// Live build channel (WebSocket event stream)
pub mod channel;

/// Configuration options
pub mod config;

/// Keypairs and account funding
pub mod credentials;

/// Error (common error types)
pub mod error;

/// Workspace change notifications
pub mod events;

/// Stellar network presets
pub mod network;

/// Compile, deploy and invoke flows
pub mod pipeline;

/// Accounts and recent deployments
pub mod store;

/// Optimistic mutations mirrored to the backend
pub mod sync;

/// Built-in project templates.
pub mod template;

/// Workspace (the project tree and the open file)
pub mod workspace;

#[cfg(test)]
pub mod test_utils;

pub use error::{IdeError, Result};
pub use workspace::{Node, NodeKind, Workspace};
