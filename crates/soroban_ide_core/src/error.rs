use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for IDE core operations
#[derive(Debug, Error)]
pub enum IdeError {
    // Tree errors
    /// No node at the given path.
    #[error("No file or directory at '{0}'")]
    NotFound(String),

    /// A sibling with that name already exists.
    #[error("'{0}' already exists")]
    Conflict(String),

    /// Empty, `.`, `..` or containing a separator.
    #[error("Invalid name '{0}': names must be non-empty, must not contain '/' and must not be '.' or '..'")]
    InvalidName(String),

    /// A node list that cannot form a tree.
    #[error("Invalid project tree: {0}")]
    InvalidTree(String),

    // Channel errors
    /// The live channel could not connect.
    #[error("Live channel connection failed: {0}")]
    Connection(String),

    /// Data from the backend could not be decoded.
    #[error("Malformed frame: {0}")]
    Parse(String),

    // Backend errors
    /// The backend rejected an operation.
    #[error("{operation} failed: {message}")]
    RemoteOperation {
        /// Operation name, e.g. `Deployment`.
        operation: String,
        /// Reason given by the backend.
        message: String,
    },

    /// Compile requested on an empty workspace.
    #[error("No files to compile")]
    EmptyProject,

    /// The build produced no artifact to deploy.
    #[error("No WASM output from compilation")]
    MissingArtifact,

    /// No signing account is known.
    #[error("No account available. Create an account first")]
    NoAccount,

    /// A required input was empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Request to the backend failed in transport.
    #[cfg(feature = "http-backend")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // IO / serialization errors
    /// Local I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a specific file failed.
    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    /// The config file is not valid TOML for [`crate::config::IdeConfig`].
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be written as TOML.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The platform has no config or data directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

impl IdeError {
    /// Build a [`IdeError::RemoteOperation`] for a backend rejection.
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        IdeError::RemoteOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for the local, recoverable tree errors (`NotFound`, `Conflict`, `InvalidName`).
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            IdeError::NotFound(_) | IdeError::Conflict(_) | IdeError::InvalidName(_)
        )
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// Result type alias for IDE core operations
pub type Result<T> = std::result::Result<T, IdeError>;

/// A serializable representation of IdeError for the front end
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Workspace path the error refers to (if applicable)
    pub path: Option<String>,
}

impl From<&IdeError> for SerializableError {
    fn from(err: &IdeError) -> Self {
        let kind = match err {
            IdeError::NotFound(_) => "NotFound",
            IdeError::Conflict(_) => "Conflict",
            IdeError::InvalidName(_) => "InvalidName",
            IdeError::InvalidTree(_) => "InvalidTree",
            IdeError::Connection(_) => "ConnectionError",
            IdeError::Parse(_) => "ParseError",
            IdeError::RemoteOperation { .. } => "RemoteOperationError",
            IdeError::EmptyProject => "EmptyProject",
            IdeError::MissingArtifact => "MissingArtifact",
            IdeError::NoAccount => "NoAccount",
            IdeError::MissingField(_) => "MissingField",
            #[cfg(feature = "http-backend")]
            IdeError::Http(_) => "Http",
            IdeError::Io(_) => "Io",
            IdeError::FileWrite { .. } => "FileWrite",
            IdeError::Json(_) => "Json",
            IdeError::ConfigParse(_) => "ConfigParse",
            IdeError::ConfigSerialize(_) => "ConfigSerialize",
            IdeError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let path = match err {
            IdeError::NotFound(path) | IdeError::Conflict(path) => Some(path.clone()),
            IdeError::FileWrite { path, .. } => Some(path.display().to_string()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<IdeError> for SerializableError {
    fn from(err: IdeError) -> Self {
        SerializableError::from(&err)
    }
}
