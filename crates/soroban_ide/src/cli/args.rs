//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use soroban_ide_core::network::Network;

#[derive(Parser)]
#[command(name = "soroban-ide")]
#[command(version)]
#[command(about = "Build, deploy and invoke Soroban contracts through the IDE backend", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the build server URL (e.g. http://localhost:8000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Override the target network
    #[arg(short, long, global = true)]
    pub network: Option<Network>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new contract project from a template
    New {
        /// Project name (also the directory created)
        name: String,

        /// Template to use (default: config's default_template)
        #[arg(short, long)]
        template: Option<String>,

        /// Directory to create the project in (default: current directory)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Print the project tree as the IDE sees it
    Tree {
        /// Project directory (default: current directory)
        dir: Option<PathBuf>,
    },

    /// Compile a project on the build server
    Compile {
        /// Project directory (default: current directory)
        dir: Option<PathBuf>,

        /// Write the compiled WASM here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compile and deploy a project
    Deploy {
        /// Project directory (default: current directory)
        dir: Option<PathBuf>,

        /// Public key of the signing account (default: first account)
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Call a function on a deployed contract
    Invoke {
        /// Function name
        function: String,

        /// Arguments as JSON values separated by commas, e.g. '"world", 42'
        #[arg(default_value = "")]
        args: String,

        /// Contract id (default: latest deployment)
        #[arg(short, long)]
        contract: Option<String>,

        /// Public key of the signing account (default: first account)
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Manage signing accounts
    #[command(alias = "acc")]
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// List recent deployments
    Deployments,

    /// Mirror tree changes to the build server's workspace
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },

    /// Stream build server output until interrupted
    Watch {
        /// Show only the last N messages when exiting
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Generate a keypair and store it
    New {
        /// Fund the new account with friendbot
        #[arg(long)]
        fund: bool,
    },

    /// List stored accounts
    List,

    /// Fund an account with friendbot (test networks only)
    Fund {
        /// Public key (default: first account)
        public_key: Option<String>,
    },

    /// Refresh and print an account's balance
    Balance {
        /// Public key (default: first account)
        public_key: Option<String>,
    },

    /// Forget a stored account
    Remove {
        /// Public key
        public_key: String,
    },
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Print the build server's project tree
    Tree,

    /// Create a file or folder
    Create {
        /// Parent folder path ("" for the top level)
        parent: String,

        /// Name of the new node
        name: String,

        /// Create a folder instead of a file
        #[arg(short, long)]
        dir: bool,
    },

    /// Delete a file or folder
    #[command(alias = "rm")]
    Delete {
        /// Path of the node
        path: String,
    },

    /// Rename a file or folder
    #[command(alias = "mv")]
    Rename {
        /// Path of the node
        path: String,

        /// New name (not a path)
        new_name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}
