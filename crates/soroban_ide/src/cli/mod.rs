/// Clap argument definitions
mod args;

/// `account` and `deployments` commands
mod account;

/// Config command handlers
mod config;

/// `compile`, `deploy` and `invoke` commands
mod contract;

/// Reading and writing projects on disk
mod project;

/// `remote` commands (tree mirroring)
mod remote;

/// `watch` command (live build channel)
mod watch;

use clap::Parser;
use std::path::PathBuf;

use soroban_ide_core::backend::HttpBackend;
use soroban_ide_core::config::IdeConfig;
use soroban_ide_core::network::Network;
use soroban_ide_core::store::SessionStore;

pub use args::Cli;
use args::Commands;

/// Settings shared by every command, after applying flag overrides.
pub struct CliContext {
    pub config: IdeConfig,
    pub config_path: Option<PathBuf>,
    pub network: Network,
}

impl CliContext {
    fn from_cli(cli: &Cli) -> Result<Self, String> {
        let config_path = cli.config.clone().or_else(IdeConfig::config_path);
        let mut config = match &config_path {
            Some(path) => IdeConfig::load_from_or_default(path)
                .map_err(|e| format!("Error loading config: {}", e))?,
            None => IdeConfig::default(),
        };
        if let Some(url) = &cli.api_url {
            config.api_base_url = url.clone();
        }
        let network = cli.network.unwrap_or(config.network);
        Ok(Self {
            config,
            config_path,
            network,
        })
    }

    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(&self.config.api_base_url)
    }

    /// Open the session store (accounts and deployments).
    pub fn open_store(&self) -> Option<SessionStore> {
        let path = match self.config.resolved_store_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("✗ {}", e);
                return None;
            }
        };
        match SessionStore::load_or_empty(&path) {
            Ok(store) => Some(store),
            Err(e) => {
                eprintln!("✗ Could not read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Run a future on a fresh multi-threaded runtime.
pub fn block_on<F: std::future::Future>(f: F) -> Option<F::Output> {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => Some(runtime.block_on(f)),
        Err(e) => {
            eprintln!("✗ Failed to start async runtime: {}", e);
            None
        }
    }
}

/// Directory argument, or the current directory.
fn dir_or_current(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    let ctx = match CliContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("[CLI] using {} on {}", ctx.config.api_base_url, ctx.network);

    let success = match cli.command {
        Commands::New {
            name,
            template,
            dest,
        } => project::handle_new(&ctx, &name, template, dir_or_current(dest)),

        Commands::Tree { dir } => project::handle_tree(&dir_or_current(dir)),

        Commands::Compile { dir, out } => {
            contract::handle_compile(&ctx, &dir_or_current(dir), out.as_deref())
        }

        Commands::Deploy { dir, account } => {
            contract::handle_deploy(&ctx, &dir_or_current(dir), account.as_deref())
        }

        Commands::Invoke {
            function,
            args,
            contract,
            account,
        } => contract::handle_invoke(
            &ctx,
            &function,
            &args,
            contract.as_deref(),
            account.as_deref(),
        ),

        Commands::Account { command } => account::handle_account_command(&ctx, command),

        Commands::Deployments => account::handle_deployments(&ctx),

        Commands::Remote { command } => remote::handle_remote_command(&ctx, command),

        Commands::Watch { tail } => watch::handle_watch(&ctx, tail),

        Commands::Config { command } => config::handle_config_command(&ctx, command),
    };

    if !success {
        std::process::exit(1);
    }
}
