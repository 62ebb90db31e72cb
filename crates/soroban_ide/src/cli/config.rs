//! Config command handlers

use soroban_ide_core::config::IdeConfig;

use crate::cli::CliContext;
use crate::cli::args::ConfigCommands;

pub fn handle_config_command(ctx: &CliContext, command: Option<ConfigCommands>) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => {
            show_config(ctx);
            true
        }
        Some(ConfigCommands::Init { force }) => init_config(ctx, force),
    }
}

/// Show the effective configuration
fn show_config(ctx: &CliContext) {
    let config = &ctx.config;
    println!("Soroban IDE Configuration");
    println!("=========================");
    println!("API base URL: {}", config.api_base_url);
    println!("Channel URL: {}", config.channel_url());
    println!("Network: {}", ctx.network);
    println!(
        "Reconnect: {:?} ({} ms, max {} ms)",
        config.reconnect.strategy, config.reconnect.delay_ms, config.reconnect.max_delay_ms
    );
    println!("History capacity: {}", config.history_capacity);
    println!("Default template: {}", config.default_template);
    match config.resolved_store_path() {
        Ok(path) => println!("Session store: {}", path.display()),
        Err(e) => println!("Session store: unavailable ({})", e),
    }
    match &ctx.config_path {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not created yet)", path.display()),
        None => println!("Config file: none"),
    }
}

fn init_config(ctx: &CliContext, force: bool) -> bool {
    let Some(path) = ctx.config_path.clone().or_else(IdeConfig::config_path) else {
        eprintln!("✗ Could not determine config directory");
        return false;
    };
    if path.exists() && !force {
        eprintln!("✗ {} already exists (use --force to overwrite)", path.display());
        return false;
    }

    let config = IdeConfig {
        network: ctx.network,
        ..ctx.config.clone()
    };
    match config.save_to(&path) {
        Ok(()) => {
            println!("✓ Wrote {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
