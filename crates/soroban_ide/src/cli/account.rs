//! `account` and `deployments` command handlers

use soroban_ide_core::credentials::CredentialProvider;
use soroban_ide_core::store::SessionStore;

use crate::cli::args::AccountCommands;
use crate::cli::{CliContext, block_on};

pub fn handle_account_command(ctx: &CliContext, command: AccountCommands) -> bool {
    let Some(mut store) = ctx.open_store() else {
        return false;
    };

    match command {
        AccountCommands::New { fund } => handle_new(ctx, &mut store, fund),
        AccountCommands::List => {
            list_accounts(&store);
            true
        }
        AccountCommands::Fund { public_key } => match resolve(&store, public_key.as_deref()) {
            Some(key) => fund(ctx, &mut store, &key),
            None => false,
        },
        AccountCommands::Balance { public_key } => match resolve(&store, public_key.as_deref()) {
            Some(key) => refresh_balance(ctx, &mut store, &key),
            None => false,
        },
        AccountCommands::Remove { public_key } => match store.remove_account(&public_key) {
            Ok(account) => {
                println!("✓ Removed {} ({})", account.name, account.public_key);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        },
    }
}

fn resolve(store: &SessionStore, public_key: Option<&str>) -> Option<String> {
    match store.resolve_account(public_key) {
        Ok(account) => Some(account.public_key.clone()),
        Err(e) => {
            eprintln!("✗ {}", e);
            None
        }
    }
}

fn handle_new(ctx: &CliContext, store: &mut SessionStore, fund_after: bool) -> bool {
    let backend = ctx.backend();
    let Some(result) = block_on(backend.generate_keypair()) else {
        return false;
    };
    let keypair = match result {
        Ok(keypair) => keypair,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let public_key = match store.add_account(keypair) {
        Ok(account) => {
            println!("✓ Created {}", account.name);
            println!("  Public key: {}", account.public_key);
            account.public_key.clone()
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    if fund_after {
        fund(ctx, store, &public_key)
    } else {
        true
    }
}

fn fund(ctx: &CliContext, store: &mut SessionStore, public_key: &str) -> bool {
    println!("Funding {} on {}...", public_key, ctx.network);
    let backend = ctx.backend();
    let Some(result) = block_on(backend.fund_account(public_key, ctx.network)) else {
        return false;
    };
    if let Err(e) = result {
        eprintln!("✗ {}", e);
        return false;
    }
    println!("✓ Funded");
    refresh_balance(ctx, store, public_key)
}

fn refresh_balance(ctx: &CliContext, store: &mut SessionStore, public_key: &str) -> bool {
    let backend = ctx.backend();
    let Some(result) = block_on(backend.balance(public_key, ctx.network)) else {
        return false;
    };
    let balance = match result {
        Ok(balance) => balance,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if let Err(e) = store.set_balance(public_key, balance.clone()) {
        eprintln!("✗ {}", e);
        return false;
    }
    println!("  Balance: {} XLM", balance);
    true
}

fn list_accounts(store: &SessionStore) {
    if store.accounts().is_empty() {
        println!("No accounts. Run 'soroban-ide account new' to create one.");
        return;
    }
    for account in store.accounts() {
        println!(
            "{:<12} {}  {} XLM",
            account.name, account.public_key, account.balance
        );
    }
}

pub fn handle_deployments(ctx: &CliContext) -> bool {
    let Some(store) = ctx.open_store() else {
        return false;
    };
    if store.deployments().is_empty() {
        println!("No deployments yet.");
        return true;
    }
    for record in store.deployments() {
        println!(
            "{}  {}  {:<9}  by {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.receipt.contract_id,
            record.network.id(),
            record.account_public_key
        );
    }
    true
}
