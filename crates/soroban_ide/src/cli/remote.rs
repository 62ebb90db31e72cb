//! `remote` command handlers

use soroban_ide_core::Result;
use soroban_ide_core::backend::HttpBackend;
use soroban_ide_core::sync::BackendSync;
use soroban_ide_core::workspace::{NodeKind, Workspace};

use crate::cli::args::RemoteCommands;
use crate::cli::project::format_tree;
use crate::cli::{CliContext, block_on};

pub fn handle_remote_command(ctx: &CliContext, command: RemoteCommands) -> bool {
    let sync = BackendSync::new(ctx.backend(), Workspace::new());
    let Some(result) = block_on(run(&sync, command)) else {
        return false;
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

async fn run(sync: &BackendSync<HttpBackend>, command: RemoteCommands) -> Result<()> {
    sync.refresh().await?;

    match command {
        RemoteCommands::Tree => {
            print!("{}", format_tree(&sync.snapshot()));
        }
        RemoteCommands::Create { parent, name, dir } => {
            let kind = if dir {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            let ack = sync.create(&parent, &name, kind).await?;
            println!("✓ Created {}", ack.path);
        }
        RemoteCommands::Delete { path } => {
            sync.delete(&path).await?;
            println!("✓ Deleted {}", path);
        }
        RemoteCommands::Rename { path, new_name } => {
            let ack = sync.rename(&path, &new_name).await?;
            println!("✓ Renamed {} to {}", path, ack.path);
        }
    }

    let pending = sync.with_state(|state| state.ledger().pending().count());
    if pending > 0 {
        log::warn!("[CLI] {} mutations still unconfirmed", pending);
    }
    Ok(())
}
