//! `compile`, `deploy` and `invoke` command handlers

use std::path::Path;

use soroban_ide_core::backend::CompileOutput;
use soroban_ide_core::pipeline;

use crate::cli::project::load_project;
use crate::cli::{CliContext, block_on};

fn print_build_info(output: &CompileOutput) {
    let info = &output.build_info;
    for warning in &info.warnings {
        println!("  warning: {}", warning);
    }
    for error in &info.errors {
        eprintln!("  error: {}", error);
    }
    if let Some(size) = output.wasm_size {
        println!("  {} bytes of WASM in {} ms", size, info.duration_ms);
    }
}

pub fn handle_compile(ctx: &CliContext, dir: &Path, out: Option<&Path>) -> bool {
    let ws = match load_project(dir) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    println!("Compiling {} files...", ws.file_map().len());
    let backend = ctx.backend();
    let Some(result) = block_on(pipeline::compile(&backend, &ws)) else {
        return false;
    };
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    print_build_info(&output);
    if output.has_errors() {
        eprintln!("✗ Compilation reported errors");
        return false;
    }

    if let Some(out) = out {
        let bytes = match output.wasm_bytes() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                eprintln!("✗ No WASM output from compilation");
                return false;
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                return false;
            }
        };
        if let Err(e) = std::fs::write(out, bytes) {
            eprintln!("✗ Failed to write {}: {}", out.display(), e);
            return false;
        }
        println!("✓ Wrote {}", out.display());
    } else {
        println!("✓ Compiled");
    }
    true
}

pub fn handle_deploy(ctx: &CliContext, dir: &Path, account: Option<&str>) -> bool {
    let ws = match load_project(dir) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let Some(mut store) = ctx.open_store() else {
        return false;
    };

    println!("Deploying to {}...", ctx.network);
    let backend = ctx.backend();
    let Some(result) = block_on(pipeline::deploy(
        &backend,
        &mut store,
        &ws,
        account,
        ctx.network,
    )) else {
        return false;
    };

    match result {
        Ok(outcome) => {
            print_build_info(&outcome.build);
            println!("✓ Deployed");
            println!("  Contract:    {}", outcome.receipt.contract_id);
            println!("  Transaction: {}", outcome.receipt.transaction_hash);
            println!("  WASM hash:   {}", outcome.receipt.wasm_hash);
            println!("  Account:     {}", outcome.account_public_key);
            for (name, value) in &outcome.receipt.cost {
                println!("  {}: {}", name, value);
            }
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

pub fn handle_invoke(
    ctx: &CliContext,
    function: &str,
    args: &str,
    contract: Option<&str>,
    account: Option<&str>,
) -> bool {
    let Some(store) = ctx.open_store() else {
        return false;
    };

    let contract_id = match contract {
        Some(id) => id.to_string(),
        None => match store.latest_deployment() {
            Some(latest) => {
                println!("Using latest deployment {}", latest.receipt.contract_id);
                latest.receipt.contract_id.clone()
            }
            None => {
                eprintln!("✗ No contract given and nothing deployed yet");
                return false;
            }
        },
    };

    let backend = ctx.backend();
    let Some(result) = block_on(pipeline::invoke(
        &backend,
        &store,
        &contract_id,
        function,
        args,
        account,
        ctx.network,
    )) else {
        return false;
    };

    match result {
        Ok(outcome) => {
            println!("✓ {}", outcome.result);
            println!("  Transaction: {}", outcome.transaction_hash);
            if let Some(cost) = &outcome.cost {
                println!("  Cost: {}", cost);
            }
            for line in &outcome.logs {
                println!("  log: {}", line);
            }
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
