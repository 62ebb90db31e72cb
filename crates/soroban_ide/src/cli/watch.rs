//! `watch` command: print live build server output until Ctrl+C.

use std::sync::Arc;

use soroban_ide_core::channel::{
    ChannelMessage, LiveChannelClient, MessageKind, TungsteniteConnector,
};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{CliContext, block_on};

fn print_message(message: &ChannelMessage) {
    match message.kind {
        MessageKind::Error | MessageKind::Warning => eprintln!("{}", message),
        MessageKind::Info | MessageKind::Success => println!("{}", message),
    }
}

pub fn handle_watch(ctx: &CliContext, tail: Option<usize>) -> bool {
    let url = ctx.config.channel_url();
    let options = ctx.config.channel_options();

    let outcome = block_on(async move {
        let mut client = LiveChannelClient::spawn(&url, Arc::new(TungsteniteConnector), options);
        let router = client.router();
        let mut updates = router.subscribe();
        println!("Watching {} (Ctrl+C to stop)", url);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Ok(message) => print_message(&message),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("[CLI] skipped {} messages", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                signal = &mut ctrl_c => {
                    if let Err(e) = signal {
                        eprintln!("Failed to listen for Ctrl+C: {}", e);
                    }
                    break;
                }
            }
        }

        client.shutdown();
        router
    });

    let Some(router) = outcome else {
        return false;
    };

    println!();
    if let Some(n) = tail {
        for message in router.tail(n) {
            print_message(&message);
        }
    }
    let counts = router.counts();
    println!(
        "Stopped. {} info, {} success, {} warnings, {} errors",
        counts.info, counts.success, counts.warning, counts.error
    );
    let evicted = router.evicted();
    if evicted > 0 {
        println!("({} older messages no longer retained)", evicted);
    }
    true
}
