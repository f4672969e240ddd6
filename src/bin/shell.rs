//! bramble-shell - drive the dispatcher from stdin.
//!
//! Reads lines, pumps each through the follow-up waiter first (exactly as
//! a real transport must), then routes whatever starts with the configured
//! prefix. Replies and side-channel notes print to stdout. The synthetic
//! caller is the configured owner, or a local stand-in when no owner is
//! configured.

use bramble::auth::{CallerContext, StaticPerms};
use bramble::commands::ReplySink;
use bramble::config::Config;
use bramble::router::Router;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bramble.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) if !std::path::Path::new(&config_path).exists() => {
            info!(path = %config_path, "no config file, using defaults ({e})");
            Config::default()
        }
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load config");
            return Err(e.into());
        }
    };

    let router = Arc::new(Router::from_config(&config)?);
    info!(
        prefix = %router.prefix(),
        engines = router.engines().len(),
        commands = router.get_all().len(),
        "bramble dispatcher up"
    );

    let author_id = config
        .permissions
        .owner
        .clone()
        .unwrap_or_else(|| "shell".to_string());
    let perms = Arc::new(StaticPerms::from_config(&config.permissions));

    // Notes (asides, prompts) arrive out of band; print them as they come.
    let (note_tx, mut note_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        while let Some(note) = note_rx.recv().await {
            println!("[note] {note}");
        }
    });
    let sink = ReplySink::Direct(note_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut message_id: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        message_id += 1;

        // A pending wait on this (author, channel) consumes the line
        // before any dispatch happens.
        if router.waits().offer(&author_id, "shell", line.clone()) {
            continue;
        }

        let caller = CallerContext {
            author_id: author_id.clone(),
            author_name: author_id.clone(),
            channel_id: "shell".to_string(),
            guild_id: Some("local".to_string()),
            direct: false,
            message_id,
            perms: perms.clone(),
        };

        // One task per inbound line, like a real transport pump. Not
        // awaited here: a handler suspended on a follow-up must not block
        // the loop that will deliver it.
        let router = Arc::clone(&router);
        let sink = sink.clone();
        tokio::spawn(async move {
            if let Some(reply) = router.run(&line, &caller, &sink).await {
                if !reply.is_empty() {
                    println!("{reply}");
                }
            }
        });
    }

    Ok(())
}
