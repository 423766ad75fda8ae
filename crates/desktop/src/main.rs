use std::sync::Arc;

use desktop::clients::{ChessqlApi, ChessqlClient};
use desktop::config::Config;
use desktop::shell::{self, Flow, Shell};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // stdout carries the board, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    tracing::info!(base_url = %config.base_url, "Starting ChessQL Desktop");

    let api: Arc<dyn ChessqlApi> = Arc::new(ChessqlClient::new(&config)?);
    let (mut shell, mut sync_updates) = Shell::new(api, &config);

    println!("{}", shell::help_text());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if shell.handle_line(&line).await == Flow::Quit {
                    break;
                }
                if let Some(title) = shell.open_title() {
                    println!("({title})");
                }
            }
            Some(update) = sync_updates.recv() => {
                println!("{}", shell::format_sync_update(&update));
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
