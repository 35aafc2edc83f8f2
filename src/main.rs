mod config;
mod engine;
mod export;
mod filter;
mod parse;
mod record;
mod schema;
mod source;
mod tui;

use anyhow::Result;
use config::Config;
use engine::{DataState, Engine, EngineCommand};
use source::transport::HttpTransport;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Payload compiled into the binary so the dashboard works with no I/O at
/// all. Consulted only when [data].embedded is enabled.
const EMBEDDED_PAYLOAD: &str = include_str!("../data/embedded.json");

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns the terminal; logs go to a file.
    let log_file = std::fs::File::create("projdash.log")?;
    tracing_subscriber::fmt()
        .with_env_filter("projdash=debug")
        .with_writer(log_file)
        .init();

    let config = Config::load(Path::new("config.toml"))?;
    let schema = config.data.column_schema()?;

    if std::env::args().any(|arg| arg == "--build-data") {
        let out = Path::new("data/projects.json");
        let count = export::build_data(&config.data.local_path, out, &schema)?;
        println!("Wrote {} projects to {}", count, out.display());
        return Ok(());
    }

    let embedded = if config.data.embedded {
        match source::parse_embedded(EMBEDDED_PAYLOAD) {
            Ok(projects) => Some(projects),
            Err(e) => {
                tracing::warn!("ignoring embedded payload: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let sources = config.data.source_chain(embedded);
    let transport = Arc::new(HttpTransport::new());

    let (state_tx, state_rx) = watch::channel(DataState::new());
    let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>(16);

    let engine = Engine::new(sources, schema, transport, state_tx);
    tokio::spawn(engine.run(cmd_rx));

    let debounce = Duration::from_millis(config.ui.search_debounce_ms);
    tui::run_tui(state_rx, cmd_tx, debounce).await?;

    tracing::debug!("shutting down");
    Ok(())
}
