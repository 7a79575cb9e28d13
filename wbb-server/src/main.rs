//! Bot server - answers Web Bot Battle game-server calls over HTTP.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use wbb::io::config::{DEFAULT_CONFIG_PATH, load_config};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "wbb-server")]
#[command(about = "HTTP endpoint that plays Web Bot Battle turns")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3001")]
    port: u16,

    /// Bot config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wbb_server=info".parse()?)
                .add_directive("wbb=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    info!(
        strategy = %config.strategy,
        state_dir = %config.state_dir().display(),
        "starting wbb-server"
    );

    let app = routes::router(AppState::new(config));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
