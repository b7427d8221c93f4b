// oracle_leaks/oracle_server/src/main.rs

use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};
use tokio::net::TcpListener;
use oracle_server::{serve, Args, OracleContext, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args).context("invalid configuration")?;

    // Key generation is CPU bound; keep it off the reactor.
    let startup_config = config.clone();
    let ctx = tokio::task::spawn_blocking(move || OracleContext::from_config(&startup_config))
        .await
        .context("key generation task failed")?
        .context("cannot initialise the oracle")?;
    let ctx = Arc::new(ctx);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("cannot listen on {}", config.bind))?;
    info!(
        "oracle listening on {} ({}-bit key, {}s session budget)",
        listener.local_addr()?,
        ctx.key().bit_size,
        config.session_timeout_secs
    );

    serve(listener, ctx, config.session_timeout()).await;
    Ok(())
}
