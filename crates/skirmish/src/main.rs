//! `skirmish-server` binary.
//!
//! Reads `SKIRMISH_BIND` and `SKIRMISH_ROUND_SECS`; log levels come from
//! `RUST_LOG` (default `info`).

use skirmish::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let server = SkirmishServerBuilder::from_config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "accepting connections");

    server.run().await
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
