use std::{env, path::Path};

use abi::Config;
use anyhow::Result;
use reservation_service::start_server;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_CANDIDATES: [&str; 3] = [
    "./reservation.yml",
    "~/.config/reservation.yml",
    "/etc/reservation.yml",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let filename = config_path();
    info!(%filename, "loading configuration");
    let config = Config::load(&filename)?;

    start_server(&config).await
}

/// `RESERVATION_CONFIG` wins, otherwise the first candidate that exists.
fn config_path() -> String {
    env::var("RESERVATION_CONFIG").unwrap_or_else(|_| {
        CONFIG_CANDIDATES
            .iter()
            .map(|p| shellexpand::tilde(p).into_owned())
            .find(|p| Path::new(p).exists())
            .unwrap_or_else(|| CONFIG_CANDIDATES[2].to_string())
    })
}
