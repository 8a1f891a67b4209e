//! Server binary. Optional first argument: path to a TOML config file.

use std::env;
use vibra_server::{Result, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    vibra_server::run(config).await
}
