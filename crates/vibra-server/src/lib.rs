//! Vibra server: loads a TOML config, starts the engine with its output
//! driver, and serves control ingress and telemetry until interrupted.

pub mod config;
pub use config::ServerConfig;

pub mod error;
pub use error::{Error, Result};

use vibra::VibraEngine;

/// Run until Ctrl-C or until a listener fails. The output driver is stopped
/// before the engine is released either way.
pub async fn run(config: ServerConfig) -> Result<()> {
    let engine = config.builder().build()?;
    tracing::info!(
        actuators = engine.actuator_count(),
        sample_rate = engine.sample_rate(),
        output = ?config.output,
        "engine running"
    );

    let result = serve(&engine, &config).await;
    engine.shutdown();
    result
}

async fn serve(engine: &VibraEngine, config: &ServerConfig) -> Result<()> {
    let control = engine
        .bind_control(config.control_addr.as_str(), config.transport)
        .await?;
    let telemetry = engine.bind_telemetry(config.telemetry_addr.as_str()).await?;

    tokio::select! {
        result = control.run() => result?,
        result = telemetry.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(vibra::Error::from)?;
            tracing::info!("interrupted, shutting down");
        }
    }
    Ok(())
}
