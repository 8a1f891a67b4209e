//! VibraEngine that owns the synthesis engine, its output driver and ingest

use crate::builder::VibraEngineBuilder;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::net::ToSocketAddrs;
use vibra_control::{CommandIngest, ControlServer, IngestError, Receipt, TelemetryServer, Transport};
use vibra_core::{
    EngineConfig, EngineHandle, EngineStats, HeadlessOutput, Renderer, StatsSnapshot,
    TelemetryRecord, TelemetryWindow,
};

pub(crate) enum Output {
    Headless(HeadlessOutput),
    #[cfg(feature = "audio-io")]
    Device(vibra_core::AudioOutput),
    Manual(Option<Renderer>),
}

/// Haptic carrier engine with its output driver and command ingest.
///
/// Dropping the engine stops the output (render thread or device stream)
/// before the rest of the engine state is released.
///
/// # Example
///
/// ```ignore
/// use vibra::prelude::*;
///
/// let engine = VibraEngine::builder().actuators(6).build()?;
///
/// engine.receive(r#"{"duration": 120, "amplitudes": [1, 0, 0, 0, 0, 0], "timestamp": 0}"#)?;
///
/// let control = engine.bind_control("127.0.0.1:8000", Transport::WebSocket).await?;
/// tokio::spawn(control.run());
/// ```
pub struct VibraEngine {
    // Declared first: dropped before the handle.
    output: Output,
    handle: EngineHandle,
    ingest: CommandIngest,
}

impl VibraEngine {
    pub fn builder() -> VibraEngineBuilder {
        VibraEngineBuilder::default()
    }

    pub(crate) fn from_parts(handle: EngineHandle, output: Output, ingest: CommandIngest) -> Self {
        Self {
            output,
            handle,
            ingest,
        }
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn ingest(&self) -> &CommandIngest {
        &self.ingest
    }

    pub fn config(&self) -> &EngineConfig {
        self.handle.config()
    }

    pub fn sample_rate(&self) -> f64 {
        self.handle.sample_rate()
    }

    pub fn actuator_count(&self) -> usize {
        self.handle.actuator_count()
    }

    pub fn telemetry(&self) -> &Arc<TelemetryWindow> {
        self.handle.telemetry()
    }

    pub fn telemetry_snapshot(&self) -> Vec<TelemetryRecord> {
        self.handle.telemetry().snapshot()
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        self.handle.stats()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.handle.stats().snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.handle.queue_len()
    }

    /// Feed one raw control message through ingest.
    pub fn receive(&self, raw: &str) -> std::result::Result<Receipt, IngestError> {
        self.ingest.receive(raw)
    }

    pub fn is_running(&self) -> bool {
        match &self.output {
            Output::Headless(output) => output.is_running(),
            #[cfg(feature = "audio-io")]
            Output::Device(_) => true,
            Output::Manual(_) => false,
        }
    }

    /// Take the renderer to drive it from the caller's own callback.
    /// Only available with [`OutputMode::Manual`](crate::OutputMode::Manual),
    /// and only once.
    pub fn take_renderer(&mut self) -> Result<Renderer> {
        match &mut self.output {
            Output::Manual(renderer) => renderer.take().ok_or(Error::RendererUnavailable),
            _ => Err(Error::RendererUnavailable),
        }
    }

    /// Bind the control listener. Call `run()` on the result to serve.
    pub async fn bind_control(
        &self,
        addr: impl ToSocketAddrs,
        transport: Transport,
    ) -> Result<ControlServer> {
        Ok(ControlServer::bind(addr, self.ingest.clone(), transport).await?)
    }

    /// Bind the telemetry endpoint. Call `run()` on the result to serve.
    pub async fn bind_telemetry(&self, addr: impl ToSocketAddrs) -> Result<TelemetryServer> {
        Ok(TelemetryServer::bind(
            addr,
            self.handle.telemetry().clone(),
            self.handle.stats().clone(),
        )
        .await?)
    }

    /// Stop the output driver, then release the engine.
    pub fn shutdown(self) {
        let Self { output, .. } = self;
        match output {
            Output::Headless(output) => {
                output.stop();
            }
            #[cfg(feature = "audio-io")]
            Output::Device(output) => output.stop(),
            Output::Manual(_) => {}
        }
        tracing::info!("engine shut down");
    }
}
