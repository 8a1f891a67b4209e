//! The engine instance: one owner for queue, mapper, phase, telemetry and counters.

use crate::config::EngineConfig;
use crate::mapping::ChannelMapper;
use crate::phase::PhaseAccumulator;
use crate::render::Renderer;
use crate::segment::{segment_queue, Segment, SegmentProducer};
use crate::stats::EngineStats;
use crate::telemetry::TelemetryWindow;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Synthesis engine, split into an ingest-side [`EngineHandle`] and a
/// render-side [`Renderer`].
///
/// # Example
/// ```ignore
/// let mut engine = Engine::initialize(EngineConfig::default(), 8)?;
/// engine.handle().enqueue(Segment::new(441, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))?;
/// let block = engine.render(512);
/// ```
pub struct Engine {
    handle: EngineHandle,
    renderer: Renderer,
}

impl Engine {
    /// Validate `config` against the device's channel count and build the
    /// engine. Any error here is a fatal configuration error.
    pub fn initialize(config: EngineConfig, device_channel_count: usize) -> Result<Self> {
        config.validate()?;
        let mapper = ChannelMapper::build(
            &config.mapping_table(),
            config.actuator_count,
            device_channel_count,
        )?;

        let (producer, consumer) = segment_queue(config.queue_capacity);
        let stats = Arc::new(EngineStats::new());
        let telemetry = Arc::new(TelemetryWindow::with_max_records(
            config.window_size_ms,
            config.max_telemetry_records,
        ));
        let phase = PhaseAccumulator::new(config.carrier_frequency, config.sample_rate);

        let renderer = Renderer::new(
            consumer,
            mapper,
            phase,
            stats.clone(),
            config.max_block_frames,
        );

        tracing::info!(
            actuators = config.actuator_count,
            device_channels = device_channel_count,
            sample_rate = config.sample_rate,
            carrier_hz = config.carrier_frequency,
            "engine initialized"
        );

        let handle = EngineHandle {
            producer: Arc::new(Mutex::new(producer)),
            telemetry,
            stats,
            config: Arc::new(config),
        };

        Ok(Self { handle, renderer })
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Shorthand for `renderer_mut().render(frame_count)`.
    pub fn render(&mut self, frame_count: usize) -> &[f32] {
        self.renderer.render(frame_count)
    }

    /// Hand the render half to the device layer.
    pub fn into_parts(self) -> (EngineHandle, Renderer) {
        (self.handle, self.renderer)
    }
}

/// Ingest-side view of the engine. Cheap to clone, one per control
/// connection.
///
/// The producer mutex is only contended between ingest tasks; the renderer
/// never touches it.
#[derive(Clone)]
pub struct EngineHandle {
    producer: Arc<Mutex<SegmentProducer>>,
    telemetry: Arc<TelemetryWindow>,
    stats: Arc<EngineStats>,
    config: Arc<EngineConfig>,
}

impl EngineHandle {
    /// Append a segment at the queue tail. On overflow the segment is
    /// returned and counted in [`EngineStats::overflowed`].
    pub fn enqueue(&self, segment: Segment) -> core::result::Result<(), Segment> {
        let result = self.producer.lock().push(segment);
        if result.is_err() {
            self.stats.overflowed.incr();
        }
        result
    }

    pub fn telemetry(&self) -> &Arc<TelemetryWindow> {
        &self.telemetry
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn actuator_count(&self) -> usize {
        self.config.actuator_count
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn queue_len(&self) -> usize {
        self.producer.lock().len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_initialize_rejects_mapping_mismatch() {
        let config = EngineConfig {
            mapping: Some(vec![0, 1, 2]),
            ..Default::default()
        };
        assert!(matches!(
            Engine::initialize(config, 8),
            Err(Error::MappingCardinality { .. })
        ));
    }

    #[test]
    fn test_initialize_rejects_narrow_device() {
        let config = EngineConfig::default();
        assert!(matches!(
            Engine::initialize(config, 4),
            Err(Error::ChannelOutOfRange { .. })
        ));
    }

    #[test]
    fn test_overflow_is_counted() {
        let config = EngineConfig {
            actuator_count: 1,
            queue_capacity: 2,
            ..Default::default()
        };
        let engine = Engine::initialize(config, 1).unwrap();
        let handle = engine.handle().clone();

        assert!(handle.enqueue(Segment::new(10, &[1.0])).is_ok());
        assert!(handle.enqueue(Segment::new(10, &[1.0])).is_ok());
        assert!(handle.enqueue(Segment::new(10, &[1.0])).is_err());

        assert_eq!(handle.queue_len(), 2);
        assert_eq!(handle.stats().snapshot().overflowed, 1);
    }

    #[test]
    fn test_parts_share_state() {
        let config = EngineConfig {
            actuator_count: 2,
            sample_rate: 2000.0,
            carrier_frequency: 200.0,
            ..Default::default()
        };
        let (handle, mut renderer) = Engine::initialize(config, 2).unwrap().into_parts();

        handle.enqueue(Segment::new(4, &[1.0, 1.0])).unwrap();
        assert_eq!(renderer.queue_len(), 1);
        renderer.render(8);
        assert_eq!(handle.queue_len(), 0);

        let stats = handle.stats().snapshot();
        assert_eq!(stats.segments_completed, 1);
        assert_eq!(stats.frames_rendered, 8);
        assert_eq!(stats.silent_frames, 4);
    }
}
