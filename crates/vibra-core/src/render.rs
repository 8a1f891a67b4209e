//! Real-time render callback: phase-continuous multi-segment sine synthesis.

use crate::mapping::ChannelMapper;
use crate::phase::PhaseAccumulator;
use crate::segment::SegmentConsumer;
use crate::stats::EngineStats;
use std::sync::Arc;

/// Render-side state. Owned by whichever thread drives the device.
///
/// Never blocks, never takes a lock shared with ingest, and does not
/// allocate as long as requested blocks fit the pre-allocated buffer.
pub struct Renderer {
    state: RenderState,
    buffer: Vec<f32>,
}

struct RenderState {
    consumer: SegmentConsumer,
    mapper: ChannelMapper,
    phase: PhaseAccumulator,
    stats: Arc<EngineStats>,
}

impl Renderer {
    pub(crate) fn new(
        consumer: SegmentConsumer,
        mapper: ChannelMapper,
        phase: PhaseAccumulator,
        stats: Arc<EngineStats>,
        max_block_frames: usize,
    ) -> Self {
        let buffer = vec![0.0; max_block_frames * mapper.device_channels()];
        Self {
            state: RenderState {
                consumer,
                mapper,
                phase,
                stats,
            },
            buffer,
        }
    }

    /// Render `frame_count` interleaved frames (`frame * channels + channel`)
    /// into the internal buffer and return it.
    ///
    /// The buffer only grows when a block larger than any previous one is
    /// requested.
    pub fn render(&mut self, frame_count: usize) -> &[f32] {
        let needed = frame_count * self.state.mapper.device_channels();
        if self.buffer.len() < needed {
            self.buffer.resize(needed, 0.0);
        }
        self.state.process(&mut self.buffer[..needed]);
        &self.buffer[..needed]
    }

    /// Render straight into a caller-owned interleaved buffer.
    ///
    /// Returns the number of frames that carried segment content; the rest
    /// of the buffer is silence.
    #[inline]
    pub fn render_into(&mut self, output: &mut [f32]) -> usize {
        self.state.process(output)
    }

    pub fn channels(&self) -> usize {
        self.state.mapper.device_channels()
    }

    pub fn mapper(&self) -> &ChannelMapper {
        &self.state.mapper
    }

    pub fn phase(&self) -> f64 {
        self.state.phase.phase()
    }

    pub fn phase_increment(&self) -> f64 {
        self.state.phase.increment()
    }

    /// Queued plus in-flight segments.
    pub fn queue_len(&self) -> usize {
        self.state.consumer.len()
    }
}

impl RenderState {
    #[inline]
    fn process(&mut self, output: &mut [f32]) -> usize {
        let channels = self.mapper.device_channels();
        let frame_count = output.len() / channels;
        output.fill(0.0);

        let mut filled = 0usize;
        while filled < frame_count {
            let Some(head) = self.consumer.head_mut() else {
                break;
            };

            let block = head.remaining_samples.min((frame_count - filled) as u64) as usize;
            let rows = &mut output[filled * channels..(filled + block) * channels];
            for (k, row) in rows.chunks_exact_mut(channels).enumerate() {
                let carrier = self.phase.sample(k as u64);
                for ((_, channel), &amplitude) in self.mapper.iter().zip(head.amplitudes.iter()) {
                    row[channel] = carrier * amplitude;
                }
            }

            head.remaining_samples -= block as u64;
            let finished = head.remaining_samples == 0;
            self.phase.advance(block as u64);
            filled += block;

            if finished {
                self.consumer.pop_head();
                self.stats.segments_completed.incr();
            }
        }

        self.stats.frames_rendered.add(frame_count as u64);
        self.stats.silent_frames.add((frame_count - filled) as u64);
        filled
    }
}
