//! Clock-driven render thread for hosts without a multichannel device.

use crate::render::Renderer;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Called with every rendered block (interleaved frames).
pub type BlockObserver = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Drives a [`Renderer`] from a dedicated thread at `block_frames /
/// sample_rate` intervals and discards the output (or hands it to an
/// observer).
pub struct HeadlessOutput {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<Renderer>>,
    block_frames: usize,
    sample_rate: f64,
}

impl HeadlessOutput {
    pub fn start(renderer: Renderer, sample_rate: f64, block_frames: usize) -> Result<Self> {
        Self::start_with_observer(renderer, sample_rate, block_frames, Box::new(|_| {}))
    }

    pub fn start_with_observer(
        mut renderer: Renderer,
        sample_rate: f64,
        block_frames: usize,
        mut observer: BlockObserver,
    ) -> Result<Self> {
        if block_frames == 0 || sample_rate.is_nan() || sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "headless output needs block_frames > 0 and a positive sample rate \
                 (got {block_frames} frames at {sample_rate} Hz)"
            )));
        }

        let period = Duration::from_secs_f64(block_frames as f64 / sample_rate);
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let thread = std::thread::Builder::new()
            .name("vibra-render".into())
            .spawn(move || {
                let mut deadline = Instant::now();
                while flag.load(Ordering::Acquire) {
                    observer(renderer.render(block_frames));

                    deadline += period;
                    let now = Instant::now();
                    if deadline > now {
                        std::thread::sleep(deadline - now);
                    } else {
                        // Fell behind: resync instead of bursting.
                        deadline = now;
                    }
                }
                renderer
            })?;

        tracing::info!(block_frames, sample_rate, "headless output started");

        Ok(Self {
            running,
            thread: Some(thread),
            block_frames,
            sample_rate,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && self.thread.is_some()
    }

    pub fn block_frames(&self) -> usize {
        self.block_frames
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Stop the render thread and take the renderer back.
    pub fn stop(mut self) -> Option<Renderer> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Renderer> {
        self.running.store(false, Ordering::Release);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(renderer) => {
                tracing::info!("headless output stopped");
                Some(renderer)
            }
            Err(_) => {
                tracing::warn!("render thread panicked");
                None
            }
        }
    }
}

impl Drop for HeadlessOutput {
    fn drop(&mut self) {
        self.shutdown();
    }
}
