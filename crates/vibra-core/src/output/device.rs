//! CPAL output stream and output device selection.

use crate::render::Renderer;
use crate::stats::EngineStats;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

/// Frames pre-allocated for the conversion buffer (covers common interfaces).
const MAX_FRAMES: usize = 8192;

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The stream is only
/// created, held and dropped by its owning [`AudioOutput`], which is never
/// accessed concurrently.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: see `StreamHandle`; the stream is never touched after creation
// except to be dropped by its single owner.
unsafe impl Send for StreamHandle {}

/// An output device with at least the required number of channels.
pub struct SelectedDevice {
    pub device: cpal::Device,
    pub name: String,
    pub channels: usize,
    pub sample_rate: f64,
    pub sample_format: cpal::SampleFormat,
}

impl std::fmt::Debug for SelectedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedDevice")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("sample_format", &self.sample_format)
            .finish()
    }
}

/// Pick the first output device exposing at least `min_channels` channels.
///
/// A device whose name contains `preferred` wins over scan order. The sample
/// rate is `sample_rate` when the device supports it, else the device's
/// maximum for the chosen channel layout.
pub fn select_output_device(
    min_channels: usize,
    preferred: Option<&str>,
    sample_rate: f64,
) -> Result<SelectedDevice> {
    let host = cpal::default_host();
    let mut candidates = Vec::new();

    for device in host.output_devices()? {
        let name = match device.name() {
            Ok(name) => name,
            Err(err) => {
                tracing::debug!("skipping unnamed output device: {err}");
                continue;
            }
        };
        let best = match device.supported_output_configs() {
            Ok(configs) => {
                let mut ranges: Vec<_> = configs.collect();
                let layouts: Vec<_> = ranges
                    .iter()
                    .map(|range| (range.channels(), range.sample_format()))
                    .collect();
                best_layout(&layouts, min_channels).map(|i| ranges.swap_remove(i))
            }
            Err(err) => {
                tracing::debug!("skipping {name}: {err}");
                continue;
            }
        };
        if let Some(range) = best {
            tracing::debug!(device = %name, channels = range.channels(), "candidate output device");
            candidates.push((device, name, range));
        }
    }

    let index = preferred
        .and_then(|wanted| candidates.iter().position(|(_, name, _)| name.contains(wanted)))
        .unwrap_or(0);

    if index >= candidates.len() {
        return Err(Error::NoSuitableDevice {
            required: min_channels,
        });
    }
    let (device, name, range) = candidates.swap_remove(index);

    let requested = cpal::SampleRate(sample_rate.round() as u32);
    let config = if range.min_sample_rate() <= requested && requested <= range.max_sample_rate() {
        range.with_sample_rate(requested)
    } else {
        tracing::warn!(
            device = %name,
            requested = sample_rate,
            "sample rate not supported, using the device maximum"
        );
        range.with_max_sample_rate()
    };

    tracing::info!(
        device = %name,
        channels = config.channels(),
        sample_rate = config.sample_rate().0,
        "selected output device"
    );

    Ok(SelectedDevice {
        device,
        name,
        channels: config.channels() as usize,
        sample_rate: config.sample_rate().0 as f64,
        sample_format: config.sample_format(),
    })
}

/// Preference among the sample formats [`AudioOutput`] can drive.
fn format_rank(format: cpal::SampleFormat) -> Option<u8> {
    match format {
        cpal::SampleFormat::F32 => Some(3),
        cpal::SampleFormat::I32 => Some(2),
        cpal::SampleFormat::I16 => Some(1),
        cpal::SampleFormat::U16 => Some(0),
        _ => None,
    }
}

/// Index of the best `(channels, format)` layout with at least
/// `min_channels` channels: best sample format first, then widest.
fn best_layout(
    layouts: &[(cpal::ChannelCount, cpal::SampleFormat)],
    min_channels: usize,
) -> Option<usize> {
    layouts
        .iter()
        .enumerate()
        .filter(|(_, (channels, _))| *channels as usize >= min_channels)
        .filter_map(|(i, &(channels, format))| format_rank(format).map(|rank| (i, rank, channels)))
        .max_by_key(|&(i, rank, channels)| (rank, channels, core::cmp::Reverse(i)))
        .map(|(i, _, _)| i)
}

/// List available output devices as `"index: name"`.
pub fn list_output_devices() -> Result<Vec<String>> {
    cpal::default_host()
        .output_devices()?
        .enumerate()
        .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
        .collect()
}

/// A running CPAL output stream that owns the renderer.
///
/// Dropping it stops the callback before the renderer is released.
pub struct AudioOutput {
    device_name: String,
    sample_rate: f64,
    channels: usize,
    _stream: StreamHandle,
}

impl AudioOutput {
    pub fn start(
        selected: SelectedDevice,
        renderer: Renderer,
        stats: Arc<EngineStats>,
    ) -> Result<Self> {
        if renderer.channels() != selected.channels {
            return Err(Error::InvalidConfig(format!(
                "renderer has {} channels, device stream has {}",
                renderer.channels(),
                selected.channels
            )));
        }

        let config = cpal::StreamConfig {
            channels: selected.channels as cpal::ChannelCount,
            sample_rate: cpal::SampleRate(selected.sample_rate as u32),
            buffer_size: cpal::BufferSize::Default,
        };

        let device = &selected.device;
        let stream = match selected.sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(device, &config, renderer, stats)?,
            cpal::SampleFormat::I32 => build_stream::<i32>(device, &config, renderer, stats)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(device, &config, renderer, stats)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(device, &config, renderer, stats)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;
        tracing::info!(device = %selected.name, "audio output started");

        Ok(Self {
            device_name: selected.name,
            sample_rate: selected.sample_rate,
            channels: selected.channels,
            _stream: StreamHandle(stream),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Stop the stream. Equivalent to dropping.
    pub fn stop(self) {
        tracing::info!(device = %self.device_name, "audio output stopped");
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: Renderer,
    stats: Arc<EngineStats>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch = vec![0.0f32; MAX_FRAMES * config.channels as usize];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let block = &mut scratch[..data.len()];
                renderer.render_into(block);
                for (out, &sample) in data.iter_mut().zip(block.iter()) {
                    *out = T::from_sample(sample);
                }
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        move |err| {
            stats.device_errors.incr();
            tracing::warn!("audio stream error: {err}");
        },
        None,
    )?;

    Ok(stream)
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0f32);
    }
}
