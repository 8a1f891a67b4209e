//! Drivers that invoke the renderer on a periodic cadence.
//!
//! - [`HeadlessOutput`]: a clock thread, no audio device required
//! - [`AudioOutput`]: a CPAL output stream (feature `audio-io`)

mod headless;
pub use headless::{BlockObserver, HeadlessOutput};

#[cfg(feature = "audio-io")]
mod device;
#[cfg(feature = "audio-io")]
pub use device::{list_output_devices, select_output_device, AudioOutput, SelectedDevice};
