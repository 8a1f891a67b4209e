//! Centralized error type for the vibra umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vibra_core::Error),

    #[error("Control: {0}")]
    Control(#[from] vibra_control::Error),

    #[error("Renderer already taken or driven by an output backend")]
    RendererUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
