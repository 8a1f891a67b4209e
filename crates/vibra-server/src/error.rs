use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Engine(#[from] vibra::Error),

    #[error(transparent)]
    Control(#[from] vibra::control::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
