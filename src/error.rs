use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmbienceError {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("settings encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("could not decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, AmbienceError>;
