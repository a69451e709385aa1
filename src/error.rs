//! Error types for console operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("No console attached")]
    NoConsole,

    #[cfg(windows)]
    #[error("Console call failed: {0}")]
    Native(#[from] windows::core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ShimError>;
