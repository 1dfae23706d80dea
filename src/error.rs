use thiserror::Error;

pub use crate::domain::error::{BackendError, ModelError};

/// No candidate backend could be loaded and adopted.
#[derive(Error, Debug)]
pub enum PluginLoadError {
    #[error("no solver backend candidates given")]
    NoCandidates,

    #[error("none of the solver backends [{}] could be loaded: {}", .tried.join(", "), .reasons.join("; "))]
    Exhausted {
        tried: Vec<String>,
        reasons: Vec<String>,
    },
}

/// One malformed line of LP text. Parsing continues after it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    PluginLoad(#[from] PluginLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
