use thiserror::Error;

/// Exchange store application error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tracing_subscriber::util::TryInitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
