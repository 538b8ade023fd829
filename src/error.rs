use crate::config::ConfigError;
use crate::port::PortError;
use crate::setup::SetupError;
use thiserror::Error;

/// Unified application error type.
///
/// Library layers return their own errors; the binary and the consumers
/// collapse them into this one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("Consumer thread failed: {0}")]
    Consumer(String),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Logging(_) => 2,
            _ => 1,
        }
    }
}

/// A specialized `Result` type for application-level operations.
pub type AppResult<T> = Result<T, AppError>;
