//! Application-level error type.
//!
//! Driver operations report [`booga_core::BoogaError`]. Everything around them (loading
//! configuration, setting up logging, I/O in the CLI) reports [`AppError`], which wraps the
//! driver error so the `?` operator works across both layers.
//!
//! - **`Config`**: figment could not load or extract the configuration (bad TOML, wrong types).
//! - **`Configuration`**: values parsed but are semantically invalid (e.g. zero devices).
//! - **`Driver`**: an error surfaced unchanged from the driver.
//! - **`Io`**: standard I/O failures.
//! - **`Logging`**: the tracing subscriber could not be installed.

use booga_core::BoogaError;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Primary error type for the booga application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration sources could not be merged or extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration values failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Error reported by the driver.
    #[error("Driver error: {0}")]
    Driver(#[from] BoogaError),

    /// Standard I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialised.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(Box::new(err))
    }
}
