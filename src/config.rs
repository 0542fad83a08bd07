//! Layered configuration using Figment.
//!
//! Configuration is merged from, in increasing priority:
//! 1. Built-in defaults ([`BoogaConfig::default`])
//! 2. A TOML file (default `config/booga.toml`; a missing file is not an error)
//! 3. Environment variables prefixed with `BOOGA_`, using `__` between sections
//!
//! # Example
//! ```no_run
//! use booga::config::BoogaConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // BOOGA_DRIVER__DEVICE_COUNT=2 overrides [driver] device_count
//! let config = BoogaConfig::load()?;
//! config.validate()?;
//! let driver = config.build_driver()?;
//! # Ok(())
//! # }
//! ```

use crate::driver::{DriverFacade, DEFAULT_DEVICE_NAME};
use crate::entropy::{EntropySource, OsEntropy, SeededEntropy};
use crate::error::{AppError, AppResult};
use crate::logging::{LogFormat, LoggingConfig};
use crate::terminate::{DisabledTerminator, SignalTerminator, Terminator};
use booga_core::MAX_DEVICES;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/booga.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoogaConfig {
    /// Device layout
    pub driver: DriverSection,
    /// Statistics lock behaviour
    pub locking: LockingSection,
    /// Randomness for response selection
    pub entropy: EntropySection,
    /// Behaviour of the terminate minor
    pub terminate: TerminateSection,
    /// Log output
    pub logging: LoggingSection,
}

/// `[driver]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSection {
    /// Number of minors exposed, `1..=4`
    pub device_count: usize,
    /// Base name for report labels (`/dev/<name><minor>`)
    pub device_name: String,
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            device_count: MAX_DEVICES,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

/// `[locking]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockingSection {
    /// Interval at which blocked waiters re-check for interruption, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for LockingSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: booga_core::DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

/// `[entropy]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropySection {
    /// Seed for a reproducible generator; OS randomness when absent
    pub seed: Option<u64>,
}

/// What a write to the terminate minor does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminateMode {
    /// Send SIGTERM to the writer
    #[default]
    Signal,
    /// Only log the request
    Disabled,
}

/// `[terminate]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminateSection {
    /// Termination behaviour
    pub mode: TerminateMode,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl BoogaConfig {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path and the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(BoogaConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BOOGA_").split("__"))
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> AppResult<()> {
        if self.driver.device_count == 0 || self.driver.device_count > MAX_DEVICES {
            return Err(AppError::Configuration(format!(
                "Invalid device_count {}. Must be 1-{MAX_DEVICES}",
                self.driver.device_count
            )));
        }

        if self.driver.device_name.is_empty() {
            return Err(AppError::Configuration(
                "device_name must not be empty".into(),
            ));
        }

        if self.locking.poll_interval_ms == 0 {
            return Err(AppError::Configuration(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }

        self.logging_config()?;
        Ok(())
    }

    /// Tracing settings derived from the `[logging]` section.
    pub fn logging_config(&self) -> AppResult<LoggingConfig> {
        Ok(LoggingConfig::new(crate::logging::parse_log_level(&self.logging.level)?)
            .with_format(self.logging.format))
    }

    /// Entropy source selected by `[entropy]`.
    pub fn entropy_source(&self) -> Arc<dyn EntropySource> {
        match self.entropy.seed {
            Some(seed) => Arc::new(SeededEntropy::new(seed)),
            None => Arc::new(OsEntropy),
        }
    }

    /// Termination collaborator selected by `[terminate]`.
    pub fn terminator(&self) -> Arc<dyn Terminator> {
        match self.terminate.mode {
            TerminateMode::Signal => Arc::new(SignalTerminator),
            TerminateMode::Disabled => Arc::new(DisabledTerminator),
        }
    }

    /// Assemble a driver from this configuration.
    pub fn build_driver(&self) -> AppResult<DriverFacade> {
        Ok(DriverFacade::builder()
            .device_count(self.driver.device_count)
            .device_name(self.driver.device_name.clone())
            .poll_interval(Duration::from_millis(self.locking.poll_interval_ms))
            .entropy_arc(self.entropy_source())
            .terminator_arc(self.terminator())
            .build()?)
    }
}
