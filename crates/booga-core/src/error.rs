//! Error taxonomy for the booga driver core.
//!
//! `BoogaError` is the single error type surfaced by every driver operation. It is built
//! with `thiserror` and falls into three broad categories:
//!
//! 1. **Caller errors** - `NoSuchDevice`, `NotOpen`, `BadHandle`
//!    - The request itself is invalid (wrong minor, stale handle)
//!    - Recovery: fix the request; other sessions are unaffected
//!
//! 2. **Transient errors** - `Restart`
//!    - The caller was interrupted while waiting for the statistics lock
//!    - Nothing was applied; the caller should retry the same call
//!    - Never retried inside the core
//!
//! 3. **Invariant violations** - `LogicError`, `Terminate`, `InvalidConfig`
//!    - Something the driver assumes cannot happen did happen, or a collaborator failed
//!    - Recovery: abort the operation and report loudly

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, BoogaError>;

/// Primary error type for the booga driver core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoogaError {
    /// The requested minor is outside `[0, device_count)`.
    ///
    /// Fatal to the open call that produced it. No counters change.
    #[error("No such device: minor {minor} (driver exposes {device_count} devices)")]
    NoSuchDevice {
        /// Minor number that was requested.
        minor: u32,
        /// Number of minors the driver exposes.
        device_count: usize,
    },

    /// The caller was interrupted while blocked on the statistics lock.
    ///
    /// **Error Type**: Transient. Raised only before the lock is taken, so no counter
    /// was touched. The caller (or its collaborator) owns the retry policy.
    #[error("Interrupted while waiting for device statistics; restart the call")]
    Restart,

    /// The response selector produced an outcome outside the four known variants.
    #[error("Response selector logic error: {0}")]
    LogicError(String),

    /// The session has already been closed.
    #[error("Device session for minor {minor} is not open")]
    NotOpen {
        /// Minor the session was bound to.
        minor: usize,
    },

    /// The handle does not refer to an open session.
    #[error("Bad device handle {0}")]
    BadHandle(u64),

    /// The termination collaborator could not deliver its signal.
    #[error("Failed to terminate caller: {0}")]
    Terminate(String),

    /// Driver construction parameters are out of range.
    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(String),
}

impl BoogaError {
    /// Whether the failed call may simply be issued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoogaError::Restart)
    }
}
