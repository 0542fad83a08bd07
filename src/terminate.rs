//! Caller termination for the designated "terminate" minor.
//!
//! **Warning:** any write to minor 3 asks the host to terminate the writing process. This
//! is deliberate, observable driver behaviour, and it is surprising. The side effect goes
//! through the [`Terminator`] trait so embedders and tests can swap in
//! [`DisabledTerminator`] or [`RecordingTerminator`] instead of really signalling.

use booga_core::{BoogaError, Caller, Result};
use parking_lot::Mutex;

/// Delivers the termination request for a caller.
pub trait Terminator: Send + Sync {
    /// Ask the host to terminate `caller`.
    fn terminate(&self, caller: &Caller) -> Result<()>;
}

/// Sends `SIGTERM` to the caller's process id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTerminator;

impl Terminator for SignalTerminator {
    #[cfg(unix)]
    fn terminate(&self, caller: &Caller) -> Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(caller.pid())
            .map_err(|_| BoogaError::Terminate(format!("pid {} out of range", caller.pid())))?;
        tracing::warn!(pid = raw, "sending SIGTERM to writer of terminate minor");
        kill(Pid::from_raw(raw), Signal::SIGTERM)
            .map_err(|errno| BoogaError::Terminate(format!("kill({raw}): {errno}")))
    }

    #[cfg(not(unix))]
    fn terminate(&self, caller: &Caller) -> Result<()> {
        Err(BoogaError::Terminate(format!(
            "signals are unsupported on this platform (pid {})",
            caller.pid()
        )))
    }
}

/// Logs the request and leaves the caller running.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTerminator;

impl Terminator for DisabledTerminator {
    fn terminate(&self, caller: &Caller) -> Result<()> {
        tracing::warn!(pid = caller.pid(), "termination suppressed (terminate mode disabled)");
        Ok(())
    }
}

/// Remembers every termination request without acting on it.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    requests: Mutex<Vec<u32>>,
}

impl RecordingTerminator {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of termination requests received so far.
    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Process ids that were asked to terminate, in order.
    pub fn requested_pids(&self) -> Vec<u32> {
        self.requests.lock().clone()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, caller: &Caller) -> Result<()> {
        self.requests.lock().push(caller.pid());
        Ok(())
    }
}
