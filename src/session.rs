//! Open handles on a single booga minor.
//!
//! A [`DeviceSession`] is created by a successful open and is bound to one minor for its
//! whole life. Sessions carry no state beyond that binding and an open/closed flag, so every
//! session on the same minor behaves identically; all shared state lives in the
//! [`StatsStore`].
//!
//! State machine: `Closed -> Open` via [`DeviceSession::open`] (guarded by the minor range),
//! `Open -> Closed` via [`DeviceSession::close`]. Reads and writes are valid only while open.

use crate::entropy::EntropySource;
use crate::terminate::Terminator;
use booga_core::{BoogaError, Caller, Result, StatsStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Minor whose writes terminate the writer instead of being counted.
pub const TERMINATE_MINOR: usize = 3;

/// Everything a session needs from the driver instance it was opened on.
pub struct DeviceResources {
    /// Shared statistics record.
    pub stats: Arc<StatsStore>,
    /// Randomness for response selection.
    pub entropy: Arc<dyn EntropySource>,
    /// Receiver of termination requests from the terminate minor.
    pub terminator: Arc<dyn Terminator>,
    /// Number of valid minors, `1..=MAX_DEVICES`.
    pub device_count: usize,
}

impl std::fmt::Debug for DeviceResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceResources")
            .field("stats", &self.stats)
            .field("device_count", &self.device_count)
            .finish_non_exhaustive()
    }
}

/// One open handle bound to a minor.
#[derive(Debug)]
pub struct DeviceSession {
    minor: usize,
    resources: Arc<DeviceResources>,
    open: AtomicBool,
}

impl DeviceSession {
    /// Open `minor` on behalf of `caller`.
    ///
    /// Fails with [`BoogaError::NoSuchDevice`] if `minor` is outside `[0, device_count)`,
    /// or [`BoogaError::Restart`] if interrupted while waiting for the statistics lock.
    /// Either way no counter changes.
    pub fn open(resources: &Arc<DeviceResources>, minor: u32, caller: &Caller) -> Result<Self> {
        let index = minor as usize;
        if index >= resources.device_count {
            tracing::debug!(minor, device_count = resources.device_count, "open rejected");
            return Err(BoogaError::NoSuchDevice {
                minor,
                device_count: resources.device_count,
            });
        }

        resources
            .stats
            .with_lock(caller.interrupt(), |stats| stats.record_open(index))??;
        tracing::debug!(minor, pid = caller.pid(), "device opened");

        Ok(Self {
            minor: index,
            resources: Arc::clone(resources),
            open: AtomicBool::new(true),
        })
    }

    /// Minor this session is bound to.
    pub fn minor(&self) -> usize {
        self.minor
    }

    /// Whether [`close`](Self::close) has not yet been called.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Fill `buf` completely with the chosen response, repeated and truncated to fit.
    ///
    /// Draws one random byte, then in a single critical section bumps the chosen variant's
    /// counter and adds `buf.len()` to the bytes-read total. Returns the number of bytes
    /// produced, which is always `buf.len()`.
    pub fn read_into(&self, caller: &Caller, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        tracing::debug!(minor = self.minor, len = buf.len(), "booga read invoked");

        let random_byte = self.resources.entropy.next_random_byte();
        let (text, response) = booga_core::choose(random_byte)?;

        self.resources
            .stats
            .with_lock(caller.interrupt(), |stats| {
                stats.record_read(response, buf.len())
            })?;

        fill_repeating(buf, text.as_bytes());
        Ok(buf.len())
    }

    /// Read exactly `len` bytes into a fresh buffer.
    pub fn read(&self, caller: &Caller, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(caller, &mut buf)?;
        Ok(buf)
    }

    /// Accept `data`, discarding its contents.
    ///
    /// On [`TERMINATE_MINOR`] nothing is recorded: the caller is handed to the terminator
    /// and `0` is returned. On any other minor `data.len()` is added to the bytes-written
    /// total and returned.
    pub fn write(&self, caller: &Caller, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        tracing::debug!(minor = self.minor, len = data.len(), "booga write invoked");

        if self.minor == TERMINATE_MINOR {
            tracing::warn!(
                pid = caller.pid(),
                "write to terminate minor, requesting caller termination"
            );
            self.resources.terminator.terminate(caller)?;
            return Ok(0);
        }

        self.resources
            .stats
            .with_lock(caller.interrupt(), |stats| stats.record_write(data.len()))?;
        Ok(data.len())
    }

    /// Release the session. Closing an already closed session does nothing.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            tracing::debug!(minor = self.minor, "device released");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(BoogaError::NotOpen { minor: self.minor })
        }
    }
}

/// Copy `pattern` into `buf` back to back, cutting the last copy short.
fn fill_repeating(buf: &mut [u8], pattern: &[u8]) {
    if pattern.is_empty() {
        return;
    }
    for chunk in buf.chunks_mut(pattern.len()) {
        chunk.copy_from_slice(&pattern[..chunk.len()]);
    }
}
