//! Shared statistics record for all booga minors.
//!
//! One [`StatsStore`] is created by the composition root and shared (via `Arc`) by every
//! session. All fields live behind a single `parking_lot::Mutex`; nothing reads or writes
//! them without holding it.
//!
//! Lock acquisition is interruptible. A waiter alternates between timed lock attempts and
//! checks of its caller's [`Interrupt`] flag; once the flag is raised it gives up with
//! [`BoogaError::Restart`] without having touched the record. A caller that finds the lock
//! free acquires it even if an interruption is pending, so only actual waiting is cut short.

use crate::error::{BoogaError, Result};
use crate::interrupt::Interrupt;
use crate::response::Response;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of minors the statistics record has room for.
pub const MAX_DEVICES: usize = 4;

/// Default granularity at which blocked waiters re-check their interrupt flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The counters themselves. Obtained mutably inside [`StatsStore::with_lock`] or as an
/// immutable copy from [`StatsStore::snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    open_counts: [u64; MAX_DEVICES],
    bytes_read: u64,
    bytes_written: u64,
    responses: [u64; 4],
}

impl DeviceStats {
    /// Successful opens of `minor`. Zero for minors outside the record.
    pub fn open_count(&self, minor: usize) -> u64 {
        self.open_counts.get(minor).copied().unwrap_or(0)
    }

    /// Total bytes handed out by reads.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Total bytes accepted by writes.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Reads that answered with `response`.
    pub fn response_count(&self, response: Response) -> u64 {
        self.responses[response.index()]
    }

    /// Completed reads across all variants.
    pub fn total_reads(&self) -> u64 {
        self.responses.iter().sum()
    }

    /// Count one open of `minor`.
    pub fn record_open(&mut self, minor: usize) -> Result<()> {
        let slot = self
            .open_counts
            .get_mut(minor)
            .ok_or(BoogaError::NoSuchDevice {
                minor: minor as u32,
                device_count: MAX_DEVICES,
            })?;
        *slot += 1;
        Ok(())
    }

    /// Count one completed read of `len` bytes answered with `response`.
    pub fn record_read(&mut self, response: Response, len: usize) {
        self.responses[response.index()] += 1;
        self.bytes_read += len as u64;
    }

    /// Count `len` accepted write bytes.
    pub fn record_write(&mut self, len: usize) {
        self.bytes_written += len as u64;
    }
}

/// Mutex-guarded owner of the shared [`DeviceStats`].
#[derive(Debug)]
pub struct StatsStore {
    record: Mutex<DeviceStats>,
    poll_interval: Duration,
}

impl StatsStore {
    /// Zeroed store using [`DEFAULT_POLL_INTERVAL`].
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Zeroed store whose waiters re-check their interrupt flag every `poll_interval`.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            record: Mutex::new(DeviceStats::default()),
            poll_interval,
        }
    }

    /// Run `f` with exclusive access to the record.
    ///
    /// The guard is released when `f` returns or unwinds. Fails with
    /// [`BoogaError::Restart`] if `interrupt` is raised while waiting; in that case `f`
    /// never runs.
    pub fn with_lock<R>(
        &self,
        interrupt: &Interrupt,
        f: impl FnOnce(&mut DeviceStats) -> R,
    ) -> Result<R> {
        if let Some(mut guard) = self.record.try_lock() {
            return Ok(f(&mut guard));
        }
        loop {
            if interrupt.is_raised() {
                tracing::debug!("stats lock wait interrupted");
                return Err(BoogaError::Restart);
            }
            if let Some(mut guard) = self.record.try_lock_for(self.poll_interval) {
                return Ok(f(&mut guard));
            }
        }
    }

    /// Consistent copy of every counter, taken under the lock.
    pub fn snapshot(&self, interrupt: &Interrupt) -> Result<DeviceStats> {
        self.with_lock(interrupt, |stats| *stats)
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fresh_store_is_zeroed() {
        let store = StatsStore::new();
        let stats = store.snapshot(&Interrupt::new()).unwrap();
        assert_eq!(stats, DeviceStats::default());
        assert_eq!(stats.total_reads(), 0);
    }

    #[test]
    fn test_with_lock_applies_all_effects() {
        let store = StatsStore::new();
        let interrupt = Interrupt::new();
        store
            .with_lock(&interrupt, |stats| {
                stats.record_open(2).unwrap();
                stats.record_read(Response::Neka, 17);
                stats.record_write(5);
            })
            .unwrap();

        let stats = store.snapshot(&interrupt).unwrap();
        assert_eq!(stats.open_count(2), 1);
        assert_eq!(stats.response_count(Response::Neka), 1);
        assert_eq!(stats.bytes_read(), 17);
        assert_eq!(stats.bytes_written(), 5);
    }

    #[test]
    fn test_record_open_out_of_range() {
        let mut stats = DeviceStats::default();
        assert!(matches!(
            stats.record_open(MAX_DEVICES),
            Err(BoogaError::NoSuchDevice { .. })
        ));
        assert_eq!(stats, DeviceStats::default());
    }

    #[test]
    fn test_free_lock_ignores_pending_interrupt() {
        let store = StatsStore::new();
        let interrupt = Interrupt::new();
        interrupt.raise();
        assert!(store.with_lock(&interrupt, |stats| stats.record_write(1)).is_ok());
    }

    #[test]
    fn test_interrupted_waiter_restarts_without_side_effects() {
        let store = Arc::new(StatsStore::with_poll_interval(Duration::from_millis(1)));
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .with_lock(&Interrupt::new(), |_| {
                        locked_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    })
                    .unwrap();
            })
        };
        locked_rx.recv().unwrap();

        let interrupt = Interrupt::new();
        let waiter = {
            let store = Arc::clone(&store);
            let interrupt = interrupt.clone();
            thread::spawn(move || store.with_lock(&interrupt, |stats| stats.record_write(99)))
        };
        thread::sleep(Duration::from_millis(20));
        interrupt.raise();

        assert_eq!(waiter.join().unwrap(), Err(BoogaError::Restart));
        release_tx.send(()).unwrap();
        holder.join().unwrap();

        let stats = store.snapshot(&Interrupt::new()).unwrap();
        assert_eq!(stats.bytes_written(), 0);
    }

    #[test]
    fn test_lock_released_after_panic() {
        let store = Arc::new(StatsStore::new());
        let panicking = Arc::clone(&store);
        let result = thread::spawn(move || {
            panicking.with_lock(&Interrupt::new(), |_| panic!("boom"))
        })
        .join();
        assert!(result.is_err());

        assert!(store
            .with_lock(&Interrupt::new(), |stats| stats.record_write(3))
            .is_ok());
    }
}
