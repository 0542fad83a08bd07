//! Driver boundary: routes host calls to device sessions.
//!
//! [`DriverFacade`] is what the host dispatch layer talks to. It validates minors, hands out
//! opaque [`Handle`]s for open sessions, forwards reads and writes to the bound
//! [`DeviceSession`], and produces the statistics report. Errors from sessions are passed
//! through unchanged; in particular `Restart` is never retried here.
//!
//! The handle table has its own small lock. It is only held to look a session up or to
//! insert/remove one, never while the statistics lock is taken, so no call holds two locks.
//!
//! # Example
//!
//! ```rust
//! use booga::driver::DriverFacade;
//! use booga::entropy::ScriptedEntropy;
//! use booga::terminate::RecordingTerminator;
//! use booga_core::Caller;
//!
//! # fn main() -> booga_core::Result<()> {
//! let driver = DriverFacade::builder()
//!     .entropy(ScriptedEntropy::constant(0))
//!     .terminator(RecordingTerminator::new())
//!     .build()?;
//!
//! let caller = Caller::current();
//! let handle = driver.open_device(&caller, 0)?;
//! assert_eq!(driver.read_device(&caller, handle, 6)?, b"booga!".to_vec());
//! driver.close_device(handle);
//!
//! println!("{}", driver.get_report(&caller)?);
//! # Ok(())
//! # }
//! ```

use crate::entropy::{EntropySource, OsEntropy};
use crate::report::ReportRenderer;
use crate::session::{DeviceResources, DeviceSession};
use crate::terminate::{SignalTerminator, Terminator};
use booga_core::{BoogaError, Caller, DeviceStats, Result, StatsStore, MAX_DEVICES};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default device node base name.
pub const DEFAULT_DEVICE_NAME: &str = "booga";

/// Opaque identifier for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Raw handle value.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A raw minor number as seen by the host, split into its two nibbles.
///
/// The low nibble selects the device; the bits above it carry a device "type" the driver
/// does not otherwise interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumber {
    kind: u32,
    num: u32,
}

impl DeviceNumber {
    /// Decode a raw minor.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            kind: raw >> 4,
            num: raw & 0xf,
        }
    }

    /// High bits of the raw minor.
    pub fn kind(self) -> u32 {
        self.kind
    }

    /// Device index, `0..16`.
    pub fn num(self) -> u32 {
        self.num
    }
}

/// Builder for [`DriverFacade`].
pub struct DriverBuilder {
    device_count: usize,
    device_name: String,
    poll_interval: Duration,
    entropy: Arc<dyn EntropySource>,
    terminator: Arc<dyn Terminator>,
}

impl DriverBuilder {
    fn new() -> Self {
        Self {
            device_count: MAX_DEVICES,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            poll_interval: booga_core::DEFAULT_POLL_INTERVAL,
            entropy: Arc::new(OsEntropy),
            terminator: Arc::new(SignalTerminator),
        }
    }

    /// Number of minors to expose, `1..=MAX_DEVICES`.
    pub fn device_count(mut self, device_count: usize) -> Self {
        self.device_count = device_count;
        self
    }

    /// Base name used for report labels.
    pub fn device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    /// How often blocked lock waiters re-check their interrupt flag.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Entropy source for response selection.
    pub fn entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.entropy = Arc::new(entropy);
        self
    }

    /// Shared entropy source for response selection.
    pub fn entropy_arc(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    /// Termination collaborator for the terminate minor.
    pub fn terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.terminator = Arc::new(terminator);
        self
    }

    /// Shared termination collaborator, e.g. to inspect a recorder afterwards.
    pub fn terminator_arc(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Validate parameters and create the driver with a fresh statistics record.
    pub fn build(self) -> Result<DriverFacade> {
        if self.device_count == 0 || self.device_count > MAX_DEVICES {
            return Err(BoogaError::InvalidConfig(format!(
                "device_count {} must be between 1 and {MAX_DEVICES}",
                self.device_count
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(BoogaError::InvalidConfig(
                "lock poll interval must be non-zero".into(),
            ));
        }

        let resources = Arc::new(DeviceResources {
            stats: Arc::new(StatsStore::with_poll_interval(self.poll_interval)),
            entropy: self.entropy,
            terminator: self.terminator,
            device_count: self.device_count,
        });
        tracing::info!(
            device_count = self.device_count,
            device_name = %self.device_name,
            "booga device driver loaded"
        );

        Ok(DriverFacade {
            renderer: ReportRenderer::new(self.device_name, self.device_count),
            resources,
            sessions: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        })
    }
}

/// Host-facing entry point of the booga driver.
pub struct DriverFacade {
    resources: Arc<DeviceResources>,
    renderer: ReportRenderer,
    sessions: Mutex<HashMap<Handle, Arc<DeviceSession>>>,
    next_handle: AtomicU64,
}

impl DriverFacade {
    /// Start configuring a driver. Defaults: four minors, OS entropy, SIGTERM termination.
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Number of minors this driver exposes.
    pub fn device_count(&self) -> usize {
        self.resources.device_count
    }

    /// The shared statistics record.
    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.resources.stats
    }

    /// Renderer configured for this driver's minors.
    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Open `minor` and return a handle for the new session.
    pub fn open_device(&self, caller: &Caller, minor: u32) -> Result<Handle> {
        let session = DeviceSession::open(&self.resources, minor, caller)?;
        let handle = Handle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.sessions.lock().insert(handle, Arc::new(session));
        Ok(handle)
    }

    /// Open the device selected by the low nibble of a raw host minor.
    pub fn open_raw(&self, caller: &Caller, raw_minor: u32) -> Result<Handle> {
        let number = DeviceNumber::from_raw(raw_minor);
        tracing::trace!(raw_minor, kind = number.kind(), num = number.num(), "decoded minor");
        self.open_device(caller, number.num())
    }

    /// Read exactly `len` bytes from the session behind `handle`.
    pub fn read_device(&self, caller: &Caller, handle: Handle, len: usize) -> Result<Vec<u8>> {
        self.session(handle)?.read(caller, len)
    }

    /// Fill `buf` from the session behind `handle`.
    pub fn read_device_into(&self, caller: &Caller, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        self.session(handle)?.read_into(caller, buf)
    }

    /// Write `data` to the session behind `handle`.
    pub fn write_device(&self, caller: &Caller, handle: Handle, data: &[u8]) -> Result<usize> {
        self.session(handle)?.write(caller, data)
    }

    /// Close the session behind `handle`. Unknown or already closed handles are ignored.
    pub fn close_device(&self, handle: Handle) {
        let removed = self.sessions.lock().remove(&handle);
        match removed {
            Some(session) => session.close(),
            None => tracing::debug!(handle = handle.id(), "close of unknown handle ignored"),
        }
    }

    /// Consistent copy of all counters.
    pub fn snapshot(&self, caller: &Caller) -> Result<DeviceStats> {
        self.resources.stats.snapshot(caller.interrupt())
    }

    /// Text report of the current counters.
    pub fn get_report(&self, caller: &Caller) -> Result<String> {
        Ok(self.renderer.render(&self.snapshot(caller)?))
    }

    fn session(&self, handle: Handle) -> Result<Arc<DeviceSession>> {
        self.sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(BoogaError::BadHandle(handle.id()))
    }
}

impl Drop for DriverFacade {
    fn drop(&mut self) {
        tracing::info!("booga device driver unloaded");
    }
}

impl std::fmt::Debug for DriverFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverFacade")
            .field("device_count", &self.resources.device_count)
            .field("open_sessions", &self.sessions.lock().len())
            .finish_non_exhaustive()
    }
}
