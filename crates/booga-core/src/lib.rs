//! `booga-core`
//!
//! Core state and pure logic for the booga pseudo-device.
//!
//! The driver exposes several minors that share one statistics record. This crate holds the
//! pieces with real invariants and no host dependencies:
//!
//! - [`StatsStore`]: the single mutex-guarded counter record, with interruptible locking
//! - [`Response`] / [`choose`]: maps a random byte to one of four response strings
//! - [`Caller`] / [`Interrupt`]: who an operation runs for and whether they were signalled
//! - [`BoogaError`]: the error taxonomy every operation reports through
//!
//! ## Example
//!
//! ```rust
//! use booga_core::{Interrupt, Response, StatsStore};
//!
//! let store = StatsStore::new();
//! let interrupt = Interrupt::new();
//! store.with_lock(&interrupt, |stats| stats.record_read(Response::Booga, 14))?;
//!
//! let stats = store.snapshot(&interrupt)?;
//! assert_eq!(stats.bytes_read(), 14);
//! # Ok::<(), booga_core::BoogaError>(())
//! ```

pub mod error;
pub mod interrupt;
pub mod response;
pub mod stats;

pub use error::{BoogaError, Result};
pub use interrupt::{Caller, Interrupt};
pub use response::{choose, Response};
pub use stats::{DeviceStats, StatsStore, DEFAULT_POLL_INTERVAL, MAX_DEVICES};
