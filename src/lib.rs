//! # Booga Driver Library
//!
//! A multi-minor pseudo-device driver. Four independent minors share one statistics record
//! protected against concurrent access, and a read-only report renders that record as text.
//!
//! Host registration (device nodes, procfs plumbing, module parameters) is not part of this
//! crate; a host calls into [`driver::DriverFacade`] with already-resolved minor numbers.
//!
//! ## Crate Structure
//!
//! - **`driver`**: `DriverFacade`, the boundary the host dispatches open/read/write/close to,
//!   plus the handle table and raw minor decoding.
//! - **`session`**: `DeviceSession`, one open handle bound to a minor. Reads answer with a
//!   randomly chosen string; writes are counted, except on minor 3 where they terminate the
//!   writer.
//! - **`report`**: `ReportRenderer`, text and JSON views of a statistics snapshot.
//! - **`entropy`** / **`terminate`**: the two collaborators the driver consumes, with
//!   production and test implementations.
//! - **`config`**: Figment-based configuration (TOML file + `BOOGA_` environment).
//! - **`logging`**: tracing subscriber setup.
//! - **`error`**: `AppError`, wrapping driver errors with configuration and I/O failures.
//!
//! Shared state and pure selection logic live in the `booga-core` crate.

pub mod config;
pub mod driver;
pub mod entropy;
pub mod error;
pub mod logging;
pub mod report;
pub mod session;
pub mod terminate;

pub use booga_core::{BoogaError, Caller, DeviceStats, Interrupt, Response, StatsStore};
pub use driver::{DriverFacade, Handle};
pub use error::{AppError, AppResult};
pub use session::{DeviceSession, TERMINATE_MINOR};
