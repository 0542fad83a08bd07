//! Caller context and interruption flag.
//!
//! A blocked lock waiter must give up with [`BoogaError::Restart`](crate::BoogaError::Restart)
//! when its caller receives a signal. [`Interrupt`] models that pending-signal state: any
//! clone may raise it (for example a Ctrl-C handler) and the waiter observes it between
//! lock attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared pending-interruption flag for one caller.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    pending: Arc<AtomicBool>,
}

impl Interrupt {
    /// Create a flag with no interruption pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an interruption as pending. Current and future lock waits fail with `Restart`
    /// until [`clear`](Self::clear) is called.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Acknowledge the interruption.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    /// Whether an interruption is pending.
    pub fn is_raised(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Identity of the process (or thread of control) on whose behalf an operation runs.
#[derive(Debug, Clone)]
pub struct Caller {
    pid: u32,
    interrupt: Interrupt,
}

impl Caller {
    /// Caller with an explicit process id and a fresh interrupt flag.
    pub fn new(pid: u32) -> Self {
        Self::with_interrupt(pid, Interrupt::new())
    }

    /// Caller sharing an existing interrupt flag.
    pub fn with_interrupt(pid: u32, interrupt: Interrupt) -> Self {
        Self { pid, interrupt }
    }

    /// The current process.
    pub fn current() -> Self {
        Self::new(std::process::id())
    }

    /// Process id the termination collaborator targets.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// This caller's interrupt flag.
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}
