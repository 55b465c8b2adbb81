use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-flight flag: at most one download run at a time.
///
/// Not a queue. A second caller is refused immediately instead of waiting.
/// Share one guard (via `Arc`) between every orchestrator that must not
/// overlap.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a run as in progress. Returns `false` if one already is.
    pub fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the in-progress mark.
    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Acquire with scoped release: the returned permit clears the flag
    /// when dropped, including during unwinding.
    pub fn try_permit(self: &Arc<Self>) -> Option<RunPermit> {
        if self.try_acquire() {
            Some(RunPermit {
                guard: Arc::clone(self),
            })
        } else {
            None
        }
    }
}

/// Proof of a held [`RunGuard`]. Releases the guard on drop.
#[derive(Debug)]
pub struct RunPermit {
    guard: Arc<RunGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}
