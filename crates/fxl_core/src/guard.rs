//! Single-writer reentrancy fence.
//!
//! Wraps structures that get mutated during an otherwise read-only
//! traversal (lazily built caches). Entering twice on the same thread, or
//! while another thread holds the guard, is a usage error reported as a
//! [`CoreError`]. This is a correctness fence, not a lock: nothing waits.

use crate::error::{CoreError, CoreResult};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

fn current_thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

#[derive(Debug)]
pub struct Guard {
    name: &'static str,
    /// Token of the owning thread, 0 when free.
    owner: AtomicU64,
}

impl Guard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            owner: AtomicU64::new(0),
        }
    }

    /// Acquire the guard until the returned scope is dropped.
    pub fn enter(&self) -> CoreResult<GuardScope<'_>> {
        let me = current_thread_token();
        match self
            .owner
            .compare_exchange(0, me, Ordering::Acquire, Ordering::Relaxed)
        {
            Ok(_) => Ok(GuardScope { guard: self }),
            Err(holder) if holder == me => Err(CoreError::Reentrancy(self.name)),
            Err(_) => Err(CoreError::Contention(self.name)),
        }
    }

    pub fn is_held(&self) -> bool {
        self.owner.load(Ordering::Acquire) != 0
    }
}

/// Releases its [`Guard`] on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the scope is dropped"]
pub struct GuardScope<'g> {
    guard: &'g Guard,
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        self.guard.owner.store(0, Ordering::Release);
    }
}
