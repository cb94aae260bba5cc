//! Poison-tolerant locking for state shared with the roster actor thread.

use std::sync::{Mutex, MutexGuard};

/// Lock `lock`, taking over the data if a previous holder panicked.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        tracing::warn!(context, "mutex poisoned; recovering");
        poisoned.into_inner()
    })
}
