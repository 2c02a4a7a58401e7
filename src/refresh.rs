//! Ordering for overlapping refreshes.
//!
//! Every refetch takes a token from [`RefreshSequencer::begin`]. A completed
//! fetch is applied only if no newer fetch was applied before it, so a slow
//! response can never overwrite fresher data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Monotonic request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshToken(u64);

impl RefreshToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Applied<T> {
    token: Option<RefreshToken>,
    value: Option<T>,
}

/// Holds the newest applied snapshot of type `T`.
#[derive(Debug)]
pub struct RefreshSequencer<T> {
    next: AtomicU64,
    applied: Mutex<Applied<T>>,
}

impl<T> Default for RefreshSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RefreshSequencer<T> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            applied: Mutex::new(Applied {
                token: None,
                value: None,
            }),
        }
    }

    /// Issue a token strictly greater than every token issued before.
    pub fn begin(&self) -> RefreshToken {
        RefreshToken(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Offer the result of the fetch started with `token`.
    ///
    /// Returns `false` (and drops `value`) when a newer fetch already landed.
    pub fn complete(&self, token: RefreshToken, value: T) -> bool {
        let mut applied = self.lock();
        if applied.token.is_some_and(|current| current >= token) {
            tracing::debug!(token = token.0, "discarding stale refresh");
            return false;
        }
        applied.token = Some(token);
        applied.value = Some(value);
        true
    }

    /// Token of the snapshot currently held, if any.
    pub fn applied_token(&self) -> Option<RefreshToken> {
        self.lock().token
    }

    pub fn with_current<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let applied = self.lock();
        f(applied.value.as_ref())
    }

    fn lock(&self) -> MutexGuard<'_, Applied<T>> {
        self.applied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> RefreshSequencer<T> {
    pub fn current(&self) -> Option<T> {
        self.lock().value.clone()
    }
}
