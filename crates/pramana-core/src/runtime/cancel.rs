// crates/pramana-core/src/runtime/cancel.rs
// ============================================================================
// Module: Pramana Cancellation Token
// Description: One-shot cooperative cancellation signal.
// Purpose: Let hosts interrupt a run without dropping in-flight outcomes.
// Dependencies: tokio::sync
// ============================================================================

//! ## Overview
//! A [`CancelToken`] flips once and never resets. The runner checks it before
//! dispatching each case and uses it to enter the grace-period drain; hosts
//! typically wire it to Ctrl-C or a run deadline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;

// ============================================================================
// SECTION: Cancel Token
// ============================================================================

/// Shared one-shot cancellation flag.
///
/// # Invariants
/// - Once cancelled, `is_cancelled` never returns false again.
/// - Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Shared flag and waiter state.
    inner: Arc<CancelInner>,
}

/// Shared state behind a token.
#[derive(Debug, Default)]
struct CancelInner {
    /// Whether cancellation has been requested.
    flag: AtomicBool,
    /// Wakes tasks parked in [`CancelToken::cancelled`].
    notify: Notify,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes all waiters.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true when cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
